// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Error types for circulation operations.
//!
//! Every failure names the violated rule as its own variant; callers that
//! only care about the broad category use [`LendingError::kind`]. Duplicate
//! keys are decided by the store's entry API, never by inspecting message
//! strings.

use thiserror::Error;

/// Broad failure categories for calling surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input; caller-correctable, never retried automatically.
    Validation,
    /// Unique-key collision on a caller-assigned identifier.
    Conflict,
    /// Business-rule rejection, not a system fault.
    Constraint,
    /// Unknown identifier.
    NotFound,
    /// Store failure. Operations roll back cleanly, so a retry is always
    /// safe. Reserved for fallible backing stores; the in-process store
    /// never produces it.
    Storage,
}

/// Circulation processing errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LendingError {
    /// A required field is missing from the request
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// Due date precedes the borrow date
    #[error("due date must be on or after borrow date")]
    DueBeforeBorrow,

    /// Available copies would exceed total copies
    #[error("available copies must not exceed total copies")]
    CopiesExceedTotal,

    /// Borrow ID already exists
    #[error("duplicate borrow ID")]
    DuplicateBorrowId,

    /// Book ID already exists
    #[error("duplicate book ID")]
    DuplicateBookId,

    /// ISBN already registered under another book
    #[error("duplicate ISBN")]
    DuplicateIsbn,

    /// Member ID already exists
    #[error("duplicate member ID")]
    DuplicateMemberId,

    /// Staff ID already exists
    #[error("duplicate staff ID")]
    DuplicateStaffId,

    /// Email already registered
    #[error("duplicate email")]
    DuplicateEmail,

    /// Every copy of the book is out on loan
    #[error("no available copies")]
    NoAvailableCopies,

    /// Only records in the Returned state may be deleted
    #[error("only returned borrowings can be deleted")]
    NotReturned,

    /// Book is referenced by borrowing records
    #[error("book is linked to borrowing records")]
    BookInUse,

    /// Member is referenced by borrowing records
    #[error("member is linked to borrowing records")]
    MemberInUse,

    /// Staff member is referenced by borrowing records
    #[error("staff member is linked to borrowing records")]
    StaffInUse,

    /// Referenced book does not exist
    #[error("book not found")]
    BookNotFound,

    /// Referenced member does not exist
    #[error("member not found")]
    MemberNotFound,

    /// Referenced staff member does not exist
    #[error("staff member not found")]
    StaffNotFound,

    /// Referenced borrowing record does not exist
    #[error("borrowing record not found")]
    BorrowingNotFound,
}

impl LendingError {
    /// Maps the specific failure to its broad category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingField(_) | Self::DueBeforeBorrow | Self::CopiesExceedTotal => {
                ErrorKind::Validation
            }
            Self::DuplicateBorrowId
            | Self::DuplicateBookId
            | Self::DuplicateIsbn
            | Self::DuplicateMemberId
            | Self::DuplicateStaffId
            | Self::DuplicateEmail => ErrorKind::Conflict,
            Self::NoAvailableCopies | Self::NotReturned | Self::BookInUse | Self::MemberInUse
            | Self::StaffInUse => ErrorKind::Constraint,
            Self::BookNotFound | Self::MemberNotFound | Self::StaffNotFound
            | Self::BorrowingNotFound => ErrorKind::NotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, LendingError};

    #[test]
    fn error_display_messages() {
        assert_eq!(
            LendingError::MissingField("DueDate").to_string(),
            "missing field: DueDate"
        );
        assert_eq!(
            LendingError::DueBeforeBorrow.to_string(),
            "due date must be on or after borrow date"
        );
        assert_eq!(
            LendingError::NoAvailableCopies.to_string(),
            "no available copies"
        );
        assert_eq!(LendingError::DuplicateBorrowId.to_string(), "duplicate borrow ID");
        assert_eq!(
            LendingError::NotReturned.to_string(),
            "only returned borrowings can be deleted"
        );
        assert_eq!(
            LendingError::BookInUse.to_string(),
            "book is linked to borrowing records"
        );
        assert_eq!(LendingError::BorrowingNotFound.to_string(), "borrowing record not found");
    }

    #[test]
    fn kinds_cover_the_taxonomy() {
        assert_eq!(LendingError::DueBeforeBorrow.kind(), ErrorKind::Validation);
        assert_eq!(LendingError::MissingField("BID").kind(), ErrorKind::Validation);
        assert_eq!(LendingError::DuplicateBorrowId.kind(), ErrorKind::Conflict);
        assert_eq!(LendingError::DuplicateIsbn.kind(), ErrorKind::Conflict);
        assert_eq!(LendingError::NoAvailableCopies.kind(), ErrorKind::Constraint);
        assert_eq!(LendingError::NotReturned.kind(), ErrorKind::Constraint);
        assert_eq!(LendingError::MemberInUse.kind(), ErrorKind::Constraint);
        assert_eq!(LendingError::BookNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(LendingError::BorrowingNotFound.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn errors_are_cloneable() {
        let error = LendingError::NoAvailableCopies;
        let cloned = error.clone();
        assert_eq!(error, cloned);
    }
}

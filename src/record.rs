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

//! Borrowing records and their state machine.
//!
//! A record is immutable after creation except for the closing fields
//! (`return_date`, `status`, `fine_amount`), set exactly once:
//!
//  Borrowed ──return on time──► Returned  (terminal)
//  Borrowed ──return late─────► Overdue   (terminal)

use crate::base::{BookId, BorrowId, MemberId, StaffId};
use crate::fine::compute_fine;
use crate::LendingError;
use chrono::NaiveDate;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde::Deserialize;

/// Lifecycle status of a borrowing record.
///
/// `Overdue` here means "was returned late" and is terminal. An open
/// record past its due date keeps `Borrowed` and is classified as overdue
/// only by date comparison at listing time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, Deserialize)]
pub enum BorrowStatus {
    Borrowed,
    Returned,
    Overdue,
}

impl BorrowStatus {
    /// Both post-return statuses are terminal; no further transition,
    /// including re-return.
    pub fn is_closed(self) -> bool {
        !matches!(self, Self::Borrowed)
    }
}

/// Validated command for creating a borrowing.
///
/// All referenced rows are checked against the store inside the create
/// operation; this struct only carries the caller's input and its
/// field-level validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorrowRequest {
    pub borrow_id: BorrowId,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
    pub member_id: MemberId,
    pub staff_id: StaffId,
    pub book_id: BookId,
}

impl BorrowRequest {
    /// Field-level validation, run before any row is touched.
    ///
    /// # Errors
    ///
    /// Returns [`LendingError::DueBeforeBorrow`] if the due date precedes
    /// the borrow date.
    pub fn validate(&self) -> Result<(), LendingError> {
        if self.due_date < self.borrow_date {
            return Err(LendingError::DueBeforeBorrow);
        }
        Ok(())
    }
}

/// Closing fields, written exactly once by the return operation.
#[derive(Debug, Clone)]
struct RecordState {
    return_date: Option<NaiveDate>,
    status: BorrowStatus,
    fine_amount: Decimal,
}

/// One borrowing of one book copy by one member, handled by one staff
/// member.
///
/// Key fields are immutable and readable without locking; the closing
/// fields sit behind a mutex so that two concurrent returns serialize and
/// the second observes the already-closed state.
#[derive(Debug)]
pub struct BorrowRecord {
    borrow_id: BorrowId,
    borrow_date: NaiveDate,
    due_date: NaiveDate,
    member_id: MemberId,
    staff_id: StaffId,
    book_id: BookId,
    state: Mutex<RecordState>,
}

impl BorrowRecord {
    pub(crate) fn new(request: &BorrowRequest) -> Self {
        Self {
            borrow_id: request.borrow_id,
            borrow_date: request.borrow_date,
            due_date: request.due_date,
            member_id: request.member_id,
            staff_id: request.staff_id,
            book_id: request.book_id,
            state: Mutex::new(RecordState {
                return_date: None,
                status: BorrowStatus::Borrowed,
                fine_amount: Decimal::ZERO,
            }),
        }
    }

    pub fn borrow_id(&self) -> BorrowId {
        self.borrow_id
    }

    pub fn book_id(&self) -> BookId {
        self.book_id
    }

    pub fn member_id(&self) -> MemberId {
        self.member_id
    }

    pub fn staff_id(&self) -> StaffId {
        self.staff_id
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    pub fn status(&self) -> BorrowStatus {
        self.state.lock().status
    }

    pub fn fine_amount(&self) -> Decimal {
        self.state.lock().fine_amount
    }

    /// Closes the record, charging the fine and releasing the copy.
    ///
    /// `release` puts the copy back on its book's shelf and runs before
    /// any field is written, so a failed release leaves the record
    /// untouched. Calling `close` on an already-closed record is a no-op
    /// acknowledged through [`ReturnOutcome::AlreadyClosed`].
    pub(crate) fn close(
        &self,
        today: NaiveDate,
        daily_rate: Decimal,
        release: impl FnOnce() -> Result<(), LendingError>,
    ) -> Result<ReturnOutcome, LendingError> {
        let mut state = self.state.lock();
        if state.status.is_closed() {
            return Ok(ReturnOutcome::AlreadyClosed(self.snapshot_from(&state)));
        }

        release()?;

        let (late_days, fine) = compute_fine(self.due_date, today, daily_rate);
        state.return_date = Some(today);
        state.fine_amount = fine;
        state.status = if late_days > 0 {
            BorrowStatus::Overdue
        } else {
            BorrowStatus::Returned
        };
        Ok(ReturnOutcome::Closed(self.snapshot_from(&state)))
    }

    /// Overdue filter used by listings: open past the due date, or closed
    /// with the returned-late status.
    pub(crate) fn is_overdue_as_of(&self, today: NaiveDate) -> bool {
        let state = self.state.lock();
        (state.return_date.is_none() && self.due_date < today)
            || state.status == BorrowStatus::Overdue
    }

    /// Point-in-time copy of the full record.
    pub fn snapshot(&self) -> BorrowingSnapshot {
        let state = self.state.lock();
        self.snapshot_from(&state)
    }

    fn snapshot_from(&self, state: &RecordState) -> BorrowingSnapshot {
        BorrowingSnapshot {
            borrow_id: self.borrow_id,
            book_id: self.book_id,
            member_id: self.member_id,
            staff_id: self.staff_id,
            borrow_date: self.borrow_date,
            due_date: self.due_date,
            return_date: state.return_date,
            status: state.status,
            fine_amount: state.fine_amount,
        }
    }
}

/// Result of a return operation.
///
/// Returning an already-closed record is acknowledged, not rejected;
/// callers that care can tell the two apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnOutcome {
    /// The record was open and has now been closed.
    Closed(BorrowingSnapshot),
    /// The record was already closed; no state changed.
    AlreadyClosed(BorrowingSnapshot),
}

impl ReturnOutcome {
    pub fn snapshot(&self) -> &BorrowingSnapshot {
        match self {
            Self::Closed(snapshot) | Self::AlreadyClosed(snapshot) => snapshot,
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, Self::AlreadyClosed(_))
    }
}

/// Detached view of a borrowing record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorrowingSnapshot {
    pub borrow_id: BorrowId,
    pub book_id: BookId,
    pub member_id: MemberId,
    pub staff_id: StaffId,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub status: BorrowStatus,
    pub fine_amount: Decimal,
}

impl BorrowingSnapshot {
    const FINE_PRECISION: u32 = 2;
}

impl Serialize for BorrowingSnapshot {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("BorrowingSnapshot", 9)?;
        state.serialize_field("borrow", &self.borrow_id)?;
        state.serialize_field("book", &self.book_id)?;
        state.serialize_field("member", &self.member_id)?;
        state.serialize_field("staff", &self.staff_id)?;
        state.serialize_field("borrowed", &self.borrow_date)?;
        state.serialize_field("due", &self.due_date)?;
        state.serialize_field("returned", &self.return_date)?;
        state.serialize_field("status", &self.status)?;
        state.serialize_field(
            "fine",
            &self.fine_amount.round_dp(BorrowingSnapshot::FINE_PRECISION),
        )?;
        state.end()
    }
}

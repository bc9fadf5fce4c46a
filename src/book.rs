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

//! Book rows and the copy-count ledger.
//!
//! Each book owns its available-copy count behind a mutex; `reserve` and
//! `release` are the only mutations and are paired 1:1 with borrowing
//! creates and returns.
//!
//! # Example
//!
//! ```
//! use circulation_rs::{Book, BookId};
//!
//! let book = Book::new(BookId(101), "Dune", "978-0441172719", 3, 1).unwrap();
//! assert_eq!(book.total_copies(), 3);
//! assert_eq!(book.available_copies(), 1);
//! ```

use crate::LendingError;
use crate::base::BookId;
use parking_lot::Mutex;

/// Catalog row for one book title.
///
/// Identifier, title, and ISBN are fixed at registration; descriptive
/// attributes are inert with respect to the borrowing core. Only the
/// available-copy count changes after creation, and only through
/// [`reserve`](Book::reserve) and [`release`](Book::release).
#[derive(Debug)]
pub struct Book {
    book_id: BookId,
    title: String,
    isbn: String,
    total_copies: u32,
    available: Mutex<u32>,
}

impl Book {
    /// Registers a book with `total_copies` owned and `available_copies`
    /// currently on the shelf.
    ///
    /// A book may be seeded with fewer available than total copies (a title
    /// that is already partially lent out when entered into the catalog).
    ///
    /// # Errors
    ///
    /// Returns [`LendingError::CopiesExceedTotal`] if
    /// `available_copies > total_copies`.
    pub fn new(
        book_id: BookId,
        title: impl Into<String>,
        isbn: impl Into<String>,
        total_copies: u32,
        available_copies: u32,
    ) -> Result<Self, LendingError> {
        if available_copies > total_copies {
            return Err(LendingError::CopiesExceedTotal);
        }
        Ok(Self {
            book_id,
            title: title.into(),
            isbn: isbn.into(),
            total_copies,
            available: Mutex::new(available_copies),
        })
    }

    pub fn book_id(&self) -> BookId {
        self.book_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn isbn(&self) -> &str {
        &self.isbn
    }

    pub fn total_copies(&self) -> u32 {
        self.total_copies
    }

    pub fn available_copies(&self) -> u32 {
        *self.available.lock()
    }

    /// Takes one copy off the shelf for a new borrowing.
    ///
    /// Serialized per book by the row mutex: two concurrent reserves for
    /// the last copy cannot both succeed.
    ///
    /// # Errors
    ///
    /// Returns [`LendingError::NoAvailableCopies`] when every copy is out.
    pub(crate) fn reserve(&self) -> Result<(), LendingError> {
        let mut available = self.available.lock();
        if *available == 0 {
            return Err(LendingError::NoAvailableCopies);
        }
        *available -= 1;
        self.assert_invariants(*available);
        Ok(())
    }

    /// Puts one copy back on the shelf after a return.
    ///
    /// The registry issues at most one `release` per prior successful
    /// `reserve`, so the count never exceeds `total_copies` in correct
    /// operation.
    pub(crate) fn release(&self) -> Result<(), LendingError> {
        let mut available = self.available.lock();
        debug_assert!(
            *available < self.total_copies,
            "release without a matching reserve on book {}",
            self.book_id
        );
        *available += 1;
        self.assert_invariants(*available);
        Ok(())
    }

    /// Point-in-time copy of the row, detached from the shelf mutex.
    pub fn snapshot(&self) -> BookSnapshot {
        BookSnapshot {
            book_id: self.book_id,
            title: self.title.clone(),
            isbn: self.isbn.clone(),
            total_copies: self.total_copies,
            available_copies: self.available_copies(),
        }
    }

    fn assert_invariants(&self, available: u32) {
        debug_assert!(
            available <= self.total_copies,
            "Invariant violated: book {} has {} available of {} total",
            self.book_id,
            available,
            self.total_copies
        );
    }
}

/// Detached view of a catalog row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookSnapshot {
    pub book_id: BookId,
    pub title: String,
    pub isbn: String,
    pub total_copies: u32,
    pub available_copies: u32,
}

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

//! Borrowing registry.
//!
//! The [`Registry`] is the central component that runs the borrowing state
//! machine against the entity store: creating borrowings (reserving a
//! copy), returning them (releasing the copy and charging the fine), and
//! deleting them once closed. It also hosts the Referential Guard used by
//! book/member/staff deletion flows.
//!
//! # Operations
//!
//! - **Create**: validate the request, then atomically claim the borrow id
//!   and reserve one copy of the book.
//! - **Return**: close the record exactly once; a second return of the
//!   same record is acknowledged as a no-op.
//! - **Delete**: remove a record that is in the `Returned` state, without
//!   touching inventory (it was reconciled at return time).
//!
//! # Thread Safety
//!
//! Rows live in [`dashmap::DashMap`]s and each mutable row guards its
//! state with a mutex, so operations on different books and records run in
//! parallel while reserve/release on one book and returns of one record
//! serialize.

use crate::base::{BookId, BorrowId, MemberId, StaffId};
use crate::book::{Book, BookSnapshot};
use crate::fine::DAILY_FINE_RATE;
use crate::record::{BorrowRequest, BorrowStatus, BorrowingSnapshot, ReturnOutcome};
use crate::roster::{Member, Staff};
use crate::store::Store;
use crate::LendingError;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Borrowing registry over an owned entity store.
///
/// # Invariants
///
/// - For every book, `0 <= available_copies <= total_copies` at all times.
/// - The available count changes only through a successful create (-1) or
///   the first successful return (+1) of a borrowing referencing the book.
/// - Closed records are terminal; `return` is idempotent and `delete`
///   accepts only the `Returned` state.
/// - No book, member, or staff row is deleted while a borrowing record
///   references it.
pub struct Registry {
    store: Store,
    daily_rate: Decimal,
}

impl Registry {
    /// Creates an empty registry with the default fine rate of 2.00 per
    /// late day.
    pub fn new() -> Self {
        Self::with_daily_rate(DAILY_FINE_RATE)
    }

    /// Creates an empty registry charging `daily_rate` per late day.
    pub fn with_daily_rate(daily_rate: Decimal) -> Self {
        Registry {
            store: Store::new(),
            daily_rate,
        }
    }

    // === Catalog and roster registration ===

    /// Adds a book to the catalog.
    ///
    /// # Errors
    ///
    /// - [`LendingError::DuplicateBookId`] - Book id already registered.
    /// - [`LendingError::DuplicateIsbn`] - ISBN already registered.
    pub fn add_book(&self, book: Book) -> Result<(), LendingError> {
        self.store.insert_book(book)
    }

    /// Adds a member to the roster.
    ///
    /// # Errors
    ///
    /// - [`LendingError::DuplicateMemberId`] - Member id already registered.
    /// - [`LendingError::DuplicateEmail`] - Email already registered.
    pub fn add_member(&self, member: Member) -> Result<(), LendingError> {
        self.store.insert_member(member)
    }

    /// Adds a staff member to the roster.
    ///
    /// # Errors
    ///
    /// - [`LendingError::DuplicateStaffId`] - Staff id already registered.
    /// - [`LendingError::DuplicateEmail`] - Email already registered.
    pub fn add_staff(&self, staff: Staff) -> Result<(), LendingError> {
        self.store.insert_staff(staff)
    }

    // === Borrowing lifecycle ===

    /// Creates a borrowing record and reserves one copy of the book.
    ///
    /// All-or-nothing: validation and referential checks run first, the
    /// borrow id is claimed before the copy is reserved, and the record
    /// insert cannot fail after the reservation. No partial state is ever
    /// observable.
    ///
    /// # Errors
    ///
    /// - [`LendingError::DueBeforeBorrow`] - Invalid request dates.
    /// - [`LendingError::MemberNotFound`] / [`LendingError::StaffNotFound`] /
    ///   [`LendingError::BookNotFound`] - Unknown referenced row.
    /// - [`LendingError::NoAvailableCopies`] - Every copy is out on loan.
    /// - [`LendingError::DuplicateBorrowId`] - Borrow id already used.
    pub fn create_borrowing(
        &self,
        request: BorrowRequest,
    ) -> Result<BorrowingSnapshot, LendingError> {
        request.validate()?;

        // The row handles stay alive until the record has landed; a
        // concurrent removal of any referenced row waits on its shard and
        // then sees the new record in its reference count.
        let _member = self
            .store
            .member(&request.member_id)
            .ok_or(LendingError::MemberNotFound)?;
        let _staff = self
            .store
            .staff_member(&request.staff_id)
            .ok_or(LendingError::StaffNotFound)?;
        let book = self
            .store
            .book(&request.book_id)
            .ok_or(LendingError::BookNotFound)?;

        let record = self.store.create_record(&request, || book.reserve())?;
        Ok(record.snapshot())
    }

    /// Returns a borrowing, charging the overdue fine and releasing the
    /// copy.
    ///
    /// `today` is the effective return date used for the lateness
    /// computation. Returning an already-closed record changes nothing and
    /// yields [`ReturnOutcome::AlreadyClosed`].
    ///
    /// # Errors
    ///
    /// Returns [`LendingError::BorrowingNotFound`] for an unknown borrow
    /// id.
    pub fn return_borrowing(
        &self,
        borrow_id: BorrowId,
        today: NaiveDate,
    ) -> Result<ReturnOutcome, LendingError> {
        let record = self
            .store
            .record(&borrow_id)
            .ok_or(LendingError::BorrowingNotFound)?;
        let book = self
            .store
            .book(&record.book_id())
            .ok_or(LendingError::BookNotFound)?;
        record.close(today, self.daily_rate, || book.release())
    }

    /// Deletes a closed borrowing record.
    ///
    /// Only the `Returned` state qualifies; a record closed late keeps the
    /// `Overdue` status and stays on file. Deletion does not touch
    /// inventory.
    ///
    /// # Errors
    ///
    /// - [`LendingError::BorrowingNotFound`] - Unknown borrow id.
    /// - [`LendingError::NotReturned`] - Record is open or was returned
    ///   late.
    pub fn delete_borrowing(
        &self,
        borrow_id: BorrowId,
    ) -> Result<BorrowingSnapshot, LendingError> {
        let record = self
            .store
            .record(&borrow_id)
            .ok_or(LendingError::BorrowingNotFound)?;
        if record.status() != BorrowStatus::Returned {
            return Err(LendingError::NotReturned);
        }
        // The status is re-checked under the map entry; a concurrent
        // delete makes the record vanish between the two reads.
        self.store
            .remove_returned_record(&borrow_id)
            .map(|record| record.snapshot())
            .ok_or(LendingError::BorrowingNotFound)
    }

    // === Referential Guard ===

    /// Whether the book can be deleted, i.e. no borrowing references it.
    ///
    /// # Errors
    ///
    /// Returns [`LendingError::BookNotFound`] for an unknown book id.
    pub fn can_delete_book(&self, book_id: &BookId) -> Result<bool, LendingError> {
        if !self.store.contains_book(book_id) {
            return Err(LendingError::BookNotFound);
        }
        Ok(self.store.count_for_book(book_id) == 0)
    }

    /// Whether the member can be deleted, i.e. no borrowing references
    /// them.
    ///
    /// # Errors
    ///
    /// Returns [`LendingError::MemberNotFound`] for an unknown member id.
    pub fn can_delete_member(&self, member_id: &MemberId) -> Result<bool, LendingError> {
        if !self.store.contains_member(member_id) {
            return Err(LendingError::MemberNotFound);
        }
        Ok(self.store.count_for_member(member_id) == 0)
    }

    /// Whether the staff member can be deleted, i.e. no borrowing
    /// references them.
    ///
    /// # Errors
    ///
    /// Returns [`LendingError::StaffNotFound`] for an unknown staff id.
    pub fn can_delete_staff(&self, staff_id: &StaffId) -> Result<bool, LendingError> {
        if !self.store.contains_staff(staff_id) {
            return Err(LendingError::StaffNotFound);
        }
        Ok(self.store.count_for_staff(staff_id) == 0)
    }

    /// Deletes a book.
    ///
    /// The reference count is taken under the book's own row entry, so
    /// the removal serializes against in-flight creates: either the
    /// create lands first and the removal fails, or the removal wins and
    /// the create reports the book as unknown.
    ///
    /// # Errors
    ///
    /// - [`LendingError::BookNotFound`] - Unknown book id.
    /// - [`LendingError::BookInUse`] - Borrowing records still reference
    ///   the book.
    pub fn remove_book(&self, book_id: &BookId) -> Result<(), LendingError> {
        self.store.remove_book(book_id)
    }

    /// Deletes a member. Serializes against in-flight creates the same
    /// way as [`remove_book`](Registry::remove_book).
    ///
    /// # Errors
    ///
    /// - [`LendingError::MemberNotFound`] - Unknown member id.
    /// - [`LendingError::MemberInUse`] - Borrowing records still reference
    ///   the member.
    pub fn remove_member(&self, member_id: &MemberId) -> Result<(), LendingError> {
        self.store.remove_member(member_id)
    }

    /// Deletes a staff member. Serializes against in-flight creates the
    /// same way as [`remove_book`](Registry::remove_book).
    ///
    /// # Errors
    ///
    /// - [`LendingError::StaffNotFound`] - Unknown staff id.
    /// - [`LendingError::StaffInUse`] - Borrowing records still reference
    ///   the staff member.
    pub fn remove_staff(&self, staff_id: &StaffId) -> Result<(), LendingError> {
        self.store.remove_staff(staff_id)
    }

    // === Queries ===

    /// Detached snapshot of one book row.
    ///
    /// Holds no lock after returning; the view stays valid across later
    /// mutations or removal of the row.
    pub fn get_book(&self, book_id: &BookId) -> Option<BookSnapshot> {
        self.store.book(book_id).map(|book| book.snapshot())
    }

    /// Snapshot of one borrowing record.
    pub fn get_borrowing(&self, borrow_id: &BorrowId) -> Option<BorrowingSnapshot> {
        self.store.record(borrow_id).map(|record| record.snapshot())
    }

    /// Snapshots of all borrowing records, newest borrow id first.
    pub fn borrowings(&self) -> Vec<BorrowingSnapshot> {
        let mut snapshots: Vec<_> = self.store.records().map(|r| r.snapshot()).collect();
        snapshots.sort_by(|a, b| b.borrow_id.0.cmp(&a.borrow_id.0));
        snapshots
    }

    /// Overdue listing as of `today`: open records past their due date,
    /// plus records that were returned late.
    pub fn list_overdue(&self, today: NaiveDate) -> Vec<BorrowingSnapshot> {
        let mut snapshots: Vec<_> = self
            .store
            .records()
            .filter(|r| r.is_overdue_as_of(today))
            .map(|r| r.snapshot())
            .collect();
        snapshots.sort_by(|a, b| b.borrow_id.0.cmp(&a.borrow_id.0));
        snapshots
    }

    /// Number of borrowings on file for the member, as shown on the
    /// members listing.
    ///
    /// # Errors
    ///
    /// Returns [`LendingError::MemberNotFound`] for an unknown member id.
    pub fn borrow_count_for_member(&self, member_id: &MemberId) -> Result<usize, LendingError> {
        if !self.store.contains_member(member_id) {
            return Err(LendingError::MemberNotFound);
        }
        Ok(self.store.count_for_member(member_id))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

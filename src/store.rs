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

//! Entity store: the row maps, their uniqueness indexes, and the atomic
//! primitives over them.
//!
//! Uniqueness of caller-assigned identifiers is enforced with the
//! [`DashMap`] entry API, an atomic check-and-insert; the registry never
//! has to infer a duplicate from an error message. Secondary unique keys
//! (ISBN, email) are claimed the same way through dedicated index maps,
//! with the claim entry held while the row lands so two racing
//! registrations cannot both pass the check.
//!
//! Lock order across the store is fixed: uniqueness index shard, then
//! member map shard, then staff map shard, then book map shard, then
//! record map shard, then record state mutex, then book copy-count mutex.
//! Every operation acquires along that order (skipping levels is fine),
//! which keeps the lock graph acyclic. Row removal re-counts references
//! under the row's own map entry, so a removal and an in-flight create
//! that holds the row handle serialize on the shard lock instead of
//! racing.

use crate::base::{BookId, BorrowId, MemberId, StaffId};
use crate::book::Book;
use crate::record::{BorrowRecord, BorrowRequest, BorrowStatus};
use crate::roster::{Member, Staff};
use crate::LendingError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// In-memory relational store for books, members, staff, and borrowings.
#[derive(Debug, Default)]
pub(crate) struct Store {
    books: DashMap<BookId, Book>,
    members: DashMap<MemberId, Member>,
    staff: DashMap<StaffId, Staff>,
    records: DashMap<BorrowId, Arc<BorrowRecord>>,
    isbns: DashMap<String, BookId>,
    member_emails: DashMap<String, MemberId>,
    staff_emails: DashMap<String, StaffId>,
}

impl Store {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    // === Books ===

    /// Inserts a book, enforcing unique id and unique ISBN.
    ///
    /// The ISBN claim entry stays held while the row lands; a racing
    /// registration with the same ISBN blocks on the claim and then sees
    /// it occupied. A rejected insert leaves no claim behind.
    pub(crate) fn insert_book(&self, book: Book) -> Result<(), LendingError> {
        match self.isbns.entry(book.isbn().to_string()) {
            Entry::Occupied(_) => Err(LendingError::DuplicateIsbn),
            Entry::Vacant(claim) => match self.books.entry(book.book_id()) {
                Entry::Occupied(_) => Err(LendingError::DuplicateBookId),
                Entry::Vacant(entry) => {
                    claim.insert(book.book_id());
                    entry.insert(book);
                    Ok(())
                }
            },
        }
    }

    pub(crate) fn book(
        &self,
        book_id: &BookId,
    ) -> Option<dashmap::mapref::one::Ref<'_, BookId, Book>> {
        self.books.get(book_id)
    }

    pub(crate) fn contains_book(&self, book_id: &BookId) -> bool {
        self.books.contains_key(book_id)
    }

    /// Removes a book only if no borrowing record references it.
    ///
    /// The reference count runs under the book's own map entry, so a
    /// create that is holding the row handle finishes (and its record
    /// becomes visible) before the count is taken.
    pub(crate) fn remove_book(&self, book_id: &BookId) -> Result<(), LendingError> {
        let isbn = match self.books.entry(*book_id) {
            Entry::Occupied(entry) => {
                if self.count_for_book(book_id) > 0 {
                    return Err(LendingError::BookInUse);
                }
                entry.remove().isbn().to_string()
            }
            Entry::Vacant(_) => return Err(LendingError::BookNotFound),
        };
        // Row first, claim second: the worst a racing registration sees
        // is a transient duplicate-ISBN rejection, never two rows.
        self.isbns.remove(&isbn);
        Ok(())
    }

    // === Members ===

    /// Inserts a member, enforcing unique id and unique email.
    pub(crate) fn insert_member(&self, member: Member) -> Result<(), LendingError> {
        match self.member_emails.entry(member.email().to_string()) {
            Entry::Occupied(_) => Err(LendingError::DuplicateEmail),
            Entry::Vacant(claim) => match self.members.entry(member.member_id()) {
                Entry::Occupied(_) => Err(LendingError::DuplicateMemberId),
                Entry::Vacant(entry) => {
                    claim.insert(member.member_id());
                    entry.insert(member);
                    Ok(())
                }
            },
        }
    }

    /// Holding the returned handle pins the member's shard, so a
    /// concurrent [`remove_member`](Store::remove_member) waits for it.
    pub(crate) fn member(
        &self,
        member_id: &MemberId,
    ) -> Option<dashmap::mapref::one::Ref<'_, MemberId, Member>> {
        self.members.get(member_id)
    }

    pub(crate) fn contains_member(&self, member_id: &MemberId) -> bool {
        self.members.contains_key(member_id)
    }

    /// Removes a member only if no borrowing record references them.
    pub(crate) fn remove_member(&self, member_id: &MemberId) -> Result<(), LendingError> {
        let email = match self.members.entry(*member_id) {
            Entry::Occupied(entry) => {
                if self.count_for_member(member_id) > 0 {
                    return Err(LendingError::MemberInUse);
                }
                entry.remove().email().to_string()
            }
            Entry::Vacant(_) => return Err(LendingError::MemberNotFound),
        };
        self.member_emails.remove(&email);
        Ok(())
    }

    // === Staff ===

    /// Inserts a staff member, enforcing unique id and unique email.
    pub(crate) fn insert_staff(&self, staff: Staff) -> Result<(), LendingError> {
        match self.staff_emails.entry(staff.email().to_string()) {
            Entry::Occupied(_) => Err(LendingError::DuplicateEmail),
            Entry::Vacant(claim) => match self.staff.entry(staff.staff_id()) {
                Entry::Occupied(_) => Err(LendingError::DuplicateStaffId),
                Entry::Vacant(entry) => {
                    claim.insert(staff.staff_id());
                    entry.insert(staff);
                    Ok(())
                }
            },
        }
    }

    /// Holding the returned handle pins the staff member's shard, so a
    /// concurrent [`remove_staff`](Store::remove_staff) waits for it.
    pub(crate) fn staff_member(
        &self,
        staff_id: &StaffId,
    ) -> Option<dashmap::mapref::one::Ref<'_, StaffId, Staff>> {
        self.staff.get(staff_id)
    }

    pub(crate) fn contains_staff(&self, staff_id: &StaffId) -> bool {
        self.staff.contains_key(staff_id)
    }

    /// Removes a staff member only if no borrowing record references them.
    pub(crate) fn remove_staff(&self, staff_id: &StaffId) -> Result<(), LendingError> {
        let email = match self.staff.entry(*staff_id) {
            Entry::Occupied(entry) => {
                if self.count_for_staff(staff_id) > 0 {
                    return Err(LendingError::StaffInUse);
                }
                entry.remove().email().to_string()
            }
            Entry::Vacant(_) => return Err(LendingError::StaffNotFound),
        };
        self.staff_emails.remove(&email);
        Ok(())
    }

    // === Borrowing records ===

    /// Atomically claims the borrow id, reserves the copy, and inserts the
    /// record.
    ///
    /// The vacant entry is held while `reserve` runs, so a duplicate id is
    /// rejected before any copy is taken and a failed reservation leaves
    /// the record map untouched. `reserve` is the only fallible step after
    /// the claim; the insert itself cannot fail.
    ///
    /// # Errors
    ///
    /// Returns [`LendingError::DuplicateBorrowId`] on an id collision, or
    /// whatever `reserve` returns.
    pub(crate) fn create_record(
        &self,
        request: &BorrowRequest,
        reserve: impl FnOnce() -> Result<(), LendingError>,
    ) -> Result<Arc<BorrowRecord>, LendingError> {
        match self.records.entry(request.borrow_id) {
            Entry::Occupied(_) => Err(LendingError::DuplicateBorrowId),
            Entry::Vacant(entry) => {
                reserve()?;
                let record = Arc::new(BorrowRecord::new(request));
                entry.insert(Arc::clone(&record));
                Ok(record)
            }
        }
    }

    /// Detaches the record handle from the map; the shard lock is not held
    /// by the returned `Arc`.
    pub(crate) fn record(&self, borrow_id: &BorrowId) -> Option<Arc<BorrowRecord>> {
        self.records.get(borrow_id).map(|r| Arc::clone(&r))
    }

    /// Removes the record only if it is still in the `Returned` state when
    /// the map entry is locked, closing the check-then-remove race.
    pub(crate) fn remove_returned_record(
        &self,
        borrow_id: &BorrowId,
    ) -> Option<Arc<BorrowRecord>> {
        self.records
            .remove_if(borrow_id, |_, record| {
                record.status() == BorrowStatus::Returned
            })
            .map(|(_, record)| record)
    }

    pub(crate) fn records(
        &self,
    ) -> impl Iterator<Item = dashmap::mapref::multiple::RefMulti<'_, BorrowId, Arc<BorrowRecord>>>
    {
        self.records.iter()
    }

    /// Referential Guard counts: how many borrowings reference the row.
    /// Reads only immutable record fields, so no row locks are taken.
    pub(crate) fn count_for_book(&self, book_id: &BookId) -> usize {
        self.records.iter().filter(|r| r.book_id() == *book_id).count()
    }

    pub(crate) fn count_for_member(&self, member_id: &MemberId) -> usize {
        self.records
            .iter()
            .filter(|r| r.member_id() == *member_id)
            .count()
    }

    pub(crate) fn count_for_staff(&self, staff_id: &StaffId) -> usize {
        self.records
            .iter()
            .filter(|r| r.staff_id() == *staff_id)
            .count()
    }
}

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

//! Referential and uniqueness consistency under racing operations.
//!
//! These tests pit a pair of conflicting operations against each other
//! behind a barrier, many times over: entity removal against a borrowing
//! create that references the entity, and duplicate-key registrations.
//! Exactly one side may ever win.

use chrono::NaiveDate;
use circulation_rs::{
    Book, BookId, BorrowId, BorrowRequest, LendingError, Member, MemberId, Registry, Staff,
    StaffId,
};
use std::sync::{Arc, Barrier};
use std::thread;

const ATTEMPTS: u32 = 500;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn seeded_registry() -> Registry {
    let registry = Registry::new();
    registry
        .add_book(Book::new(BookId(101), "Dune", "978-0441172719", 3, 3).unwrap())
        .unwrap();
    registry
        .add_member(Member::new(
            MemberId(12),
            "Alice Aly",
            "alice@uni.edu",
            "Student",
            date(2023, 9, 1),
        ))
        .unwrap();
    registry
        .add_staff(Staff::new(StaffId(5), "Bob Beam", "bob@uni.edu", "Day", "Active"))
        .unwrap();
    registry
}

fn make_request(borrow: u32) -> BorrowRequest {
    BorrowRequest {
        borrow_id: BorrowId(borrow),
        borrow_date: date(2024, 1, 1),
        due_date: date(2024, 1, 10),
        member_id: MemberId(12),
        staff_id: StaffId(5),
        book_id: BookId(101),
    }
}

// === Removal vs. create ===

#[test]
fn member_removal_never_orphans_a_borrowing() {
    for _ in 0..ATTEMPTS {
        let registry = Arc::new(seeded_registry());
        let barrier = Arc::new(Barrier::new(2));

        let creator = {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.create_borrowing(make_request(7001))
            })
        };
        let remover = {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.remove_member(&MemberId(12))
            })
        };

        let created = creator.join().unwrap();
        let removed = remover.join().unwrap();

        // At most one side wins; a record must never reference a
        // member that is gone from the roster.
        assert!(
            !(created.is_ok() && removed.is_ok()),
            "borrowing exists but its member was deleted"
        );
        if created.is_ok() {
            assert_eq!(removed, Err(LendingError::MemberInUse));
            assert_eq!(registry.borrow_count_for_member(&MemberId(12)).unwrap(), 1);
        } else {
            assert_eq!(created.unwrap_err(), LendingError::MemberNotFound);
            assert!(registry.get_borrowing(&BorrowId(7001)).is_none());
        }
    }
}

#[test]
fn staff_removal_never_orphans_a_borrowing() {
    for _ in 0..ATTEMPTS {
        let registry = Arc::new(seeded_registry());
        let barrier = Arc::new(Barrier::new(2));

        let creator = {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.create_borrowing(make_request(7001))
            })
        };
        let remover = {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.remove_staff(&StaffId(5))
            })
        };

        let created = creator.join().unwrap();
        let removed = remover.join().unwrap();

        assert!(!(created.is_ok() && removed.is_ok()));
        if created.is_ok() {
            assert_eq!(removed, Err(LendingError::StaffInUse));
        } else {
            assert_eq!(created.unwrap_err(), LendingError::StaffNotFound);
            assert!(registry.get_borrowing(&BorrowId(7001)).is_none());
        }
    }
}

#[test]
fn book_removal_never_strands_a_reserved_copy() {
    for _ in 0..ATTEMPTS {
        let registry = Arc::new(seeded_registry());
        let barrier = Arc::new(Barrier::new(2));

        let creator = {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.create_borrowing(make_request(7001))
            })
        };
        let remover = {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.remove_book(&BookId(101))
            })
        };

        let created = creator.join().unwrap();
        let removed = remover.join().unwrap();

        assert!(!(created.is_ok() && removed.is_ok()));
        if created.is_ok() {
            assert_eq!(removed, Err(LendingError::BookInUse));
            // The book is still on the shelf map, so the loan can close
            // and release its copy.
            registry
                .return_borrowing(BorrowId(7001), date(2024, 1, 10))
                .unwrap();
            assert_eq!(
                registry.get_book(&BookId(101)).unwrap().available_copies,
                3
            );
        } else {
            assert_eq!(created.unwrap_err(), LendingError::BookNotFound);
            assert!(registry.get_borrowing(&BorrowId(7001)).is_none());
        }
    }
}

// === Duplicate-key registrations ===

#[test]
fn racing_registrations_admit_one_isbn() {
    for attempt in 0..ATTEMPTS {
        let registry = Arc::new(Registry::new());
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = (0..2u32)
            .map(|i| {
                let registry = Arc::clone(&registry);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let book = Book::new(
                        BookId(attempt * 2 + i),
                        "Dune",
                        "978-0441172719",
                        3,
                        3,
                    )
                    .unwrap();
                    barrier.wait();
                    registry.add_book(book)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners = results.iter().filter(|r| r.is_ok()).count();

        assert_eq!(winners, 1, "both books with the same ISBN were registered");
        assert!(results.contains(&Err(LendingError::DuplicateIsbn)));
    }
}

#[test]
fn racing_registrations_admit_one_member_email() {
    for attempt in 0..ATTEMPTS {
        let registry = Arc::new(Registry::new());
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = (0..2u32)
            .map(|i| {
                let registry = Arc::clone(&registry);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let member = Member::new(
                        MemberId(attempt * 2 + i),
                        "Alice Aly",
                        "alice@uni.edu",
                        "Student",
                        date(2023, 9, 1),
                    );
                    barrier.wait();
                    registry.add_member(member)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners = results.iter().filter(|r| r.is_ok()).count();

        assert_eq!(winners, 1, "both members with the same email were registered");
        assert!(results.contains(&Err(LendingError::DuplicateEmail)));
    }
}

#[test]
fn racing_registrations_admit_one_staff_email() {
    for attempt in 0..ATTEMPTS {
        let registry = Arc::new(Registry::new());
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = (0..2u32)
            .map(|i| {
                let registry = Arc::clone(&registry);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let staff =
                        Staff::new(StaffId(attempt * 2 + i), "Bob Beam", "bob@uni.edu", "Day", "Active");
                    barrier.wait();
                    registry.add_staff(staff)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners = results.iter().filter(|r| r.is_ok()).count();

        assert_eq!(winners, 1);
        assert!(results.contains(&Err(LendingError::DuplicateEmail)));
    }
}

// === Freed keys after removal ===

#[test]
fn removal_releases_isbn_and_email_for_reuse() {
    let registry = seeded_registry();
    registry.remove_book(&BookId(101)).unwrap();
    registry.remove_member(&MemberId(12)).unwrap();
    registry.remove_staff(&StaffId(5)).unwrap();

    registry
        .add_book(Book::new(BookId(201), "Dune", "978-0441172719", 1, 1).unwrap())
        .unwrap();
    registry
        .add_member(Member::new(
            MemberId(22),
            "Alice Again",
            "alice@uni.edu",
            "Student",
            date(2024, 1, 1),
        ))
        .unwrap();
    registry
        .add_staff(Staff::new(StaffId(15), "Bob Back", "bob@uni.edu", "Night", "Active"))
        .unwrap();
}

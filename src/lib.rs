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

//! # Circulation
//!
//! This library provides the borrowing and inventory engine for a
//! university library: creating borrowings (reserving a physical copy),
//! returning them (releasing the copy and charging overdue fines), and the
//! referential checks that keep catalog deletions safe.
//!
//! ## Core Components
//!
//! - [`Registry`]: Central orchestrator for the borrowing lifecycle
//! - [`Book`]: Catalog row owning its available-copy count
//! - [`BorrowRequest`] / [`BorrowingSnapshot`]: Command in, record view out
//! - [`LendingError`]: Specific failure variants with an [`ErrorKind`]
//!   taxonomy
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use circulation_rs::{
//!     Book, BookId, BorrowId, BorrowRequest, BorrowStatus, Member, MemberId, Registry, Staff,
//!     StaffId,
//! };
//!
//! let registry = Registry::new();
//! registry
//!     .add_book(Book::new(BookId(101), "Dune", "978-0441172719", 3, 3).unwrap())
//!     .unwrap();
//! registry
//!     .add_member(Member::new(
//!         MemberId(12),
//!         "Alice Aly",
//!         "alice@uni.edu",
//!         "Student",
//!         NaiveDate::from_ymd_opt(2023, 9, 1).unwrap(),
//!     ))
//!     .unwrap();
//! registry
//!     .add_staff(Staff::new(StaffId(5), "Bob Beam", "bob@uni.edu", "Day", "Active"))
//!     .unwrap();
//!
//! // Borrow a copy
//! let created = registry
//!     .create_borrowing(BorrowRequest {
//!         borrow_id: BorrowId(7001),
//!         borrow_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!         due_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
//!         member_id: MemberId(12),
//!         staff_id: StaffId(5),
//!         book_id: BookId(101),
//!     })
//!     .unwrap();
//! assert_eq!(created.status, BorrowStatus::Borrowed);
//! assert_eq!(registry.get_book(&BookId(101)).unwrap().available_copies, 2);
//!
//! // Return it on the due date: no fine, copy back on the shelf
//! let outcome = registry
//!     .return_borrowing(BorrowId(7001), NaiveDate::from_ymd_opt(2024, 1, 10).unwrap())
//!     .unwrap();
//! assert_eq!(outcome.snapshot().status, BorrowStatus::Returned);
//! assert_eq!(registry.get_book(&BookId(101)).unwrap().available_copies, 3);
//! ```
//!
//! ## Thread Safety
//!
//! The registry handles concurrent access to its rows, serializing
//! reserve/release per book and closure per record so that the last copy
//! is never oversold and a return is applied at most once.

pub mod book;
mod base;
pub mod error;
pub mod fine;
mod record;
mod registry;
mod roster;
mod store;

pub use base::{BookId, BorrowId, MemberId, StaffId};
pub use book::{Book, BookSnapshot};
pub use error::{ErrorKind, LendingError};
pub use record::{BorrowRequest, BorrowStatus, BorrowingSnapshot, ReturnOutcome};
pub use registry::Registry;
pub use roster::{Member, Staff};

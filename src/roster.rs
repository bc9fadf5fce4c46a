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

//! Member and staff rows.
//!
//! Attribute editing lives outside the core; these rows exist here so the
//! borrowing registry can enforce referential checks against them. Emails
//! are unique per roster, enforced by the store at insertion.

use crate::base::{MemberId, StaffId};
use chrono::NaiveDate;

/// A library member who borrows books.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    member_id: MemberId,
    name: String,
    email: String,
    role: String,
    joined_on: NaiveDate,
}

impl Member {
    pub fn new(
        member_id: MemberId,
        name: impl Into<String>,
        email: impl Into<String>,
        role: impl Into<String>,
        joined_on: NaiveDate,
    ) -> Self {
        Self {
            member_id,
            name: name.into(),
            email: email.into(),
            role: role.into(),
            joined_on,
        }
    }

    pub fn member_id(&self) -> MemberId {
        self.member_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Membership role, e.g. "Student" or "Faculty".
    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn joined_on(&self) -> NaiveDate {
        self.joined_on
    }
}

/// A staff member recorded as the handling agent on borrowings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Staff {
    staff_id: StaffId,
    name: String,
    email: String,
    shift: String,
    status: String,
}

impl Staff {
    pub fn new(
        staff_id: StaffId,
        name: impl Into<String>,
        email: impl Into<String>,
        shift: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            staff_id,
            name: name.into(),
            email: email.into(),
            shift: shift.into(),
            status: status.into(),
        }
    }

    pub fn staff_id(&self) -> StaffId {
        self.staff_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn shift(&self) -> &str {
        &self.shift
    }

    pub fn status(&self) -> &str {
        &self.status
    }
}

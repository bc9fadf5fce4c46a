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

//! Overdue fine calculation.
//!
//! Pure date arithmetic with no access to the store; the registry supplies
//! the effective return date (the operation's current date).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Fine charged per whole day past the due date.
pub const DAILY_FINE_RATE: Decimal = dec!(2.00);

/// Computes `(late_days, fine_amount)` for a return.
///
/// `late_days` is the number of whole days by which `returned_on` exceeds
/// `due_date`, floored at zero; the fine is `late_days * daily_rate`.
/// Returning on or before the due date always yields `(0, 0)`.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use circulation_rs::fine::{compute_fine, DAILY_FINE_RATE};
/// use rust_decimal_macros::dec;
///
/// let due = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
/// let returned = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
/// assert_eq!(compute_fine(due, returned, DAILY_FINE_RATE), (5, dec!(10.00)));
/// ```
pub fn compute_fine(due_date: NaiveDate, returned_on: NaiveDate, daily_rate: Decimal) -> (i64, Decimal) {
    let late_days = returned_on.signed_duration_since(due_date).num_days().max(0);
    (late_days, Decimal::from(late_days) * daily_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn on_time_return_has_no_fine() {
        let (days, fine) = compute_fine(date(2024, 1, 10), date(2024, 1, 10), DAILY_FINE_RATE);
        assert_eq!(days, 0);
        assert_eq!(fine, Decimal::ZERO);
    }

    #[test]
    fn early_return_has_no_fine() {
        let (days, fine) = compute_fine(date(2024, 1, 10), date(2024, 1, 3), DAILY_FINE_RATE);
        assert_eq!(days, 0);
        assert_eq!(fine, Decimal::ZERO);
    }

    #[test]
    fn five_days_late_at_default_rate() {
        let (days, fine) = compute_fine(date(2024, 1, 10), date(2024, 1, 15), DAILY_FINE_RATE);
        assert_eq!(days, 5);
        assert_eq!(fine, dec!(10.00));
    }

    #[test]
    fn one_day_late_charges_one_rate() {
        let (days, fine) = compute_fine(date(2024, 1, 10), date(2024, 1, 11), dec!(3.50));
        assert_eq!(days, 1);
        assert_eq!(fine, dec!(3.50));
    }

    #[test]
    fn lateness_spans_month_boundaries() {
        let (days, fine) = compute_fine(date(2024, 1, 28), date(2024, 2, 2), DAILY_FINE_RATE);
        assert_eq!(days, 5);
        assert_eq!(fine, dec!(10.00));
    }

    #[test]
    fn lateness_counts_the_leap_day() {
        let (days, _) = compute_fine(date(2024, 2, 28), date(2024, 3, 1), DAILY_FINE_RATE);
        assert_eq!(days, 2);
    }

    #[test]
    fn zero_rate_charges_nothing() {
        let (days, fine) = compute_fine(date(2024, 1, 10), date(2024, 1, 20), Decimal::ZERO);
        assert_eq!(days, 10);
        assert_eq!(fine, Decimal::ZERO);
    }
}

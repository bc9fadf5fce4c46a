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

use chrono::NaiveDate;
use circulation_rs::{
    Book, BookId, BorrowId, BorrowRequest, LendingError, Member, MemberId, Registry, Staff,
    StaffId,
};
use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;

/// Circulation - Process library event CSV files
///
/// Reads catalog/roster registrations and borrowing events from a CSV file
/// and outputs the resulting borrowing records to stdout.
#[derive(Parser, Debug)]
#[command(name = "circulation-rs")]
#[command(about = "A circulation engine that processes library event CSVs", long_about = None)]
struct Args {
    /// Path to CSV file with events
    ///
    /// Expected format: type,id,book,member,staff,name,detail,copies,date,due
    /// Example: cargo run -- events.csv > borrowings.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Effective current date for returns and the overdue listing
    /// (defaults to the local date)
    #[arg(long, value_name = "YYYY-MM-DD")]
    today: Option<NaiveDate>,

    /// Output only records overdue as of the effective date
    #[arg(long)]
    overdue: bool,

    /// Fine charged per late day
    #[arg(long, default_value = "2.00")]
    daily_rate: Decimal,
}

fn main() {
    // Parse command line arguments
    let args = Args::parse();
    let today = args
        .today
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    // Open input file
    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    // Process events from CSV
    let registry = match process_events(BufReader::new(file), today, args.daily_rate) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Error processing events: {}", e);
            process::exit(1);
        }
    };

    // Write results to stdout
    let snapshots = if args.overdue {
        registry.list_overdue(today)
    } else {
        registry.borrowings()
    };
    if let Err(e) = write_borrowings(&snapshots, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

/// Raw CSV record matching the input format.
///
/// Fields: `type, id, book, member, staff, name, detail, copies, date, due`
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(rename = "type")]
    event: String,
    id: u32,
    book: Option<u32>,
    member: Option<u32>,
    staff: Option<u32>,
    name: Option<String>,
    detail: Option<String>,
    copies: Option<u32>,
    #[serde(deserialize_with = "csv::invalid_option")]
    date: Option<NaiveDate>,
    #[serde(deserialize_with = "csv::invalid_option")]
    due: Option<NaiveDate>,
}

/// One library event parsed from a CSV row.
#[derive(Debug)]
enum Event {
    AddBook {
        id: BookId,
        title: String,
        isbn: String,
        copies: u32,
    },
    AddMember {
        id: MemberId,
        name: String,
        email: String,
        joined: Option<NaiveDate>,
    },
    AddStaff {
        id: StaffId,
        name: String,
        email: String,
    },
    Borrow(BorrowRequest),
    Return {
        id: BorrowId,
        on: Option<NaiveDate>,
    },
    Delete {
        id: BorrowId,
    },
}

impl CsvRecord {
    /// Converts a CSV record to an event.
    ///
    /// # Errors
    ///
    /// Returns [`LendingError::MissingField`] when a field the event type
    /// requires is absent; unknown event types are reported the same way.
    fn into_event(self) -> Result<Event, LendingError> {
        match self.event.to_lowercase().as_str() {
            "book" => Ok(Event::AddBook {
                id: BookId(self.id),
                title: self.name.ok_or(LendingError::MissingField("name"))?,
                isbn: self.detail.ok_or(LendingError::MissingField("detail"))?,
                copies: self.copies.ok_or(LendingError::MissingField("copies"))?,
            }),
            "member" => Ok(Event::AddMember {
                id: MemberId(self.id),
                name: self.name.ok_or(LendingError::MissingField("name"))?,
                email: self.detail.ok_or(LendingError::MissingField("detail"))?,
                joined: self.date,
            }),
            "staff" => Ok(Event::AddStaff {
                id: StaffId(self.id),
                name: self.name.ok_or(LendingError::MissingField("name"))?,
                email: self.detail.ok_or(LendingError::MissingField("detail"))?,
            }),
            "borrow" => Ok(Event::Borrow(BorrowRequest {
                borrow_id: BorrowId(self.id),
                borrow_date: self.date.ok_or(LendingError::MissingField("date"))?,
                due_date: self.due.ok_or(LendingError::MissingField("due"))?,
                member_id: MemberId(self.member.ok_or(LendingError::MissingField("member"))?),
                staff_id: StaffId(self.staff.ok_or(LendingError::MissingField("staff"))?),
                book_id: BookId(self.book.ok_or(LendingError::MissingField("book"))?),
            })),
            "return" => Ok(Event::Return {
                id: BorrowId(self.id),
                on: self.date,
            }),
            "delete" => Ok(Event::Delete {
                id: BorrowId(self.id),
            }),
            _ => Err(LendingError::MissingField("type")),
        }
    }
}

/// Process library events from a CSV reader.
///
/// Streaming parse; malformed rows and rejected events are skipped so one
/// bad row never aborts the run. Registrations default the attributes the
/// CSV does not carry (member role, staff shift/status).
///
/// # CSV Format
///
/// Expected columns: `type, id, book, member, staff, name, detail, copies, date, due`
/// - `type`: Event type (book, member, staff, borrow, return, delete)
/// - `id`: Row id for registrations, borrow id for lifecycle events
/// - `book`/`member`/`staff`: Referenced row ids (borrow events)
/// - `name`, `detail`: Title/ISBN for books, name/email for people
/// - `copies`: Total copies (book registration)
/// - `date`, `due`: Borrow and due dates; `date` doubles as the return
///   date on return events (defaults to the effective current date)
///
/// # Example
///
/// ```csv
/// type,id,book,member,staff,name,detail,copies,date,due
/// book,101,,,,Dune,978-0441172719,3,,
/// member,12,,,,Alice Aly,alice@uni.edu,,2023-09-01,
/// staff,5,,,,Bob Beam,bob@uni.edu,,,
/// borrow,7001,101,12,5,,,,2024-01-01,2024-01-10
/// return,7001,,,,,,,2024-01-15,
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails or the CSV structure is
/// invalid. Individual event errors are logged in debug mode but don't
/// stop processing.
pub fn process_events<R: Read>(
    reader: R,
    today: NaiveDate,
    daily_rate: Decimal,
) -> Result<Registry, csv::Error> {
    let registry = Registry::with_daily_rate(daily_rate);

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All) // Handle whitespace in fields like " borrow "
        .flexible(true) // Allow short rows for simple events
        .has_headers(true) // Skip first row as header
        .from_reader(reader);

    for result in rdr.deserialize::<CsvRecord>() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                // Skip malformed rows
                #[cfg(debug_assertions)]
                eprintln!("Skipping malformed row: {}", e);
                continue;
            }
        };

        let event = match record.into_event() {
            Ok(event) => event,
            Err(e) => {
                #[cfg(debug_assertions)]
                eprintln!("Skipping invalid event record: {}", e);
                continue;
            }
        };

        // Apply the event, ignoring rejections (silent failure)
        if let Err(e) = apply_event(&registry, event, today) {
            #[cfg(debug_assertions)]
            eprintln!("Skipping rejected event: {}", e);
        }
    }

    Ok(registry)
}

fn apply_event(registry: &Registry, event: Event, today: NaiveDate) -> Result<(), LendingError> {
    match event {
        Event::AddBook {
            id,
            title,
            isbn,
            copies,
        } => registry.add_book(Book::new(id, title, isbn, copies, copies)?),
        Event::AddMember {
            id,
            name,
            email,
            joined,
        } => registry.add_member(Member::new(
            id,
            name,
            email,
            "Student",
            joined.unwrap_or(today),
        )),
        Event::AddStaff { id, name, email } => {
            registry.add_staff(Staff::new(id, name, email, "Day", "Active"))
        }
        Event::Borrow(request) => registry.create_borrowing(request).map(|_| ()),
        Event::Return { id, on } => registry
            .return_borrowing(id, on.unwrap_or(today))
            .map(|_| ()),
        Event::Delete { id } => registry.delete_borrowing(id).map(|_| ()),
    }
}

/// Write borrowing snapshots to a CSV writer.
///
/// # CSV Format
///
/// Columns: `borrow, book, member, staff, borrowed, due, returned, status, fine`
///
/// # Example
///
/// ```csv
/// borrow,book,member,staff,borrowed,due,returned,status,fine
/// 7001,101,12,5,2024-01-01,2024-01-10,2024-01-15,Overdue,10.00
/// ```
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_borrowings<W: Write>(
    snapshots: &[circulation_rs::BorrowingSnapshot],
    writer: W,
) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    for snapshot in snapshots {
        wtr.serialize(snapshot)?;
    }

    // Flush to ensure all data is written
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use circulation_rs::BorrowStatus;
    use rust_decimal_macros::dec;
    use std::io::Cursor;

    const HEADER: &str = "type,id,book,member,staff,name,detail,copies,date,due\n";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seeded(extra: &str) -> Registry {
        let csv = format!(
            "{HEADER}\
             book,101,,,,Dune,978-0441172719,3,,\n\
             member,12,,,,Alice Aly,alice@uni.edu,,2023-09-01,\n\
             staff,5,,,,Bob Beam,bob@uni.edu,,,\n\
             {extra}"
        );
        process_events(Cursor::new(csv), date(2024, 1, 15), dec!(2.00)).unwrap()
    }

    #[test]
    fn parse_registrations() {
        let registry = seeded("");
        let book = registry.get_book(&BookId(101)).unwrap();
        assert_eq!(book.title, "Dune");
        assert_eq!(book.available_copies, 3);
        assert!(registry.can_delete_member(&MemberId(12)).unwrap());
        assert!(registry.can_delete_staff(&StaffId(5)).unwrap());
    }

    #[test]
    fn parse_borrow_event() {
        let registry = seeded("borrow,7001,101,12,5,,,,2024-01-01,2024-01-10\n");
        let snapshot = registry.get_borrowing(&BorrowId(7001)).unwrap();
        assert_eq!(snapshot.status, BorrowStatus::Borrowed);
        assert_eq!(
            registry.get_book(&BookId(101)).unwrap().available_copies,
            2
        );
    }

    #[test]
    fn parse_return_event_with_date() {
        let registry = seeded(
            "borrow,7001,101,12,5,,,,2024-01-01,2024-01-10\n\
             return,7001,,,,,,,2024-01-15,\n",
        );
        let snapshot = registry.get_borrowing(&BorrowId(7001)).unwrap();
        assert_eq!(snapshot.status, BorrowStatus::Overdue);
        assert_eq!(snapshot.fine_amount, dec!(10.00));
        assert_eq!(
            registry.get_book(&BookId(101)).unwrap().available_copies,
            3
        );
    }

    #[test]
    fn return_without_date_uses_effective_date() {
        // Effective date in these tests is 2024-01-15, five days late.
        let registry = seeded(
            "borrow,7001,101,12,5,,,,2024-01-01,2024-01-10\n\
             return,7001,,,,,,,,\n",
        );
        let snapshot = registry.get_borrowing(&BorrowId(7001)).unwrap();
        assert_eq!(snapshot.return_date, Some(date(2024, 1, 15)));
        assert_eq!(snapshot.fine_amount, dec!(10.00));
    }

    #[test]
    fn parse_delete_event() {
        let registry = seeded(
            "borrow,7001,101,12,5,,,,2024-01-01,2024-01-10\n\
             return,7001,,,,,,,2024-01-10,\n\
             delete,7001,,,,,,,,\n",
        );
        assert!(registry.get_borrowing(&BorrowId(7001)).is_none());
    }

    #[test]
    fn rejected_events_do_not_stop_processing() {
        // Second borrow reuses the id and is skipped; the third proceeds.
        let registry = seeded(
            "borrow,7001,101,12,5,,,,2024-01-01,2024-01-10\n\
             borrow,7001,101,12,5,,,,2024-01-02,2024-01-12\n\
             borrow,7002,101,12,5,,,,2024-01-02,2024-01-12\n",
        );
        assert_eq!(registry.borrowings().len(), 2);
        assert_eq!(
            registry.get_book(&BookId(101)).unwrap().available_copies,
            1
        );
    }

    #[test]
    fn skip_malformed_rows() {
        let registry = seeded(
            "not-a-type,x,,,,,,,,\n\
             borrow,7001,101,12,5,,,,2024-01-01,2024-01-10\n",
        );
        assert_eq!(registry.borrowings().len(), 1);
    }

    #[test]
    fn parse_with_whitespace() {
        let registry = seeded(" borrow , 7001 , 101 , 12 , 5 ,,,, 2024-01-01 , 2024-01-10 \n");
        assert!(registry.get_borrowing(&BorrowId(7001)).is_some());
    }

    #[test]
    fn write_borrowings_to_csv() {
        let registry = seeded(
            "borrow,7001,101,12,5,,,,2024-01-01,2024-01-10\n\
             return,7001,,,,,,,2024-01-15,\n",
        );

        let mut output = Vec::new();
        write_borrowings(&registry.borrowings(), &mut output).unwrap();

        let output_str = String::from_utf8(output).unwrap();
        assert!(output_str.contains("borrow,book,member,staff,borrowed,due,returned,status,fine"));
        assert!(output_str.contains("7001,101,12,5,2024-01-01,2024-01-10,2024-01-15,Overdue,10.00"));
    }

    #[test]
    fn overdue_listing_only_includes_late_records() {
        let registry = seeded(
            "borrow,7001,101,12,5,,,,2024-01-01,2024-01-10\n\
             borrow,7002,101,12,5,,,,2024-01-14,2024-02-01\n",
        );

        let overdue = registry.list_overdue(date(2024, 1, 15));
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].borrow_id, BorrowId(7001));

        let mut output = Vec::new();
        write_borrowings(&overdue, &mut output).unwrap();
        let output_str = String::from_utf8(output).unwrap();
        assert!(output_str.contains("7001"));
        assert!(!output_str.contains("7002"));
    }
}

use std::{cmp::Ordering, fmt};

use chrono::NaiveDate;
use csv::StringRecord;
use serde::{Serialize, Serializer};

use crate::domain::{AccountName, EntryDate, LedgerEntry, LedgerRow, Owner};

// Slash dates with the year last are read month first.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

impl EntryDate {
    /// Parses a store cell, never failing: unknown shapes become `Invalid`.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();

        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
                return EntryDate::Valid(date);
            }
        }

        // Date-times such as "2026-01-02 00:00:00" or RFC 3339 timestamps.
        if let Some(prefix) = raw.get(..10) {
            if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
                return EntryDate::Valid(date);
            }
        }

        EntryDate::Invalid(raw.to_string())
    }

    pub fn valid(&self) -> Option<NaiveDate> {
        match self {
            EntryDate::Valid(date) => Some(*date),
            EntryDate::Invalid(_) => None,
        }
    }

    /// Chronological order with every invalid date after every valid one.
    ///
    /// Invalid dates compare equal to each other, so a stable sort keeps them
    /// in store order.
    pub fn cmp_chronological(&self, other: &EntryDate) -> Ordering {
        match (self.valid(), other.valid()) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

impl From<NaiveDate> for EntryDate {
    fn from(date: NaiveDate) -> Self {
        EntryDate::Valid(date)
    }
}

impl fmt::Display for EntryDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryDate::Valid(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            EntryDate::Invalid(raw) => f.write_str(raw),
        }
    }
}

impl Serialize for EntryDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<LedgerRow> for LedgerEntry {
    fn from(row: LedgerRow) -> Self {
        let owner = match row.user.as_deref().map(str::trim) {
            Some(user) if !user.is_empty() => Owner::new(user),
            _ => Owner::unknown(),
        };

        LedgerEntry {
            date: EntryDate::parse(&row.date),
            account: AccountName::new(row.account.trim()),
            firm: row.firm.trim().to_string(),
            initial: row.initial,
            target: row.target,
            balance: row.balance,
            owner,
        }
    }
}

impl From<&LedgerEntry> for StringRecord {
    fn from(entry: &LedgerEntry) -> Self {
        StringRecord::from(vec![
            entry.date.to_string(),
            entry.account.to_string(),
            entry.firm.clone(),
            entry.initial.to_string(),
            entry.target.to_string(),
            entry.balance.to_string(),
            entry.owner.to_string(),
        ])
    }
}

#[cfg(test)]
mod tests {
    use fastnum::dec128;

    use super::*;
    use crate::domain::COLUMNS;

    fn date(y: i32, m: u32, d: u32) -> EntryDate {
        EntryDate::Valid(NaiveDate::from_ymd_opt(y, m, d).expect("valid date"))
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(EntryDate::parse("2026-01-02"), date(2026, 1, 2));
        assert_eq!(EntryDate::parse("2026/01/02"), date(2026, 1, 2));
        assert_eq!(EntryDate::parse("01/02/2026"), date(2026, 1, 2));
        assert_eq!(EntryDate::parse(" 2026-01-02 00:00:00 "), date(2026, 1, 2));
        assert_eq!(EntryDate::parse("2026-01-02T09:30:00Z"), date(2026, 1, 2));
    }

    #[test]
    fn test_parse_date_invalid() {
        assert_eq!(
            EntryDate::parse("yesterday"),
            EntryDate::Invalid("yesterday".to_string())
        );
        assert_eq!(EntryDate::parse(""), EntryDate::Invalid(String::new()));
        assert_eq!(
            EntryDate::parse("25/12/2026"),
            EntryDate::Invalid("25/12/2026".to_string())
        );
        assert_eq!(
            EntryDate::parse("2026-13-40"),
            EntryDate::Invalid("2026-13-40".to_string())
        );
    }

    #[test]
    fn test_invalid_dates_sort_last() {
        let mut dates = vec![
            EntryDate::Invalid("b".to_string()),
            date(2026, 3, 1),
            EntryDate::Invalid("a".to_string()),
            date(2026, 1, 1),
        ];
        dates.sort_by(EntryDate::cmp_chronological);

        assert_eq!(
            dates,
            vec![
                date(2026, 1, 1),
                date(2026, 3, 1),
                EntryDate::Invalid("b".to_string()),
                EntryDate::Invalid("a".to_string()),
            ]
        );
    }

    #[test]
    fn test_row_without_user_gets_unknown_owner() {
        let headers = StringRecord::from(vec!["Date", "Account", "Firm", "Initial", "Target", "Balance"]);
        let record = StringRecord::from(vec!["2026-01-02", " Eval1 ", "Apex", "25000", "26600", "25000"]);

        let entry: LedgerEntry = record.deserialize(Some(&headers)).expect("row deserializes");

        assert_eq!(entry.account, AccountName::new("Eval1"));
        assert_eq!(entry.owner, Owner::unknown());
        assert_eq!(entry.initial, dec128!(25000));
    }

    #[test]
    fn test_entry_to_record_follows_column_order() {
        let entry = LedgerEntry {
            date: date(2026, 1, 2),
            account: AccountName::new("Eval1"),
            firm: "Apex".to_string(),
            initial: dec128!(25000),
            target: dec128!(26600),
            balance: dec128!(25800),
            owner: Owner::new("bob"),
        };

        let record = StringRecord::from(&entry);

        assert_eq!(record.len(), COLUMNS.len());
        assert_eq!(&record[0], "2026-01-02");
        assert_eq!(&record[1], "Eval1");
        assert_eq!(&record[6], "bob");
    }
}

mod impls;

use chrono::NaiveDate;
use fastnum::D128;
use serde::Deserialize;

/// Header row of the ledger store, in column order.
///
/// `User` is the last column and may be absent from stores (or rows) written
/// before accounts had owners.
pub const COLUMNS: [&str; 7] = ["Date", "Account", "Firm", "Initial", "Target", "Balance", "User"];

/// Column holding the account owner.
pub const OWNER_COLUMN: &str = "User";

/// Columns a header must carry for the store to be readable at all.
pub const REQUIRED_COLUMNS: [&str; 6] = ["Date", "Account", "Firm", "Initial", "Target", "Balance"];

/// Owner recorded for rows that predate the `User` column.
pub const UNKNOWN_OWNER: &str = "unknown";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AccountName(String);

impl AccountName {
    pub fn new(name: impl Into<String>) -> Self {
        AccountName(name.into())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Owner(String);

impl Owner {
    pub fn new(name: impl Into<String>) -> Self {
        Owner(name.into())
    }

    pub fn unknown() -> Self {
        Owner(UNKNOWN_OWNER.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Calendar date of a ledger row.
///
/// Cells that do not parse as a date are kept verbatim instead of failing the
/// load, so a full-store rewrite puts them back untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryDate {
    Valid(NaiveDate),
    Invalid(String),
}

/// One row of the ledger: the balance of one account as of one day.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(from = "LedgerRow")]
pub struct LedgerEntry {
    pub date: EntryDate,
    pub account: AccountName,
    pub firm: String,
    pub initial: D128,
    pub target: D128,
    /// Cumulative balance, not the day's delta.
    pub balance: D128,
    pub owner: Owner,
}

/// A helper struct to deserialize store rows keyed by the header names.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct LedgerRow {
    pub date: String,
    pub account: String,
    pub firm: String,
    pub initial: D128,
    pub target: D128,
    pub balance: D128,
    #[serde(default)]
    pub user: Option<String>,
}

/// Explicit per-invocation context handed to every query and mutation.
///
/// Without an owner the ledger is not partitioned.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub owner: Option<Owner>,
}

impl Session {
    pub fn for_owner(owner: Owner) -> Self {
        Session { owner: Some(owner) }
    }

    pub fn sees(&self, owner: &Owner) -> bool {
        self.owner.as_ref().is_none_or(|selected| selected == owner)
    }

    /// Owner stamped on rows written in this session.
    pub fn owner_or_unknown(&self) -> Owner {
        self.owner.clone().unwrap_or_else(Owner::unknown)
    }
}

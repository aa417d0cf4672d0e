use std::collections::HashSet;

use crate::domain::{AccountName, LedgerEntry, Session};

/// Read-only view deriving per-account state from the flat ledger.
#[derive(Clone, Copy, Debug)]
pub struct LedgerEngine<'a> {
    entries: &'a [LedgerEntry],
}

impl<'a> LedgerEngine<'a> {
    pub fn new(entries: &'a [LedgerEntry]) -> Self {
        LedgerEngine { entries }
    }

    /// All entries of `account`, ascending by date.
    ///
    /// Equal dates keep store order and invalid dates come last.
    pub fn history(&self, account: &AccountName) -> Vec<&'a LedgerEntry> {
        let mut history: Vec<_> = self.entries_of(account).collect();
        history.sort_by(|a, b| a.date.cmp_chronological(&b.date));
        history
    }

    /// The entry with the latest valid date, the last one in store order on ties.
    ///
    /// An account whose dates are all invalid falls back to its last row in
    /// store order. Returns `None` when the account has no entries.
    pub fn snapshot(&self, account: &AccountName) -> Option<&'a LedgerEntry> {
        self.entries_of(account)
            .filter(|entry| entry.date.valid().is_some())
            .max_by(|a, b| a.date.cmp_chronological(&b.date))
            .or_else(|| self.entries_of(account).last())
    }

    pub fn contains(&self, account: &AccountName) -> bool {
        self.entries_of(account).next().is_some()
    }

    /// Whether the session may see `account`: some entry of it belongs to the
    /// session owner.
    pub fn is_visible(&self, session: &Session, account: &AccountName) -> bool {
        self.entries_of(account).any(|entry| session.sees(&entry.owner))
    }

    /// Distinct account names in first-seen order.
    ///
    /// Entries are filtered by the session owner before names are deduplicated.
    pub fn account_names(&self, session: &Session) -> Vec<&'a AccountName> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .filter(|entry| session.sees(&entry.owner))
            .map(|entry| &entry.account)
            .filter(|account| seen.insert(*account))
            .collect()
    }

    fn entries_of(&self, account: &AccountName) -> impl Iterator<Item = &'a LedgerEntry> {
        self.entries
            .iter()
            .filter(move |entry| &entry.account == account)
    }
}

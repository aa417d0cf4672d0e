use chrono::NaiveDate;
use csv::StringRecord;
use fastnum::D128;
use tracing::{info, warn};

use crate::{
    domain::{AccountName, COLUMNS, LedgerEntry, OWNER_COLUMN, Session},
    engine::LedgerEngine,
    errors::{Result, TrackerError},
    loader::load_entries,
    store::LedgerStore,
};

/// Input of the create-account form.
#[derive(Clone, Debug)]
pub struct NewAccount {
    pub name: String,
    pub firm: String,
    pub initial: D128,
    pub target: D128,
}

/// The loaded ledger plus the store it came from.
///
/// Every mutation is a full read-modify-write against the store followed by
/// a reload, so the in-memory view always matches what was last read.
pub struct Tracker<S> {
    store: S,
    entries: Vec<LedgerEntry>,
    header: HeaderState,
}

/// Shape of the store's header row as of the last load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum HeaderState {
    Missing,
    /// Written before accounts had owners; a `User` field would be ignored.
    WithoutOwner,
    Current,
}

impl<S: LedgerStore> Tracker<S> {
    pub fn open(store: S) -> Result<Self> {
        let mut tracker = Tracker {
            store,
            entries: Vec::new(),
            header: HeaderState::Missing,
        };
        tracker.reload()?;
        Ok(tracker)
    }

    pub fn reload(&mut self) -> Result<()> {
        let table = self.store.read_all_rows()?;
        self.entries = load_entries(&table)?;
        self.header = match &table.headers {
            None => HeaderState::Missing,
            Some(headers) if headers.iter().any(|header| header == OWNER_COLUMN) => HeaderState::Current,
            Some(_) => HeaderState::WithoutOwner,
        };
        Ok(())
    }

    pub fn engine(&self) -> LedgerEngine<'_> {
        LedgerEngine::new(&self.entries)
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Appends the seed row of a new account, dated `today` with
    /// `balance == initial`.
    ///
    /// Names are unique across all owners.
    pub fn create_account(
        &mut self,
        session: &Session,
        account: NewAccount,
        today: NaiveDate,
    ) -> Result<LedgerEntry> {
        let name = account.name.trim();
        let firm = account.firm.trim();

        if name.is_empty() {
            return Err(TrackerError::InvalidAccount("name must not be empty".to_string()));
        }
        if firm.is_empty() {
            return Err(TrackerError::InvalidAccount("firm must not be empty".to_string()));
        }
        if account.initial <= D128::ZERO {
            return Err(TrackerError::InvalidAccount(format!(
                "initial balance must be positive, got {}",
                account.initial
            )));
        }

        let name = AccountName::new(name);
        if self.engine().contains(&name) {
            return Err(TrackerError::DuplicateAccount(name.to_string()));
        }

        let seed = LedgerEntry {
            date: today.into(),
            account: name,
            firm: firm.to_string(),
            initial: account.initial,
            target: account.target,
            balance: account.initial,
            owner: session.owner_or_unknown(),
        };

        self.prepare_header()?;
        self.store.append_row(&StringRecord::from(&seed))?;
        info!(account = %seed.account, owner = %seed.owner, firm = %seed.firm, "account created");

        self.reload()?;
        Ok(seed)
    }

    /// Appends `current balance + delta` for `date`, carrying forward the
    /// account's firm, initial, target and owner.
    ///
    /// Dates earlier than the latest entry are accepted; such an entry lands in
    /// the history but does not become the current snapshot.
    pub fn append_daily_entry(
        &mut self,
        session: &Session,
        account: &AccountName,
        date: NaiveDate,
        delta: D128,
    ) -> Result<LedgerEntry> {
        let current = self.visible_snapshot(session, account)?;

        let entry = LedgerEntry {
            date: date.into(),
            balance: current.balance + delta,
            ..current.clone()
        };

        self.prepare_header()?;
        self.store.append_row(&StringRecord::from(&entry))?;
        info!(account = %entry.account, date = %entry.date, delta = %delta, balance = %entry.balance, "daily entry added");

        self.reload()?;
        if self.engine().snapshot(account) != Some(&entry) {
            warn!(account = %account, date = %entry.date, "entry predates the current snapshot");
        }
        Ok(entry)
    }

    /// Removes every entry of `account` by rewriting the whole store.
    ///
    /// Returns the number of removed entries.
    pub fn delete_account(&mut self, session: &Session, account: &AccountName) -> Result<usize> {
        self.visible_snapshot(session, account)?;

        let (removed, remaining): (Vec<_>, Vec<_>) = self
            .entries
            .iter()
            .partition(|entry| &entry.account == account);
        let rows: Vec<StringRecord> = remaining.into_iter().map(StringRecord::from).collect();

        if !S::ATOMIC_REPLACE {
            warn!(account = %account, rows = rows.len(), "rewriting ledger store without atomic replace");
        }
        self.store.replace_all(&header_record(), &rows)?;
        info!(account = %account, removed = removed.len(), "account deleted");

        let removed = removed.len();
        self.reload()?;
        Ok(removed)
    }

    /// Makes sure appended rows are read back in full: writes the header into
    /// an empty store, and upgrades a header lacking the owner column by
    /// rewriting the current entries under the full header.
    fn prepare_header(&mut self) -> Result<()> {
        match self.header {
            HeaderState::Current => {}
            HeaderState::Missing => self.store.append_row(&header_record())?,
            HeaderState::WithoutOwner => {
                let rows: Vec<StringRecord> = self.entries.iter().map(StringRecord::from).collect();
                warn!(rows = rows.len(), "adding the owner column to the ledger header");
                self.store.replace_all(&header_record(), &rows)?;
            }
        }
        self.header = HeaderState::Current;
        Ok(())
    }

    fn visible_snapshot(&self, session: &Session, account: &AccountName) -> Result<&LedgerEntry> {
        let engine = self.engine();
        engine
            .snapshot(account)
            .filter(|_| engine.is_visible(session, account))
            .ok_or_else(|| TrackerError::UnknownAccount(account.to_string()))
    }
}

fn header_record() -> StringRecord {
    StringRecord::from(COLUMNS.to_vec())
}

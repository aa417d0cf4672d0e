use tracing::{debug, warn};

use crate::{
    domain::{EntryDate, LedgerEntry, REQUIRED_COLUMNS, UNKNOWN_OWNER},
    errors::{Result, TrackerError},
    store::RawTable,
};

/// Converts raw store rows into typed entries, in store order.
///
/// A store without a header, or with only a header, yields no entries.
/// Unparseable dates and missing owners are tolerated; missing required
/// columns and unparseable amounts are not.
pub fn load_entries(table: &RawTable) -> Result<Vec<LedgerEntry>> {
    let Some(headers) = &table.headers else {
        debug!("ledger store is empty");
        return Ok(Vec::new());
    };

    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|header| header == column) {
            return Err(TrackerError::MissingColumn(column));
        }
    }

    let mut entries = Vec::with_capacity(table.rows.len());
    let mut unowned = 0usize;

    for (index, record) in table.rows.iter().enumerate() {
        // Row 1 is the header.
        let line = index as u64 + 2;

        let entry: LedgerEntry = record
            .deserialize(Some(headers))
            .map_err(|source| TrackerError::MalformedRow { line, source })?;

        if let EntryDate::Invalid(raw) = &entry.date {
            warn!(line, account = %entry.account, raw = %raw, "unparseable date in ledger row");
        }
        if entry.owner.as_str() == UNKNOWN_OWNER {
            unowned += 1;
        }

        entries.push(entry);
    }

    debug!(rows = entries.len(), unowned, "ledger loaded");
    Ok(entries)
}

use std::{
    fs::{self, File, OpenOptions},
    io::{self, Read, Seek, SeekFrom, Write},
    path::PathBuf,
};

use csv::StringRecord;

use crate::errors::StoreError;

/// Everything a store holds: the header row (if any) followed by data rows in
/// store order.
#[derive(Debug, Default, Clone)]
pub struct RawTable {
    pub headers: Option<StringRecord>,
    pub rows: Vec<StringRecord>,
}

/// A row-oriented store holding the ledger, header in row 1.
pub trait LedgerStore {
    /// Whether `replace_all` swaps the whole table in one step.
    const ATOMIC_REPLACE: bool = false;

    fn read_all_rows(&self) -> Result<RawTable, StoreError>;

    fn append_row(&mut self, row: &StringRecord) -> Result<(), StoreError>;

    fn append_rows(&mut self, rows: &[StringRecord]) -> Result<(), StoreError>;

    fn clear(&mut self) -> Result<(), StoreError>;

    /// Replaces the whole table with `header` followed by `rows`.
    ///
    /// The default is clear, header, then bulk append. A failure after `clear`
    /// leaves the store empty or header-only.
    fn replace_all(&mut self, header: &StringRecord, rows: &[StringRecord]) -> Result<(), StoreError> {
        self.clear()?;
        self.append_row(header)?;
        if !rows.is_empty() {
            self.append_rows(rows)?;
        }
        Ok(())
    }
}

/// Ledger kept in a local CSV file.
///
/// Rows may have fewer columns than the header; reading is flexible.
#[derive(Debug, Clone)]
pub struct CsvFileStore {
    path: PathBuf,
}

impl CsvFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CsvFileStore { path: path.into() }
    }

    /// Opens the file for appending, terminating an unfinished last line so
    /// the next record starts on its own line.
    fn appender(&self) -> Result<csv::Writer<File>, StoreError> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;

        if file.metadata()?.len() > 0 {
            let mut last = [0u8; 1];
            file.seek(SeekFrom::End(-1))?;
            file.read_exact(&mut last)?;
            if last[0] != b'\n' {
                file.write_all(b"\n")?;
            }
        }

        Ok(csv::WriterBuilder::new().flexible(true).from_writer(file))
    }

    fn scratch_path(&self) -> PathBuf {
        let mut scratch = self.path.clone().into_os_string();
        scratch.push(".tmp");
        PathBuf::from(scratch)
    }
}

impl LedgerStore for CsvFileStore {
    const ATOMIC_REPLACE: bool = true;

    fn read_all_rows(&self) -> Result<RawTable, StoreError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(RawTable::default()),
            Err(err) => return Err(err.into()),
        };

        // The header is read as an ordinary record so an empty file has none.
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let mut records = reader.records();
        let headers = records.next().transpose()?;
        let rows = records.collect::<Result<Vec<_>, _>>()?;

        Ok(RawTable { headers, rows })
    }

    fn append_row(&mut self, row: &StringRecord) -> Result<(), StoreError> {
        self.append_rows(std::slice::from_ref(row))
    }

    fn append_rows(&mut self, rows: &[StringRecord]) -> Result<(), StoreError> {
        let mut writer = self.appender()?;
        for row in rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        File::create(&self.path)?;
        Ok(())
    }

    fn replace_all(&mut self, header: &StringRecord, rows: &[StringRecord]) -> Result<(), StoreError> {
        let scratch = self.scratch_path();

        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(&scratch)?;
        writer.write_record(header)?;
        for row in rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        drop(writer);

        fs::rename(&scratch, &self.path)?;
        Ok(())
    }
}

/// In-memory store counting every mutating call.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub rows: Vec<StringRecord>,
    pub mutations: usize,
    /// Once `mutations` reaches this count, every further mutating call fails
    /// without touching `rows`.
    pub fail_after: Option<usize>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn with_rows(rows: &[&[&str]]) -> Self {
        MemoryStore {
            rows: rows.iter().map(|row| StringRecord::from(row.to_vec())).collect(),
            ..Default::default()
        }
    }

    fn mutate(&mut self) -> Result<(), StoreError> {
        if self.fail_after.is_some_and(|limit| self.mutations >= limit) {
            return Err(io::Error::other("store unavailable").into());
        }
        self.mutations += 1;
        Ok(())
    }
}

#[cfg(test)]
impl LedgerStore for MemoryStore {
    fn read_all_rows(&self) -> Result<RawTable, StoreError> {
        let mut rows = self.rows.iter().cloned();
        Ok(RawTable {
            headers: rows.next(),
            rows: rows.collect(),
        })
    }

    fn append_row(&mut self, row: &StringRecord) -> Result<(), StoreError> {
        self.mutate()?;
        self.rows.push(row.clone());
        Ok(())
    }

    fn append_rows(&mut self, rows: &[StringRecord]) -> Result<(), StoreError> {
        self.mutate()?;
        self.rows.extend_from_slice(rows);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.mutate()?;
        self.rows.clear();
        Ok(())
    }
}

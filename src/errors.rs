use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrackerError>;

#[derive(Error, Debug)]
pub enum TrackerError {
    /// Store location or owner selection is missing or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("account '{0}' already exists")]
    DuplicateAccount(String),

    /// The account has no entries, or none the session is allowed to see.
    #[error("account '{0}' not found")]
    UnknownAccount(String),

    #[error("invalid account: {0}")]
    InvalidAccount(String),

    #[error("ledger header is missing the '{0}' column")]
    MissingColumn(&'static str),

    #[error("malformed ledger row at line {line}: {source}")]
    MalformedRow { line: u64, source: csv::Error },

    #[error("ledger store failed: {0}")]
    Store(#[from] StoreError),
}

impl TrackerError {
    /// Errors a user can fix by changing the input of a single command.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TrackerError::DuplicateAccount(_)
                | TrackerError::UnknownAccount(_)
                | TrackerError::InvalidAccount(_)
        )
    }
}

/// Failure talking to the backing store. Nothing is retried.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

use crate::journal_entry::EntryId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("entry not found: {0}")]
    NotFound(EntryId),

    #[error("failed to save journal: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("{0}")]
    Validation(String),
}

pub type JournalResult<T> = std::result::Result<T, JournalError>;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Malformed input. Nothing was written.
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Reminder not found: {0}")]
    NotFound(i64),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Corrupt row {id}: {reason}")]
    Corrupt { id: i64, reason: String },

    #[error("DB lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

use thiserror::Error;

/// Failures surfaced by the ledger engine.
///
/// Every variant is recoverable: callers show the message and let the user
/// re-submit. Nothing in the engine retries on its own.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Malformed or missing input (non-positive amount, empty field, bad date).
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("{kind} entry {id} not found")]
    NotFound { kind: &'static str, id: i64 },

    /// Search requested on a field the kind does not expose.
    #[error("field `{field}` is not searchable for {kind} (expected one of: {expected})")]
    InvalidField {
        kind: &'static str,
        field: String,
        expected: String,
    },

    /// Persistence backend unavailable or a write failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        LedgerError::Validation(message.into())
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, LedgerError::Storage(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::NotFound { .. })
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(err: rusqlite::Error) -> Self {
        LedgerError::Storage(err.to_string())
    }
}

impl From<csv::Error> for LedgerError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            LedgerError::Storage(err.to_string())
        } else {
            LedgerError::Validation(format!("malformed CSV: {}", err))
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;

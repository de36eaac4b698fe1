use thiserror::Error;

/// Errors raised while retrieving the memory-pool report
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to reach {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("Request to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to read report file {path}: {reason}")]
    Io { path: String, reason: String },
}

/// Errors for a single `kid` row that cannot be turned into a record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("Expected at least 3 fields, found {found}")]
    TooFewFields { found: usize },

    #[error("Invalid value '{value}': {reason}")]
    InvalidValue { value: String, reason: String },
}

impl RecordError {
    /// Label value used by the malformed-lines counter
    pub fn reason_label(&self) -> &'static str {
        match self {
            Self::TooFewFields { .. } => "too_few_fields",
            Self::InvalidValue { .. } => "invalid_value",
        }
    }
}

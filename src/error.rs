// Error types for loading and apportioning

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApportionError>;

#[derive(Debug, Error)]
pub enum ApportionError {
    /// A record is missing a required field or carries an unparseable value
    #[error("malformed input at line {line}: {reason}")]
    MalformedInput { line: u64, reason: String },

    /// The same entity name appears on more than one record
    #[error("duplicate entity: {0}")]
    DuplicateEntity(String),

    #[error("registry has no entities")]
    EmptyRegistry,

    /// Seats are never taken back, so the target can't be below the seats
    /// already held (one per entity before the first run)
    #[error("target of {target} seats is below the {minimum} seats already held")]
    InvalidTarget { target: u32, minimum: u64 },

    #[error("delimiter {0:?} is not a single ASCII character")]
    InvalidDelimiter(char),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ApportionError {
    pub(crate) fn malformed(line: u64, reason: impl Into<String>) -> Self {
        ApportionError::MalformedInput {
            line,
            reason: reason.into(),
        }
    }
}

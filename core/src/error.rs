use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid config: {field} {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("Identifier space exhausted for prefix '{prefix}' ({width} digits)")]
    IdSpaceExhausted { prefix: &'static str, width: usize },

    #[error("Dangling reference: {entity} '{key}' points at missing {target}")]
    DanglingReference {
        entity: &'static str,
        key: String,
        target: &'static str,
    },

    #[error("Foreign key check failed with {violations} violating rows")]
    IntegrityViolation { violations: usize },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    pub(crate) fn config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

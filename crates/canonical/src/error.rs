use thiserror::Error;

use crate::role::Role;

/// Errors that can occur during normalization.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CanonicalError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("no grammar registered for language tag `{0}`")]
    UnsupportedLanguage(String),
    #[error("failed to parse {language} source: {reason}")]
    ParseFailure { language: String, reason: String },
    #[error("source of {bytes} bytes exceeds limit of {limit}")]
    InputTooLarge { bytes: usize, limit: usize },
    #[error("failed to load {language} grammar: {message}")]
    Grammar { language: String, message: String },
    #[error("invalid {language} query for role {role:?}: {message}")]
    Query {
        language: String,
        role: Role,
        message: String,
    },
}

impl CanonicalError {
    /// Whether the failure is confined to one source unit.
    ///
    /// Unit failures are recorded and skipped by callers; anything else is a
    /// configuration problem that affects every unit.
    pub fn is_unit_failure(&self) -> bool {
        !matches!(
            self,
            CanonicalError::InvalidConfig(_)
                | CanonicalError::Grammar { .. }
                | CanonicalError::Query { .. }
        )
    }
}

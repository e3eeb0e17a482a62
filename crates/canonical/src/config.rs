//! Configuration types for the code normalizer.
//!
//! [`NormalizerConfig`] controls which grammars are active and the resource
//! bounds applied to each parse.
//!
//! # Versioning
//!
//! The `version` field tracks the canonical form. Any change that alters the
//! rewritten text for some input (new query patterns, different placeholder
//! numbering) must bump the version so stored fingerprints built from the old
//! form are not compared against the new one.
//!
//! # Examples
//!
//! ```rust
//! use canonical::{Language, NormalizerConfig};
//!
//! let config = NormalizerConfig::default();
//! assert_eq!(config.version, 1);
//! assert!(config.is_enabled(Language::Python));
//!
//! let python_only = NormalizerConfig::default().with_languages([Language::Python]);
//! assert!(!python_only.is_enabled(Language::Rust));
//! ```

use serde::{Deserialize, Serialize};

use crate::error::CanonicalError;
use crate::languages::Language;

/// Configuration for the code normalizer.
///
/// # Serialization
///
/// ```json
/// {
///   "version": 1,
///   "languages": ["python", "javascript", "rust"],
///   "max_source_bytes": 1048576,
///   "parse_timeout_micros": 2000000
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizerConfig {
    /// Version of the canonical form. Must be >= 1.
    pub version: u32,

    /// Grammars the normalizer will accept. Requests for any other language
    /// fail with [`CanonicalError::UnsupportedLanguage`].
    ///
    /// An empty list is a configuration error: a normalizer with no grammar
    /// cannot do anything useful and is rejected up front.
    pub languages: Vec<Language>,

    /// Largest source fragment accepted, in bytes.
    pub max_source_bytes: usize,

    /// Parser timeout in microseconds. `0` disables the timeout.
    pub parse_timeout_micros: u64,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            version: 1,
            languages: Language::ALL.to_vec(),
            max_source_bytes: 1024 * 1024,
            parse_timeout_micros: 2_000_000,
        }
    }
}

impl NormalizerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn with_languages(mut self, languages: impl IntoIterator<Item = Language>) -> Self {
        self.languages = languages.into_iter().collect();
        self
    }

    pub fn with_max_source_bytes(mut self, max_source_bytes: usize) -> Self {
        self.max_source_bytes = max_source_bytes;
        self
    }

    pub fn with_parse_timeout_micros(mut self, micros: u64) -> Self {
        self.parse_timeout_micros = micros;
        self
    }

    pub fn is_enabled(&self, language: Language) -> bool {
        self.languages.contains(&language)
    }

    pub fn validate(&self) -> Result<(), CanonicalError> {
        if self.version == 0 {
            return Err(CanonicalError::InvalidConfig(
                "version must be >= 1".into(),
            ));
        }
        if self.languages.is_empty() {
            return Err(CanonicalError::InvalidConfig(
                "at least one language grammar must be enabled".into(),
            ));
        }
        if self.max_source_bytes == 0 {
            return Err(CanonicalError::InvalidConfig(
                "max_source_bytes must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

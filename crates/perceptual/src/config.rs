//! Configuration and error types for winnowing fingerprints.
//!
//! This module defines the public configuration surface for the fingerprint
//! layer. It is free of any I/O or environment-dependent behavior so that
//! fingerprinting stays a pure function of `(text, config)`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Parameters that determine fingerprint values.
///
/// Every code fingerprint blob is tagged with the params that produced it.
/// Two fingerprints are only comparable when their params are equal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct FingerprintParams {
    /// Algorithm/config schema version.
    pub version: u32,
    /// k-gram length in characters.
    pub k: usize,
    /// Winnowing window width in k-grams.
    pub w: usize,
    /// Seed passed to XXH3-128.
    pub seed: u64,
    /// Whether whitespace was removed before k-gramming.
    pub ignore_whitespace: bool,
}

/// Runtime configuration for the winnowing fingerprinter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerceptualConfig {
    /// Configuration schema version.
    ///
    /// Any algorithmic change that can affect the fingerprint must bump this
    /// version, so that old fingerprints remain identifiable.
    pub version: u32,
    /// Number of characters per k-gram.
    ///
    /// Larger values are more selective, smaller values match shorter
    /// shared fragments.
    pub k: usize,
    /// Window size for winnowing.
    ///
    /// Any shared substring of at least `w + k - 1` characters is guaranteed
    /// to contribute a shared fingerprint value.
    pub w: usize,
    /// Seed for the k-gram hash.
    pub seed: u64,
    /// Strip all whitespace before k-gramming.
    pub ignore_whitespace: bool,
    /// Upper bound on input length in characters. `0` disables the bound.
    pub max_input_chars: usize,
    /// Fingerprint independent units on the rayon pool in
    /// [`crate::fingerprint_batch`].
    pub use_parallel: bool,
}

impl PerceptualConfig {
    /// Create a new configuration with the documented defaults (`k = 5`, `w = 4`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the schema version stamped on produced fingerprints.
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Set the k-gram length.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Set the winnowing window size.
    pub fn with_w(mut self, w: usize) -> Self {
        self.w = w;
        self
    }

    /// Set the hash seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Keep or strip whitespace before hashing.
    pub fn with_ignore_whitespace(mut self, ignore_whitespace: bool) -> Self {
        self.ignore_whitespace = ignore_whitespace;
        self
    }

    /// Set the maximum accepted input length in characters.
    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars;
        self
    }

    /// Enable or disable parallel batch fingerprinting.
    pub fn with_parallel(mut self, use_parallel: bool) -> Self {
        self.use_parallel = use_parallel;
        self
    }

    /// The parameter tag for fingerprints produced with this config.
    pub fn params(&self) -> FingerprintParams {
        FingerprintParams {
            version: self.version,
            k: self.k,
            w: self.w,
            seed: self.seed,
            ignore_whitespace: self.ignore_whitespace,
        }
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), PerceptualError> {
        if self.version < 1 {
            return Err(PerceptualError::InvalidConfigVersion {
                version: self.version,
            });
        }
        if self.k < 1 {
            return Err(PerceptualError::InvalidConfigK { k: self.k });
        }
        if self.w < 1 {
            return Err(PerceptualError::InvalidConfigW { w: self.w });
        }
        Ok(())
    }
}

impl Default for PerceptualConfig {
    fn default() -> Self {
        Self {
            version: 1,
            k: 5,
            w: 4,
            seed: 0,
            ignore_whitespace: true,
            max_input_chars: 1_000_000,
            use_parallel: false,
        }
    }
}

/// Errors returned by the fingerprinting pipeline.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PerceptualError {
    #[error("invalid config: k must be >= 1 (got {k})")]
    InvalidConfigK { k: usize },

    #[error("invalid config: w must be >= 1 (got {w})")]
    InvalidConfigW { w: usize },

    #[error("invalid config version {version}; expected >= 1")]
    InvalidConfigVersion { version: u32 },

    #[error("input of {chars} chars exceeds limit of {limit}")]
    InputTooLarge { chars: usize, limit: usize },
}

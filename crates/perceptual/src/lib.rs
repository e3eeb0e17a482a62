//! # Winnowing fingerprints
//!
//! This crate turns a text (usually canonical source code produced by the
//! `canonical` crate) into a compact set of 128-bit fingerprint values that
//! preserves shared substrings between documents.
//!
//! ## Contract
//!
//! - The API is a pure function of `(text, config)` with no I/O, no network,
//!   and no reliance on clocks or global process state.
//! - For the same text and the same [`PerceptualConfig`], the output is bit
//!   identical.
//!
//! ## Core Pipeline
//!
//! 1.  **Preprocessing**: with `ignore_whitespace` set (the default) every
//!     whitespace character is dropped, so re-indented code fingerprints the
//!     same.
//!
//! 2.  **k-gram hashing**: every run of `k` consecutive characters is hashed
//!     with XXH3-128. Uniformity matters for selection quality; cryptographic
//!     strength does not.
//!
//! 3.  **Winnowing**: a window of `w` consecutive hashes slides over the
//!     sequence and the minimum of each window (rightmost on ties) is kept,
//!     each position once. Any shared substring of at least `w + k - 1`
//!     characters yields at least one shared value, while the fingerprint
//!     stays near `len / w` values.
//!
//! ## Example Usage
//!
//! ```
//! use perceptual::{fingerprint, PerceptualConfig};
//!
//! let cfg = PerceptualConfig::default();
//! let fp = fingerprint("def _FUNCTION_0(_VARIABLE_0): return _VARIABLE_0", &cfg).unwrap();
//! assert!(!fp.is_empty());
//! ```
pub mod config;
pub mod fingerprint;
mod shingles;

use rayon::prelude::*;
use tracing::debug;

pub use crate::config::{FingerprintParams, PerceptualConfig, PerceptualError};
pub use crate::fingerprint::{CodeFingerprint, WinnowedKgram};
pub use crate::shingles::{kgram_hashes, winnow};

/// Current fingerprint algorithm version for this crate.
pub const PERCEPTUAL_VERSION: u16 = 1;

/// Human-readable algorithm identifier.
pub const PERCEPTUAL_ALGORITHM: &str = "xxh3_128_kgram_winnow_v1";

/// Drop every whitespace character from `text`.
pub fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Compute the winnowed k-gram selection for `text` with the given params.
///
/// This is the exact algorithm without preprocessing or limits: `text` is
/// k-grammed as given.
pub fn winnow_text(text: &str, k: usize, w: usize, seed: u64) -> Vec<WinnowedKgram> {
    let hashes = kgram_hashes(text, k, seed);
    winnow(&hashes, w)
}

/// Fingerprint a text with the configured preprocessing and parameters.
pub fn fingerprint(text: &str, cfg: &PerceptualConfig) -> Result<CodeFingerprint, PerceptualError> {
    cfg.validate()?;

    if cfg.max_input_chars > 0 {
        let chars = text.chars().count();
        if chars > cfg.max_input_chars {
            return Err(PerceptualError::InputTooLarge {
                chars,
                limit: cfg.max_input_chars,
            });
        }
    }

    let selected = if cfg.ignore_whitespace {
        winnow_text(&strip_whitespace(text), cfg.k, cfg.w, cfg.seed)
    } else {
        winnow_text(text, cfg.k, cfg.w, cfg.seed)
    };

    let fp: CodeFingerprint = selected.iter().map(|s| s.hash).collect();
    debug!(
        selected = selected.len(),
        distinct = fp.len(),
        k = cfg.k,
        w = cfg.w,
        "winnowed text"
    );
    Ok(fp)
}

/// Fingerprint many independent units.
///
/// Results keep the input order. With `use_parallel` the units are spread
/// over the rayon pool; each unit succeeds or fails on its own.
pub fn fingerprint_batch<S>(
    texts: &[S],
    cfg: &PerceptualConfig,
) -> Result<Vec<Result<CodeFingerprint, PerceptualError>>, PerceptualError>
where
    S: AsRef<str> + Sync,
{
    // Config problems are fatal for the whole batch, not per unit.
    cfg.validate()?;

    let out = if cfg.use_parallel {
        texts
            .par_iter()
            .map(|t| fingerprint(t.as_ref(), cfg))
            .collect()
    } else {
        texts.iter().map(|t| fingerprint(t.as_ref(), cfg)).collect()
    };
    Ok(out)
}

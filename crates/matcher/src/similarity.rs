//! Pairwise similarity measures and their mapping to originality scores.
//!
//! Every score is on `[0, 100]`, rounded to one decimal, where `100` means
//! no detected overlap and `0` means identical.

use index::HashBits;
use perceptual::CodeFingerprint;
use serde::{Deserialize, Serialize};

use crate::types::MatchError;

/// Jaccard index `|A ∩ B| / |A ∪ B|`.
///
/// `None` when both sets are empty: there is nothing to compare and the pair
/// is left out of the report.
pub fn jaccard(a: &CodeFingerprint, b: &CodeFingerprint) -> Option<f64> {
    let union = a.union_len(b);
    if union == 0 {
        return None;
    }
    Some(a.intersection_len(b) as f64 / union as f64)
}

/// Fraction of `a` found in `b`, `|A ∩ B| / |A|`. Not symmetric.
pub fn containment(a: &CodeFingerprint, b: &CodeFingerprint) -> Option<f64> {
    if a.is_empty() {
        return None;
    }
    Some(a.intersection_len(b) as f64 / a.len() as f64)
}

/// Originality score for a Jaccard value.
pub fn code_score(jaccard: f64) -> f64 {
    let j = if jaccard.is_nan() {
        0.0
    } else {
        jaccard.clamp(0.0, 1.0)
    };
    round_score((1.0 - j) * 100.0)
}

/// Number of differing bits, `None` for hashes of different widths.
pub fn hamming_distance(a: &HashBits, b: &HashBits) -> Option<u32> {
    a.hamming(b)
}

fn round_score(value: f64) -> f64 {
    ((value * 10.0).round() / 10.0).clamp(0.0, 100.0)
}

/// Maps a Hamming distance between fixed-width hashes to a score.
///
/// Distances at or above `saturation` score `100`; for unrelated hashes the
/// expected distance is half the width, so that is the default saturation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashScoring {
    pub bits: u32,
    pub saturation: u32,
}

impl Default for HashScoring {
    fn default() -> Self {
        Self {
            bits: 64,
            saturation: 32,
        }
    }
}

impl HashScoring {
    pub fn new(bits: u32, saturation: u32) -> Self {
        Self { bits, saturation }
    }

    pub fn with_saturation(mut self, saturation: u32) -> Self {
        self.saturation = saturation;
        self
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        if self.bits == 0 || self.bits % 8 != 0 {
            return Err(MatchError::InvalidConfig(format!(
                "hash width must be a positive multiple of 8, got {}",
                self.bits
            )));
        }
        if self.saturation == 0 || self.saturation > self.bits {
            return Err(MatchError::InvalidConfig(format!(
                "saturation must be in 1..={}, got {}",
                self.bits, self.saturation
            )));
        }
        Ok(())
    }

    pub fn score(&self, distance: u32) -> f64 {
        let saturation = self.saturation.max(1);
        let d = distance.min(saturation) as f64;
        round_score(d / saturation as f64 * 100.0)
    }
}

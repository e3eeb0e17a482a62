//! Fixed-width hashers for the text and image modalities.
//!
//! The report only ever compares these hashes by Hamming distance, so a
//! hasher is an opaque function from bytes to a hash of documented width.

use index::{FingerprintScheme, HashBits};
use xxhash_rust::xxh3::xxh3_64_with_seed;

/// Opaque fixed-width hash function for prose or image bytes.
pub trait ExternalHasher: Send + Sync {
    /// Algorithm tag stored in the blob scheme. Hashes from hashers with
    /// different names are never compared.
    fn name(&self) -> &str;

    /// Width of every hash this hasher produces.
    fn bits(&self) -> u32;

    fn hash(&self, bytes: &[u8]) -> HashBits;

    fn scheme(&self) -> FingerprintScheme {
        FingerprintScheme::Hash {
            algorithm: self.name().to_string(),
            bits: self.bits(),
        }
    }
}

/// 64-bit SimHash over word shingles.
///
/// Words are lowercased and stripped of surrounding punctuation, every run of
/// `shingle_size` consecutive words is hashed with XXH3-64, and each feature
/// votes on every bit with weight one. Near-identical prose lands a few bits
/// apart; unrelated prose lands around 32 bits apart.
#[derive(Debug, Clone)]
pub struct SimHasher {
    shingle_size: usize,
    seed: u64,
    name: String,
}

impl SimHasher {
    pub const BITS: u32 = 64;
    pub const DEFAULT_SHINGLE_SIZE: usize = 3;

    pub fn new(shingle_size: usize, seed: u64) -> Self {
        let shingle_size = shingle_size.max(1);
        Self {
            shingle_size,
            seed,
            name: format!("simhash64-w{shingle_size}-s{seed}"),
        }
    }

    pub fn shingle_size(&self) -> usize {
        self.shingle_size
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// SimHash of a text as a plain integer.
    pub fn hash_text(&self, text: &str) -> u64 {
        let words: Vec<String> = text
            .split_whitespace()
            .map(|word| {
                word.trim_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase()
            })
            .filter(|word| !word.is_empty())
            .collect();
        if words.is_empty() {
            return 0;
        }

        let mut acc = [0i64; 64];
        // Texts shorter than one shingle still get one feature.
        let span = self.shingle_size.min(words.len());
        for shingle in words.windows(span) {
            let feature = xxh3_64_with_seed(shingle.join(" ").as_bytes(), self.seed);
            for (bit, slot) in acc.iter_mut().enumerate() {
                if (feature >> bit) & 1 == 1 {
                    *slot += 1;
                } else {
                    *slot -= 1;
                }
            }
        }

        acc.iter()
            .enumerate()
            .filter(|(_, weight)| **weight > 0)
            .fold(0u64, |out, (bit, _)| out | (1u64 << bit))
    }
}

impl Default for SimHasher {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SHINGLE_SIZE, 0)
    }
}

impl ExternalHasher for SimHasher {
    fn name(&self) -> &str {
        &self.name
    }

    fn bits(&self) -> u32 {
        Self::BITS
    }

    fn hash(&self, bytes: &[u8]) -> HashBits {
        HashBits::from_u64(self.hash_text(&String::from_utf8_lossy(bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAGRAPH: &str = "The borrow checker rejects programs that alias mutable \
        state, which forces ownership to be explicit at every function boundary \
        and makes data races a compile time error rather than a runtime surprise.";

    #[test]
    fn identical_text_hashes_identically() {
        let hasher = SimHasher::default();
        assert_eq!(hasher.hash(PARAGRAPH.as_bytes()), hasher.hash(PARAGRAPH.as_bytes()));
        assert_eq!(hasher.hash(PARAGRAPH.as_bytes()).bits(), 64);
    }

    #[test]
    fn case_and_punctuation_are_ignored() {
        let hasher = SimHasher::default();
        let shouted = PARAGRAPH.to_uppercase().replace(',', " ;");
        assert_eq!(hasher.hash_text(PARAGRAPH), hasher.hash_text(&shouted));
    }

    #[test]
    fn small_edit_moves_few_bits() {
        let hasher = SimHasher::default();
        let edited = PARAGRAPH.replace("surprise", "failure");
        let a = hasher.hash(PARAGRAPH.as_bytes());
        let b = hasher.hash(edited.as_bytes());
        let distance = a.hamming(&b).unwrap();
        assert!(distance < 20, "distance {distance}");
    }

    #[test]
    fn empty_and_short_texts() {
        let hasher = SimHasher::default();
        assert_eq!(hasher.hash_text(""), 0);
        assert_eq!(hasher.hash_text("  ...  "), 0);
        // One word still forms a feature.
        assert_eq!(
            hasher.hash_text("ownership"),
            xxh3_64_with_seed(b"ownership", 0)
        );
    }

    #[test]
    fn parameters_are_part_of_the_scheme() {
        let a = SimHasher::default();
        let b = SimHasher::new(4, 0);
        assert_ne!(a.name(), b.name());
        assert!(!a.scheme().compatible_with(&b.scheme()));
        assert!(a.scheme().compatible_with(&SimHasher::new(3, 0).scheme()));
    }
}

//! Fingerprint types for the winnowing layer.
//!
//! The fingerprint schema is part of the public contract: any incompatible
//! change must come with a new [`crate::config::FingerprintParams::version`].

use std::collections::BTreeSet;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Selected k-gram hash with its originating position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WinnowedKgram {
    /// XXH3-128 hash of the k-gram.
    pub hash: u128,
    /// Character offset of the k-gram in the hashed text.
    pub position: usize,
}

/// A code fingerprint: the set of winnowed k-gram hashes.
///
/// Values have no meaningful order; the set is kept sorted only so that
/// serialization and iteration are reproducible. Serialized as a list of
/// 32-digit lowercase hex strings so 128-bit values survive JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeFingerprint {
    values: BTreeSet<u128>,
}

impl CodeFingerprint {
    /// Build a fingerprint from already selected hash values.
    pub fn from_values<I: IntoIterator<Item = u128>>(values: I) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, value: u128) -> bool {
        self.values.contains(&value)
    }

    pub fn iter(&self) -> impl Iterator<Item = u128> + '_ {
        self.values.iter().copied()
    }

    /// Number of values present in both fingerprints.
    pub fn intersection_len(&self, other: &CodeFingerprint) -> usize {
        // Walk the smaller set and probe the larger one.
        let (small, large) = if self.len() <= other.len() {
            (&self.values, &other.values)
        } else {
            (&other.values, &self.values)
        };
        small.iter().filter(|v| large.contains(v)).count()
    }

    /// Number of distinct values present in either fingerprint.
    pub fn union_len(&self, other: &CodeFingerprint) -> usize {
        self.len() + other.len() - self.intersection_len(other)
    }
}

impl FromIterator<u128> for CodeFingerprint {
    fn from_iter<T: IntoIterator<Item = u128>>(iter: T) -> Self {
        Self::from_values(iter)
    }
}

impl Serialize for CodeFingerprint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.values.iter().map(|v| format!("{v:032x}")))
    }
}

impl<'de> Deserialize<'de> for CodeFingerprint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Vec::<String>::deserialize(deserializer)?;
        let values = raw
            .iter()
            .map(|hex| u128::from_str_radix(hex, 16).map_err(DeError::custom))
            .collect::<Result<BTreeSet<u128>, D::Error>>()?;
        Ok(Self { values })
    }
}

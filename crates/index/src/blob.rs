//! Fingerprint blobs: the unit of storage and comparison.

use std::fmt;

use perceptual::{CodeFingerprint, FingerprintParams};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::IndexError;

/// Content modality of a blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Code,
    Image,
}

impl Modality {
    pub const ALL: [Modality; 3] = [Modality::Text, Modality::Code, Modality::Image];

    pub fn as_str(self) -> &'static str {
        match self {
            Modality::Text => "text",
            Modality::Code => "code",
            Modality::Image => "image",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed-width bit string produced by a text or image hasher.
///
/// Serialized as lowercase hex. The width is always a whole number of bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HashBits(Vec<u8>);

impl HashBits {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Big-endian encoding of a 64-bit hash.
    pub fn from_u64(value: u64) -> Self {
        Self(value.to_be_bytes().to_vec())
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, IndexError> {
        hex::decode(hex_str.trim())
            .map(Self)
            .map_err(|err| IndexError::InvalidHex(format!("{hex_str}: {err}")))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn bits(&self) -> u32 {
        (self.0.len() * 8) as u32
    }

    /// Number of differing bits, or `None` when the widths differ.
    pub fn hamming(&self, other: &HashBits) -> Option<u32> {
        if self.0.len() != other.0.len() {
            return None;
        }
        Some(
            self.0
                .iter()
                .zip(&other.0)
                .map(|(a, b)| (a ^ b).count_ones())
                .sum(),
        )
    }
}

impl Serialize for HashBits {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for HashBits {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        HashBits::from_hex(&raw).map_err(serde::de::Error::custom)
    }
}

/// Fingerprint of a single content unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitFingerprint {
    /// Winnowed set of a normalized code fragment, tagged with its language.
    Code {
        language: String,
        fingerprint: CodeFingerprint,
    },
    /// Fixed-width hash of a prose chapter or image.
    Hash(HashBits),
}

/// Parameters a blob was produced with. Blobs are only comparable when their
/// schemes are compatible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerprintScheme {
    Code {
        /// Version of the canonical form the fingerprinted text was in.
        canonical_version: u32,
        params: FingerprintParams,
    },
    Hash { algorithm: String, bits: u32 },
}

impl FingerprintScheme {
    pub fn code(canonical_version: u32, params: FingerprintParams) -> Self {
        FingerprintScheme::Code {
            canonical_version,
            params,
        }
    }

    pub fn compatible_with(&self, other: &FingerprintScheme) -> bool {
        match (self, other) {
            (
                FingerprintScheme::Code { canonical_version: v, params: a },
                FingerprintScheme::Code { canonical_version: u, params: b },
            ) => v == u && a == b,
            (
                FingerprintScheme::Hash { algorithm: a, bits: x },
                FingerprintScheme::Hash { algorithm: b, bits: y },
            ) => a == b && x == y,
            _ => false,
        }
    }
}

/// A content id and its fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobUnit {
    pub id: String,
    pub fingerprint: UnitFingerprint,
}

/// All fingerprints of one modality for one artifact.
///
/// Units keep the order they were added in; that order drives the order of
/// report records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintBlob {
    pub artifact_id: String,
    pub modality: Modality,
    pub scheme: FingerprintScheme,
    units: Vec<BlobUnit>,
}

impl FingerprintBlob {
    pub fn new(
        artifact_id: impl Into<String>,
        modality: Modality,
        scheme: FingerprintScheme,
    ) -> Self {
        Self {
            artifact_id: artifact_id.into(),
            modality,
            scheme,
            units: Vec::new(),
        }
    }

    /// Adds a unit. Content ids are unique within a blob.
    pub fn push(
        &mut self,
        id: impl Into<String>,
        fingerprint: UnitFingerprint,
    ) -> Result<(), IndexError> {
        let id = id.into();
        if self.units.iter().any(|unit| unit.id == id) {
            return Err(IndexError::DuplicateUnit {
                artifact_id: self.artifact_id.clone(),
                unit_id: id,
            });
        }
        self.units.push(BlobUnit { id, fingerprint });
        Ok(())
    }

    pub fn with_unit(
        mut self,
        id: impl Into<String>,
        fingerprint: UnitFingerprint,
    ) -> Result<Self, IndexError> {
        self.push(id, fingerprint)?;
        Ok(self)
    }

    pub fn units(&self) -> &[BlobUnit] {
        &self.units
    }

    pub fn get(&self, id: &str) -> Option<&UnitFingerprint> {
        self.units
            .iter()
            .find(|unit| unit.id == id)
            .map(|unit| &unit.fingerprint)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// SHA-256 hex of the blob's JSON encoding; used as its reference.
    pub fn digest(&self) -> Result<String, IndexError> {
        let encoded =
            serde_json::to_vec(self).map_err(|err| IndexError::Encode(err.to_string()))?;
        Ok(hex::encode(Sha256::digest(&encoded)))
    }
}

/// A unit that could not be fingerprinted during extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnavailableUnit {
    pub modality: Modality,
    pub unit_id: String,
    pub reason: String,
}

/// The three blobs extracted from one artifact plus the units that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactFingerprints {
    pub artifact_id: String,
    pub text: FingerprintBlob,
    pub code: FingerprintBlob,
    pub image: FingerprintBlob,
    #[serde(default)]
    pub unavailable: Vec<UnavailableUnit>,
}

impl ArtifactFingerprints {
    pub fn blob(&self, modality: Modality) -> &FingerprintBlob {
        match modality {
            Modality::Text => &self.text,
            Modality::Code => &self.code,
            Modality::Image => &self.image,
        }
    }
}

//! # Corpus index
//!
//! Storage-side types of the originality engine: fingerprint blobs and the
//! read-only index of archived artifacts a report is computed against.
//!
//! ## Core Features
//!
//! - **Fingerprint blobs**: [`FingerprintBlob`] groups the per-unit
//!   fingerprints of one modality for one artifact, tagged with the
//!   [`FingerprintScheme`] that produced them so incompatible blobs are never
//!   compared. Each blob has a stable SHA-256 [`digest`](FingerprintBlob::digest)
//!   that reports use as a reference.
//! - **Pluggable index**: the [`CorpusIndex`] trait abstracts where archived
//!   blobs live. [`InMemoryCorpus`] is a `HashMap`-backed implementation for
//!   tests, the CLI, and embedding in a larger service.
//! - **Snapshots**: [`CorpusSnapshot`] is a JSON form of a whole corpus.
//!
//! ## Example Usage
//!
//! ```
//! use index::{CorpusIndex, FingerprintBlob, FingerprintScheme, HashBits, InMemoryCorpus, Modality, UnitFingerprint};
//!
//! let corpus = InMemoryCorpus::new();
//! let scheme = FingerprintScheme::Hash { algorithm: "simhash64".into(), bits: 64 };
//! let blob = FingerprintBlob::new("book-1", Modality::Text, scheme)
//!     .with_unit("ch1", UnitFingerprint::Hash(HashBits::from_u64(42)))
//!     .unwrap();
//! corpus.insert("book-1", "First Book", blob).unwrap();
//!
//! assert_eq!(corpus.list(Modality::Text).unwrap(), vec!["book-1".to_string()]);
//! assert!(corpus.list(Modality::Code).unwrap().is_empty());
//! ```

mod backend;
mod blob;
mod snapshot;

use thiserror::Error;

pub use backend::{CorpusIndex, InMemoryCorpus};
pub use blob::{
    ArtifactFingerprints, BlobUnit, FingerprintBlob, FingerprintScheme, HashBits, Modality,
    UnavailableUnit, UnitFingerprint,
};
pub use snapshot::{CorpusSnapshot, SnapshotEntry, SNAPSHOT_VERSION};

/// Custom error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("Serialization encode error: {0}")]
    Encode(String),
    #[error("Serialization decode error: {0}")]
    Decode(String),
    #[error("invalid hex hash: {0}")]
    InvalidHex(String),
    #[error("unit `{unit_id}` already present in blob for `{artifact_id}`")]
    DuplicateUnit { artifact_id: String, unit_id: String },
    #[error("snapshot version {found} is not supported (expected {expected})")]
    SnapshotVersion { found: u32, expected: u32 },
}

impl IndexError {
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        Self::Backend(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perceptual::{CodeFingerprint, PerceptualConfig};

    fn text_blob(artifact: &str, units: &[(&str, u64)]) -> FingerprintBlob {
        let scheme = FingerprintScheme::Hash {
            algorithm: "simhash64".into(),
            bits: 64,
        };
        units
            .iter()
            .fold(FingerprintBlob::new(artifact, Modality::Text, scheme), |blob, (id, v)| {
                blob.with_unit(*id, UnitFingerprint::Hash(HashBits::from_u64(*v)))
                    .unwrap()
            })
    }

    fn fingerprints(artifact: &str) -> ArtifactFingerprints {
        let code_scheme = FingerprintScheme::code(1, PerceptualConfig::default().params());
        let image_scheme = FingerprintScheme::Hash {
            algorithm: "phash64".into(),
            bits: 64,
        };
        ArtifactFingerprints {
            artifact_id: artifact.into(),
            text: text_blob(artifact, &[("ch1", 7)]),
            code: FingerprintBlob::new(artifact, Modality::Code, code_scheme)
                .with_unit(
                    "ch1#code-0",
                    UnitFingerprint::Code {
                        language: "python".into(),
                        fingerprint: CodeFingerprint::from_values([1u128, 2, 3]),
                    },
                )
                .unwrap(),
            image: FingerprintBlob::new(artifact, Modality::Image, image_scheme),
            unavailable: Vec::new(),
        }
    }

    #[test]
    fn in_memory_corpus_roundtrip() {
        let corpus = InMemoryCorpus::new();
        corpus
            .insert("doc-a", "Doc A", text_blob("doc-a", &[("ch1", 1)]))
            .expect("insert succeeds");

        let fetched = corpus
            .get(Modality::Text, "doc-a")
            .expect("get ok")
            .expect("blob exists");
        assert_eq!(fetched.artifact_id, "doc-a");
        assert_eq!(corpus.title("doc-a").unwrap().as_deref(), Some("Doc A"));
        assert!(corpus.get(Modality::Code, "doc-a").unwrap().is_none());
        assert!(corpus.title("missing").unwrap().is_none());
    }

    #[test]
    fn list_is_sorted_and_per_modality() {
        let corpus = InMemoryCorpus::new();
        corpus.archive(&fingerprints("zeta"), "Zeta").unwrap();
        corpus.archive(&fingerprints("alpha"), "Alpha").unwrap();
        corpus
            .insert("mid", "Mid", text_blob("mid", &[("ch1", 3)]))
            .unwrap();

        assert_eq!(
            corpus.list(Modality::Text).unwrap(),
            vec!["alpha", "mid", "zeta"]
        );
        assert_eq!(corpus.list(Modality::Code).unwrap(), vec!["alpha", "zeta"]);

        assert!(corpus.remove("alpha").unwrap());
        assert!(!corpus.remove("alpha").unwrap());
        assert_eq!(corpus.len(), 2);
    }

    #[test]
    fn snapshot_roundtrip_through_json() {
        let corpus = InMemoryCorpus::new();
        corpus.archive(&fingerprints("b-1"), "Book One").unwrap();
        corpus.archive(&fingerprints("b-2"), "Book Two").unwrap();

        let json = corpus.snapshot().unwrap().to_json().unwrap();
        let restored = InMemoryCorpus::from_snapshot(CorpusSnapshot::from_json(&json).unwrap())
            .expect("restore");

        assert_eq!(restored.len(), 2);
        assert_eq!(
            restored.get(Modality::Code, "b-2").unwrap(),
            corpus.get(Modality::Code, "b-2").unwrap()
        );
        assert_eq!(restored.snapshot().unwrap(), corpus.snapshot().unwrap());
    }

    #[test]
    fn snapshot_file_roundtrip() {
        use std::io::Write;

        let corpus = InMemoryCorpus::new();
        corpus.archive(&fingerprints("b-1"), "Book One").unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(corpus.snapshot().unwrap().to_json().unwrap().as_bytes())
            .unwrap();
        let raw = std::fs::read_to_string(file.path()).unwrap();
        let snapshot = CorpusSnapshot::from_json(&raw).unwrap();
        assert_eq!(snapshot.artifacts[0].title, "Book One");
        assert_eq!(snapshot.artifacts[0].blobs.len(), 3);
    }

    #[test]
    fn snapshot_rejects_duplicates_and_unknown_versions() {
        let entry = SnapshotEntry {
            id: "x".into(),
            title: String::new(),
            blobs: Vec::new(),
        };
        let dup = CorpusSnapshot {
            version: SNAPSHOT_VERSION,
            artifacts: vec![entry.clone(), entry.clone()],
        };
        assert!(matches!(dup.validate(), Err(IndexError::Decode(_))));

        let future = CorpusSnapshot {
            version: 99,
            artifacts: vec![entry],
        };
        assert_eq!(
            future.validate(),
            Err(IndexError::SnapshotVersion {
                found: 99,
                expected: SNAPSHOT_VERSION
            })
        );
    }
}

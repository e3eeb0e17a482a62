//! # Originality matcher (`matcher`)
//!
//! ## Purpose
//!
//! `matcher` compares the fingerprints of a newly authored artifact against
//! every archived artifact of a [`CorpusIndex`](index::CorpusIndex) and
//! condenses the result into a [`Checkreport`].
//!
//! ## Core Types
//!
//! - [`similarity`]: the pairwise measures. Code units use the Jaccard index
//!   of their winnowed sets, text and image units use the Hamming distance of
//!   fixed-width hashes. Both map onto a score in `[0, 100]` where higher
//!   means more original.
//! - [`ReportConfig`]: scoring of the hash modalities ([`HashScoring`]) and
//!   whether the corpus scan runs on the rayon pool.
//! - [`SimilarityRecord`]: one scored pair of units.
//! - [`Checkreport`]: per-modality record lists, the minimum score of each
//!   modality (`100.0` when nothing was comparable), digests of every blob
//!   involved, and the [`ReportWarning`]s for whatever had to be skipped.
//!
//! ## Example Usage
//!
//! ```
//! use index::{ArtifactFingerprints, FingerprintBlob, FingerprintScheme, HashBits, InMemoryCorpus, Modality, UnitFingerprint};
//! use matcher::{generate_report, ReportConfig};
//! use perceptual::PerceptualConfig;
//!
//! let blob = |id: &str, modality, scheme| FingerprintBlob::new(id, modality, scheme);
//! let text = FingerprintScheme::Hash { algorithm: "simhash64".into(), bits: 64 };
//! let image = FingerprintScheme::Hash { algorithm: "phash64".into(), bits: 64 };
//! let code = FingerprintScheme::code(1, PerceptualConfig::default().params());
//!
//! let new = ArtifactFingerprints {
//!     artifact_id: "draft".into(),
//!     text: blob("draft", Modality::Text, text)
//!         .with_unit("ch1", UnitFingerprint::Hash(HashBits::from_u64(7)))
//!         .unwrap(),
//!     code: blob("draft", Modality::Code, code),
//!     image: blob("draft", Modality::Image, image),
//!     unavailable: Vec::new(),
//! };
//!
//! let report = generate_report(&new, &InMemoryCorpus::new(), &ReportConfig::default()).unwrap();
//! assert_eq!(report.text_score, 100.0);
//! assert!(report.is_complete());
//! ```
//!
//! ## Observability
//!
//! Install a [`ReportMetrics`] implementation via [`set_report_metrics`] to
//! record per-report latency, record counts and warning counts. This is
//! typically done once during service startup.

pub mod engine;
pub mod metrics;
pub mod similarity;
pub mod types;

pub use crate::engine::{aggregate, generate_report};
pub use crate::metrics::{set_report_metrics, ReportMetrics};
pub use crate::similarity::{code_score, containment, hamming_distance, jaccard, HashScoring};
pub use crate::types::{
    BlobReference, Checkreport, MatchError, ReportConfig, ReportWarning, SimilarityMeasure,
    SimilarityRecord, NO_OVERLAP_SCORE,
};

use index::{IndexError, Modality};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::similarity::HashScoring;

/// Score given to a modality with nothing to compare against.
pub const NO_OVERLAP_SCORE: f64 = 100.0;

/// How two units were compared.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "metric", rename_all = "lowercase")]
pub enum SimilarityMeasure {
    /// Jaccard index of two code fingerprints, with the containment of the
    /// new unit in the archived one for diagnostics.
    Jaccard { value: f64, containment: f64 },
    /// Hamming distance of two fixed-width hashes.
    Hamming { distance: u32, bits: u32 },
}

/// Result of comparing one new unit against one archived unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimilarityRecord {
    pub origin_artifact_id: String,
    pub compared_artifact_id: String,
    pub compared_title: String,
    pub origin_content_id: String,
    pub compared_content_id: String,
    pub measure: SimilarityMeasure,
    /// Originality score in `[0, 100]`, higher is more original.
    pub score: f64,
}

/// Something the report could not compare. The scan carries on regardless.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportWarning {
    /// A listed corpus entry could not be read or disagrees with the request.
    IndexInconsistency {
        modality: Modality,
        artifact_id: String,
        reason: String,
    },
    /// The archived blob (or unit) was produced with parameters that make it
    /// incomparable to the new one.
    IncompatibleFingerprint {
        modality: Modality,
        artifact_id: String,
        reason: String,
    },
    /// The corpus could not be listed for a whole modality.
    IndexUnavailable { modality: Modality, reason: String },
    /// A unit of the new artifact was never fingerprinted.
    UnitUnavailable {
        modality: Modality,
        unit_id: String,
        reason: String,
    },
}

/// Which blob a report was computed from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlobReference {
    pub artifact_id: String,
    pub modality: Modality,
    /// SHA-256 hex digest of the blob.
    pub digest: String,
}

/// Comparative originality report for one new artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Checkreport {
    pub artifact_id: String,
    pub text_records: Vec<SimilarityRecord>,
    pub code_records: Vec<SimilarityRecord>,
    pub image_records: Vec<SimilarityRecord>,
    /// Minimum text record score, `100.0` when there are none.
    pub text_score: f64,
    pub code_score: f64,
    pub image_score: f64,
    /// The new artifact's blobs followed by every archived blob scanned.
    pub references: Vec<BlobReference>,
    #[serde(default)]
    pub warnings: Vec<ReportWarning>,
}

impl Checkreport {
    pub fn records(&self, modality: Modality) -> &[SimilarityRecord] {
        match modality {
            Modality::Text => &self.text_records,
            Modality::Code => &self.code_records,
            Modality::Image => &self.image_records,
        }
    }

    pub fn score(&self, modality: Modality) -> f64 {
        match modality {
            Modality::Text => self.text_score,
            Modality::Code => self.code_score,
            Modality::Image => self.image_score,
        }
    }

    /// `false` when anything was skipped, so a perfect score may be an
    /// artifact of missing data rather than genuine originality.
    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.text_records.len() + self.code_records.len() + self.image_records.len()
    }
}

/// Configuration for report generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportConfig {
    #[serde(default)]
    pub text: HashScoring,
    #[serde(default)]
    pub image: HashScoring,
    /// Scan corpus entries on the rayon pool.
    #[serde(default = "ReportConfig::default_use_parallel")]
    pub use_parallel: bool,
}

impl ReportConfig {
    pub(crate) fn default_use_parallel() -> bool {
        true
    }

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text_scoring(mut self, scoring: HashScoring) -> Self {
        self.text = scoring;
        self
    }

    pub fn with_image_scoring(mut self, scoring: HashScoring) -> Self {
        self.image = scoring;
        self
    }

    pub fn with_parallel(mut self, use_parallel: bool) -> Self {
        self.use_parallel = use_parallel;
        self
    }

    pub fn scoring(&self, modality: Modality) -> Option<&HashScoring> {
        match modality {
            Modality::Text => Some(&self.text),
            Modality::Image => Some(&self.image),
            Modality::Code => None,
        }
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        self.text.validate()?;
        self.image.validate()
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            text: HashScoring::default(),
            image: HashScoring::default(),
            use_parallel: Self::default_use_parallel(),
        }
    }
}

/// Errors produced by report generation.
///
/// Only configuration problems abort a report; everything else becomes a
/// [`ReportWarning`].
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("invalid report config: {0}")]
    InvalidConfig(String),
    #[error("index error: {0}")]
    Index(#[from] IndexError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = ReportConfig::default();
        assert!(cfg.validate().is_ok());
        assert!(cfg.use_parallel);
        assert_eq!(cfg.text, HashScoring::new(64, 32));
        assert!(cfg.scoring(Modality::Code).is_none());
    }

    #[test]
    fn invalid_saturation_rejected() {
        let cfg = ReportConfig::default().with_image_scoring(HashScoring::new(64, 0));
        let err = cfg.validate().expect_err("config should be invalid");
        match err {
            MatchError::InvalidConfig(msg) => assert!(msg.contains("saturation")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn config_fills_defaults_from_partial_json() {
        let cfg: ReportConfig = serde_json::from_str(r#"{"use_parallel": false}"#).unwrap();
        assert!(!cfg.use_parallel);
        assert_eq!(cfg.image, HashScoring::default());
    }

    #[test]
    fn warnings_serialize_with_kind_tag() {
        let warning = ReportWarning::IndexUnavailable {
            modality: Modality::Image,
            reason: "offline".into(),
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["kind"], "index_unavailable");
        assert_eq!(json["modality"], "image");
    }
}

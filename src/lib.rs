//! Workspace umbrella crate for the content originality engine.
//!
//! This crate stitches the stage crates together so callers can go from an
//! authored [`Artifact`] to a [`Checkreport`] with one configuration:
//!
//! 1. [`Extractor::extract`] normalizes and winnows every code unit, hashes
//!    chapter prose with a [`SimHasher`] and images with an
//!    [`ExternalHasher`], producing the artifact's three fingerprint blobs.
//! 2. [`generate_report`] compares those blobs against a [`CorpusIndex`].
//!
//! Units that cannot be fingerprinted (unknown language, oversized source,
//! missing image hasher, ...) never fail the artifact; they are listed in
//! [`ArtifactFingerprints::unavailable`] and surface as report warnings.

pub mod config;
pub mod hashers;
pub mod markdown;

pub use canonical::{
    CanonicalError, CanonicalText, Language, NormalizerConfig, Role, SourceUnit, normalize,
    normalize_detailed,
};
pub use index::{
    ArtifactFingerprints, CorpusIndex, CorpusSnapshot, FingerprintBlob, FingerprintScheme,
    HashBits, InMemoryCorpus, IndexError, Modality, UnavailableUnit, UnitFingerprint,
};
pub use matcher::{
    Checkreport, HashScoring, MatchError, ReportConfig, ReportWarning, SimilarityMeasure,
    SimilarityRecord, generate_report,
};
pub use perceptual::{CodeFingerprint, PerceptualConfig, PerceptualError, fingerprint};

pub use crate::config::{ConfigLoadError, OriginalityConfig};
pub use crate::hashers::{ExternalHasher, SimHasher};

use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that abort a pipeline call. Per-unit failures are not errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigLoadError),
    #[error("normalization failure: {0}")]
    Canonical(#[from] CanonicalError),
    #[error("fingerprinting failed: {0}")]
    Perceptual(#[from] PerceptualError),
    #[error("index failure: {0}")]
    Index(#[from] IndexError),
    #[error("report failure: {0}")]
    Match(#[from] MatchError),
}

/// An authored work submitted for an originality check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Prose chapters, optionally Markdown with fenced code.
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    /// Stand-alone code units.
    #[serde(default)]
    pub code_blocks: Vec<CodeBlock>,
    #[serde(default)]
    pub images: Vec<ImageUnit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    pub id: String,
    pub language: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUnit {
    pub id: String,
    pub source: ImageSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    /// Raw image bytes, hashed with the extractor's image hasher.
    Bytes(Vec<u8>),
    /// Hex hash computed upstream with the configured image algorithm.
    PrecomputedHash(String),
}

/// Metrics observer for fingerprint extraction.
pub trait PipelineMetrics: Send + Sync {
    /// `units` counts fingerprinted units over all modalities.
    fn record_extract(
        &self,
        artifact_id: &str,
        latency: Duration,
        units: usize,
        unavailable: usize,
    );
}

/// Install or clear the global pipeline metrics recorder.
pub fn set_pipeline_metrics(recorder: Option<Arc<dyn PipelineMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn PipelineMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn PipelineMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn PipelineMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

/// Turns artifacts into fingerprint blobs.
#[derive(Clone)]
pub struct Extractor {
    normalizer: NormalizerConfig,
    perceptual: PerceptualConfig,
    text_hasher: Arc<dyn ExternalHasher>,
    image_hasher: Option<Arc<dyn ExternalHasher>>,
    image_scheme: FingerprintScheme,
    extract_fenced_code: bool,
}

/// Why a code unit produced no fingerprint.
enum CodeUnitError {
    /// Recorded as an unavailable unit.
    Unit(String),
    /// Grammar or query fault shared by every unit of the language.
    Fatal(CanonicalError),
}

/// A code unit waiting to be fingerprinted.
struct PendingCode {
    id: String,
    language: Option<String>,
    source: String,
}

impl Extractor {
    /// Extractor with the given code configs, the default [`SimHasher`] for
    /// prose and no image hasher.
    pub fn new(
        normalizer: NormalizerConfig,
        perceptual: PerceptualConfig,
    ) -> Result<Self, PipelineError> {
        normalizer.validate()?;
        perceptual.validate()?;
        Ok(Self {
            normalizer,
            perceptual,
            text_hasher: Arc::new(SimHasher::default()),
            image_hasher: None,
            image_scheme: FingerprintScheme::Hash {
                algorithm: "phash64".to_string(),
                bits: 64,
            },
            extract_fenced_code: true,
        })
    }

    pub fn from_config(cfg: &OriginalityConfig) -> Result<Self, PipelineError> {
        cfg.validate()?;
        let extractor = Self::new(cfg.to_normalizer_config()?, cfg.to_perceptual_config())?
            .with_text_hasher(Arc::new(cfg.text_hasher()))
            .with_image_scheme(cfg.image.algorithm.clone(), cfg.image.bits)
            .with_fenced_code(cfg.text.extract_fenced_code);
        Ok(extractor)
    }

    pub fn with_text_hasher(mut self, hasher: Arc<dyn ExternalHasher>) -> Self {
        self.text_hasher = hasher;
        self
    }

    /// Hash byte images with `hasher`; its name and width become the image
    /// scheme.
    pub fn with_image_hasher(mut self, hasher: Arc<dyn ExternalHasher>) -> Self {
        self.image_scheme = hasher.scheme();
        self.image_hasher = Some(hasher);
        self
    }

    /// Scheme of precomputed image hashes when no image hasher is installed.
    pub fn with_image_scheme(mut self, algorithm: impl Into<String>, bits: u32) -> Self {
        if self.image_hasher.is_none() {
            self.image_scheme = FingerprintScheme::Hash {
                algorithm: algorithm.into(),
                bits,
            };
        }
        self
    }

    pub fn with_fenced_code(mut self, extract_fenced_code: bool) -> Self {
        self.extract_fenced_code = extract_fenced_code;
        self
    }

    /// Fingerprint every unit of `artifact`.
    ///
    /// Units are added to their blobs in artifact order: stand-alone code
    /// blocks first, then code lifted out of chapters.
    #[tracing::instrument(level = "debug", skip_all, fields(artifact_id = %artifact.id))]
    pub fn extract(&self, artifact: &Artifact) -> Result<ArtifactFingerprints, PipelineError> {
        let start = Instant::now();
        let mut unavailable = Vec::new();

        let mut text = FingerprintBlob::new(
            &artifact.id,
            Modality::Text,
            self.text_hasher.scheme(),
        );
        let mut code = FingerprintBlob::new(
            &artifact.id,
            Modality::Code,
            FingerprintScheme::code(self.normalizer.version, self.perceptual.params()),
        );
        let mut image =
            FingerprintBlob::new(&artifact.id, Modality::Image, self.image_scheme.clone());

        let mut pending: Vec<PendingCode> = artifact
            .code_blocks
            .iter()
            .map(|block| PendingCode {
                id: block.id.clone(),
                language: Some(block.language.clone()),
                source: block.source.clone(),
            })
            .collect();

        for chapter in &artifact.chapters {
            let prose = if self.extract_fenced_code {
                let split = markdown::split_chapter(&chapter.text);
                pending.extend(split.code_blocks.into_iter().enumerate().map(|(n, block)| {
                    PendingCode {
                        id: markdown::code_block_id(&chapter.id, n),
                        language: block.language,
                        source: block.code,
                    }
                }));
                split.prose
            } else {
                chapter.text.clone()
            };

            if prose.split_whitespace().next().is_none() {
                let reason = "chapter has no prose";
                unavailable.push(unit_unavailable(Modality::Text, &chapter.id, reason));
                continue;
            }
            let hash = self.text_hasher.hash(prose.as_bytes());
            add_unit(&mut text, &chapter.id, UnitFingerprint::Hash(hash), &mut unavailable);
        }

        let fingerprints: Vec<_> = if self.perceptual.use_parallel {
            pending.par_iter().map(|unit| self.code_unit(unit)).collect()
        } else {
            pending.iter().map(|unit| self.code_unit(unit)).collect()
        };
        for (unit, result) in pending.iter().zip(fingerprints) {
            match result {
                Ok(fp) => add_unit(&mut code, &unit.id, fp, &mut unavailable),
                Err(CodeUnitError::Fatal(err)) => return Err(err.into()),
                Err(CodeUnitError::Unit(reason)) => {
                    warn!(unit_id = %unit.id, %reason, "code unit unavailable");
                    unavailable.push(unit_unavailable(Modality::Code, &unit.id, &reason));
                }
            }
        }

        for unit in &artifact.images {
            match self.image_unit(unit) {
                Ok(hash) => {
                    add_unit(&mut image, &unit.id, UnitFingerprint::Hash(hash), &mut unavailable)
                }
                Err(reason) => {
                    warn!(unit_id = %unit.id, %reason, "image unit unavailable");
                    unavailable.push(unit_unavailable(Modality::Image, &unit.id, &reason));
                }
            }
        }

        let fingerprints = ArtifactFingerprints {
            artifact_id: artifact.id.clone(),
            text,
            code,
            image,
            unavailable,
        };

        let latency = start.elapsed();
        let units = fingerprints.text.len() + fingerprints.code.len() + fingerprints.image.len();
        info!(
            text_units = fingerprints.text.len(),
            code_units = fingerprints.code.len(),
            image_units = fingerprints.image.len(),
            unavailable = fingerprints.unavailable.len(),
            "extracted fingerprints"
        );
        if let Some(recorder) = metrics_recorder() {
            recorder.record_extract(&artifact.id, latency, units, fingerprints.unavailable.len());
        }
        Ok(fingerprints)
    }

    /// Normalize and winnow one code unit.
    fn code_unit(&self, unit: &PendingCode) -> Result<UnitFingerprint, CodeUnitError> {
        let tag = unit
            .language
            .as_deref()
            .ok_or_else(|| CodeUnitError::Unit("code block has no language tag".to_string()))?;
        // Store the canonical tag so `py` and `python` units compare.
        let language = Language::from_tag(tag)
            .map(|l| l.tag().to_string())
            .unwrap_or_else(|| tag.to_string());

        let canonical = normalize(&SourceUnit::new(unit.source.as_str(), tag), &self.normalizer)
            .map_err(|err| {
                if err.is_unit_failure() {
                    CodeUnitError::Unit(err.to_string())
                } else {
                    CodeUnitError::Fatal(err)
                }
            })?;
        let fingerprint = fingerprint(canonical.as_str(), &self.perceptual)
            .map_err(|err| CodeUnitError::Unit(err.to_string()))?;
        debug!(unit_id = %unit.id, %language, values = fingerprint.len(), "fingerprinted code");
        Ok(UnitFingerprint::Code {
            language,
            fingerprint,
        })
    }

    fn image_unit(&self, unit: &ImageUnit) -> Result<HashBits, String> {
        let hash = match (&unit.source, &self.image_hasher) {
            (ImageSource::PrecomputedHash(hex), _) => {
                HashBits::from_hex(hex).map_err(|err| err.to_string())?
            }
            (ImageSource::Bytes(bytes), Some(hasher)) => hasher.hash(bytes),
            (ImageSource::Bytes(_), None) => return Err("no image hasher configured".to_string()),
        };
        if let FingerprintScheme::Hash { bits, .. } = &self.image_scheme {
            if hash.bits() != *bits {
                return Err(format!("hash is {} bits, expected {bits}", hash.bits()));
            }
        }
        Ok(hash)
    }
}

fn unit_unavailable(modality: Modality, unit_id: &str, reason: &str) -> UnavailableUnit {
    UnavailableUnit {
        modality,
        unit_id: unit_id.to_string(),
        reason: reason.to_string(),
    }
}

fn add_unit(
    blob: &mut FingerprintBlob,
    unit_id: &str,
    fingerprint: UnitFingerprint,
    unavailable: &mut Vec<UnavailableUnit>,
) {
    if let Err(err) = blob.push(unit_id, fingerprint) {
        warn!(unit_id, error = %err, "dropping unit");
        unavailable.push(unit_unavailable(blob.modality, unit_id, &err.to_string()));
    }
}

/// Extract `artifact` and compare it against `corpus` in one call.
pub fn check_originality(
    artifact: &Artifact,
    corpus: &dyn CorpusIndex,
    extractor: &Extractor,
    report: &ReportConfig,
) -> Result<Checkreport, PipelineError> {
    let fingerprints = extractor.extract(artifact)?;
    Ok(generate_report(&fingerprints, corpus, report)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedHasher;

    impl ExternalHasher for FixedHasher {
        fn name(&self) -> &str {
            "fixed16"
        }

        fn bits(&self) -> u32 {
            16
        }

        fn hash(&self, bytes: &[u8]) -> HashBits {
            HashBits::from_bytes([bytes.len() as u8, 0xAB])
        }
    }

    fn extractor() -> Extractor {
        Extractor::new(NormalizerConfig::default(), PerceptualConfig::default()).unwrap()
    }

    fn chapter(id: &str, text: &str) -> Chapter {
        Chapter {
            id: id.into(),
            text: text.into(),
        }
    }

    #[test]
    fn markdown_code_becomes_code_units() {
        let artifact = Artifact {
            id: "a1".into(),
            chapters: vec![chapter(
                "ch1",
                "Intro to loops.\n\n```python\ntotal = 0\nfor item in items:\n    total += item\n```\n",
            )],
            ..Default::default()
        };

        let fps = extractor().extract(&artifact).unwrap();
        assert_eq!(fps.text.len(), 1);
        assert_eq!(fps.code.len(), 1);
        assert_eq!(fps.code.units()[0].id, "ch1#code-1");
        assert!(matches!(
            fps.code.get("ch1#code-1"),
            Some(UnitFingerprint::Code { language, .. }) if language == "python"
        ));
        assert!(fps.unavailable.is_empty());
    }

    #[test]
    fn fenced_code_stays_in_prose_when_disabled() {
        let artifact = Artifact {
            id: "a1".into(),
            chapters: vec![chapter("ch1", "Words.\n\n```python\nx = 1\n```\n")],
            ..Default::default()
        };

        let fps = extractor().with_fenced_code(false).extract(&artifact).unwrap();
        assert!(fps.code.is_empty());
        assert_eq!(fps.text.len(), 1);
    }

    #[test]
    fn language_aliases_share_a_tag() {
        let artifact = Artifact {
            id: "a1".into(),
            code_blocks: vec![CodeBlock {
                id: "c1".into(),
                language: "py".into(),
                source: "value = compute(seed)\n".into(),
            }],
            ..Default::default()
        };

        let fps = extractor().extract(&artifact).unwrap();
        assert!(matches!(
            fps.code.get("c1"),
            Some(UnitFingerprint::Code { language, .. }) if language == "python"
        ));
    }

    #[test]
    fn failing_units_are_listed_not_fatal() {
        let artifact = Artifact {
            id: "a1".into(),
            chapters: vec![chapter("empty", "```\nno language\n```\n")],
            code_blocks: vec![
                CodeBlock {
                    id: "cobol".into(),
                    language: "cobol".into(),
                    source: "DISPLAY 'HI'.".into(),
                },
                CodeBlock {
                    id: "ok".into(),
                    language: "rust".into(),
                    source: "fn main() { let answer = 42; }".into(),
                },
            ],
            images: vec![
                ImageUnit {
                    id: "raw".into(),
                    source: ImageSource::Bytes(vec![1, 2, 3]),
                },
                ImageUnit {
                    id: "bad-hex".into(),
                    source: ImageSource::PrecomputedHash("zz".into()),
                },
                ImageUnit {
                    id: "short".into(),
                    source: ImageSource::PrecomputedHash("ff00".into()),
                },
                ImageUnit {
                    id: "good".into(),
                    source: ImageSource::PrecomputedHash("00ff00ff00ff00ff".into()),
                },
            ],
            ..Default::default()
        };

        let fps = extractor().extract(&artifact).unwrap();
        let ids: Vec<(Modality, &str)> = fps
            .unavailable
            .iter()
            .map(|u| (u.modality, u.unit_id.as_str()))
            .collect();
        assert_eq!(
            ids,
            vec![
                (Modality::Text, "empty"),
                (Modality::Code, "cobol"),
                (Modality::Code, "empty#code-1"),
                (Modality::Image, "raw"),
                (Modality::Image, "bad-hex"),
                (Modality::Image, "short"),
            ]
        );
        assert_eq!(fps.code.len(), 1);
        assert_eq!(fps.image.len(), 1);
        assert!(fps.unavailable[5].reason.contains("16 bits, expected 64"));
    }

    #[test]
    fn image_hasher_sets_the_scheme() {
        let artifact = Artifact {
            id: "a1".into(),
            images: vec![ImageUnit {
                id: "fig1".into(),
                source: ImageSource::Bytes(vec![0; 5]),
            }],
            ..Default::default()
        };

        let fps = extractor()
            .with_image_hasher(Arc::new(FixedHasher))
            .with_image_scheme("ignored", 64)
            .extract(&artifact)
            .unwrap();
        assert_eq!(
            fps.image.scheme,
            FingerprintScheme::Hash {
                algorithm: "fixed16".into(),
                bits: 16
            }
        );
        assert_eq!(
            fps.image.get("fig1"),
            Some(&UnitFingerprint::Hash(HashBits::from_bytes([5, 0xAB])))
        );
    }

    #[test]
    fn duplicate_ids_are_reported() {
        let block = CodeBlock {
            id: "dup".into(),
            language: "javascript".into(),
            source: "const total = items.reduce(add, 0);".into(),
        };
        let artifact = Artifact {
            id: "a1".into(),
            code_blocks: vec![block.clone(), block],
            ..Default::default()
        };

        let fps = extractor().extract(&artifact).unwrap();
        assert_eq!(fps.code.len(), 1);
        assert_eq!(fps.unavailable.len(), 1);
        assert_eq!(fps.unavailable[0].unit_id, "dup");
    }

    #[test]
    fn invalid_code_config_is_fatal() {
        let err = Extractor::new(NormalizerConfig::default(), PerceptualConfig::default().with_k(0))
            .err()
            .expect("k = 0 must be rejected");
        assert!(matches!(err, PipelineError::Perceptual(_)));
    }

    #[test]
    fn artifact_json_uses_snake_case_sources() {
        let json = r#"{
            "id": "a1",
            "images": [{"id": "fig", "source": {"precomputed_hash": "00ff"}}]
        }"#;
        let artifact: Artifact = serde_json::from_str(json).unwrap();
        assert_eq!(
            artifact.images[0].source,
            ImageSource::PrecomputedHash("00ff".into())
        );
        assert!(artifact.chapters.is_empty());
    }
}

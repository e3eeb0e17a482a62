use super::*;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use index::{HashBits, IndexError, InMemoryCorpus, UnavailableUnit};
use perceptual::{fingerprint, CodeFingerprint, PerceptualConfig};

use crate::metrics::{set_report_metrics, ReportMetrics};
use crate::similarity::HashScoring;

fn text_scheme() -> FingerprintScheme {
    FingerprintScheme::Hash {
        algorithm: "simhash64".into(),
        bits: 64,
    }
}

fn image_scheme() -> FingerprintScheme {
    FingerprintScheme::Hash {
        algorithm: "phash64".into(),
        bits: 64,
    }
}

fn code_scheme() -> FingerprintScheme {
    FingerprintScheme::code(1, PerceptualConfig::default().params())
}

fn code_unit(language: &str, text: &str) -> UnitFingerprint {
    UnitFingerprint::Code {
        language: language.into(),
        fingerprint: fingerprint(text, &PerceptualConfig::default()).expect("fingerprint"),
    }
}

fn hash_unit(value: u64) -> UnitFingerprint {
    UnitFingerprint::Hash(HashBits::from_u64(value))
}

fn empty_artifact(id: &str) -> ArtifactFingerprints {
    ArtifactFingerprints {
        artifact_id: id.into(),
        text: FingerprintBlob::new(id, Modality::Text, text_scheme()),
        code: FingerprintBlob::new(id, Modality::Code, code_scheme()),
        image: FingerprintBlob::new(id, Modality::Image, image_scheme()),
        unavailable: Vec::new(),
    }
}

fn with_text(mut artifact: ArtifactFingerprints, units: &[(&str, u64)]) -> ArtifactFingerprints {
    for (id, value) in units {
        artifact.text.push(*id, hash_unit(*value)).unwrap();
    }
    artifact
}

fn with_code(
    mut artifact: ArtifactFingerprints,
    units: &[(&str, &str, &str)],
) -> ArtifactFingerprints {
    for (id, language, text) in units {
        artifact.code.push(*id, code_unit(language, text)).unwrap();
    }
    artifact
}

const SNIPPET: &str = "def _FUNCTION_0(_VARIABLE_0):\n    return _VARIABLE_0 * _VARIABLE_0 + 1\n";

#[test]
fn empty_corpus_yields_no_records_and_full_scores() -> Result<(), MatchError> {
    let new = with_code(
        with_text(empty_artifact("new"), &[("ch1", 0xfeed)]),
        &[("ch1#code-0", "python", SNIPPET)],
    );
    let report = generate_report(&new, &InMemoryCorpus::new(), &ReportConfig::default())?;

    assert_eq!(report.record_count(), 0);
    assert_eq!(report.text_score, 100.0);
    assert_eq!(report.code_score, 100.0);
    assert_eq!(report.image_score, 100.0);
    assert!(report.is_complete());
    assert_eq!(report.references.len(), 3);
    Ok(())
}

#[test]
fn code_is_never_compared_across_languages() -> Result<(), MatchError> {
    let corpus = InMemoryCorpus::new();
    let archived = with_code(empty_artifact("old"), &[("c0", "rust", SNIPPET)]);
    corpus.archive(&archived, "Old")?;

    let new = with_code(empty_artifact("new"), &[("c0", "python", SNIPPET)]);
    let report = generate_report(&new, &corpus, &ReportConfig::default())?;

    assert!(report.code_records.is_empty());
    assert_eq!(report.code_score, 100.0);
    assert!(report.is_complete());
    Ok(())
}

#[test]
fn identical_code_scores_zero() -> Result<(), MatchError> {
    let corpus = InMemoryCorpus::new();
    corpus.archive(
        &with_code(empty_artifact("old"), &[("c0", "python", SNIPPET)]),
        "Old Book",
    )?;

    let new = with_code(empty_artifact("new"), &[("c0", "python", SNIPPET)]);
    let report = generate_report(&new, &corpus, &ReportConfig::default())?;

    assert_eq!(report.code_records.len(), 1);
    let record = &report.code_records[0];
    assert_eq!(record.score, 0.0);
    assert_eq!(record.compared_title, "Old Book");
    assert_eq!(record.origin_artifact_id, "new");
    assert_eq!(record.compared_artifact_id, "old");
    assert!(matches!(
        record.measure,
        SimilarityMeasure::Jaccard { value, containment } if value == 1.0 && containment == 1.0
    ));
    assert_eq!(report.code_score, 0.0);
    Ok(())
}

#[test]
fn empty_code_pairs_are_skipped() -> Result<(), MatchError> {
    let corpus = InMemoryCorpus::new();
    let mut archived = empty_artifact("old");
    archived
        .code
        .push(
            "c0",
            UnitFingerprint::Code {
                language: "python".into(),
                fingerprint: CodeFingerprint::default(),
            },
        )
        .unwrap();
    corpus.archive(&archived, "Old")?;

    let mut new = empty_artifact("new");
    new.code
        .push(
            "c0",
            UnitFingerprint::Code {
                language: "python".into(),
                fingerprint: CodeFingerprint::default(),
            },
        )
        .unwrap();

    let report = generate_report(&new, &corpus, &ReportConfig::default())?;
    assert!(report.code_records.is_empty());
    assert_eq!(report.code_score, 100.0);
    Ok(())
}

#[test]
fn aggregate_is_minimum_of_records() -> Result<(), MatchError> {
    // saturation 20: distances 16, 9, 19 score 80, 45, 95.
    let cfg = ReportConfig::default().with_text_scoring(HashScoring::new(64, 20));
    let corpus = InMemoryCorpus::new();
    corpus.archive(
        &with_text(
            empty_artifact("old"),
            &[
                ("a", (1u64 << 16) - 1),
                ("b", (1u64 << 9) - 1),
                ("c", (1u64 << 19) - 1),
            ],
        ),
        "Old",
    )?;

    let new = with_text(empty_artifact("new"), &[("ch1", 0)]);
    let report = generate_report(&new, &corpus, &cfg)?;

    let scores: Vec<f64> = report.text_records.iter().map(|r| r.score).collect();
    assert_eq!(scores, vec![80.0, 45.0, 95.0]);
    assert_eq!(report.text_score, 45.0);
    assert!(matches!(
        report.text_records[1].measure,
        SimilarityMeasure::Hamming { distance: 9, bits: 64 }
    ));
    Ok(())
}

#[test]
fn aggregate_helper_defaults_to_full_score() {
    assert_eq!(aggregate(&[]), NO_OVERLAP_SCORE);
}

#[test]
fn parallel_and_sequential_reports_agree() -> Result<(), MatchError> {
    let corpus = InMemoryCorpus::new();
    for (i, id) in ["d", "a", "c", "b"].iter().enumerate() {
        corpus.archive(
            &with_text(
                empty_artifact(id),
                &[("x", i as u64 * 0x0f0f), ("y", 0xffff_0000 >> i)],
            ),
            id,
        )?;
    }
    let new = with_text(empty_artifact("new"), &[("n1", 0x1234), ("n2", 0xffff)]);

    let parallel = generate_report(&new, &corpus, &ReportConfig::default().with_parallel(true))?;
    let sequential =
        generate_report(&new, &corpus, &ReportConfig::default().with_parallel(false))?;
    assert_eq!(parallel, sequential);

    let order: Vec<(&str, &str, &str)> = parallel
        .text_records
        .iter()
        .map(|r| {
            (
                r.origin_content_id.as_str(),
                r.compared_artifact_id.as_str(),
                r.compared_content_id.as_str(),
            )
        })
        .collect();
    assert_eq!(order.len(), 16);
    assert_eq!(order[0], ("n1", "a", "x"));
    assert_eq!(order[1], ("n1", "a", "y"));
    assert_eq!(order[2], ("n1", "b", "x"));
    assert_eq!(order[8], ("n2", "a", "x"));
    Ok(())
}

#[test]
fn incompatible_params_are_reported_not_compared() -> Result<(), MatchError> {
    let corpus = InMemoryCorpus::new();
    let mut archived = empty_artifact("old");
    archived.code = FingerprintBlob::new(
        "old",
        Modality::Code,
        FingerprintScheme::code(1, PerceptualConfig::default().with_k(7).params()),
    )
    .with_unit("c0", code_unit("python", SNIPPET))?;
    corpus.archive(&archived, "Old")?;

    let new = with_code(empty_artifact("new"), &[("c0", "python", SNIPPET)]);
    let report = generate_report(&new, &corpus, &ReportConfig::default())?;

    assert!(report.code_records.is_empty());
    assert!(!report.is_complete());
    assert!(matches!(
        &report.warnings[..],
        [ReportWarning::IncompatibleFingerprint { modality: Modality::Code, artifact_id, .. }]
            if artifact_id == "old"
    ));
    Ok(())
}

#[test]
fn unavailable_units_surface_as_warnings() -> Result<(), MatchError> {
    let mut new = empty_artifact("new");
    new.unavailable.push(UnavailableUnit {
        modality: Modality::Code,
        unit_id: "ch1#code-0".into(),
        reason: "no grammar registered for language tag `cobol`".into(),
    });

    let report = generate_report(&new, &InMemoryCorpus::new(), &ReportConfig::default())?;
    assert_eq!(report.code_score, 100.0);
    assert!(!report.is_complete());
    assert!(matches!(
        &report.warnings[0],
        ReportWarning::UnitUnavailable { unit_id, .. } if unit_id == "ch1#code-0"
    ));
    Ok(())
}

/// Corpus that misbehaves in every way a real index can.
struct FlakyCorpus {
    inner: InMemoryCorpus,
}

impl CorpusIndex for FlakyCorpus {
    fn list(&self, modality: Modality) -> Result<Vec<String>, IndexError> {
        match modality {
            Modality::Image => Err(IndexError::backend("image shard offline")),
            _ => {
                let mut ids = self.inner.list(modality)?;
                ids.push("ghost".into());
                ids.push("broken".into());
                Ok(ids)
            }
        }
    }

    fn get(
        &self,
        modality: Modality,
        artifact_id: &str,
    ) -> Result<Option<Arc<FingerprintBlob>>, IndexError> {
        match artifact_id {
            "broken" => Err(IndexError::Decode("truncated record".into())),
            _ => self.inner.get(modality, artifact_id),
        }
    }

    fn title(&self, artifact_id: &str) -> Result<Option<String>, IndexError> {
        self.inner.title(artifact_id)
    }
}

#[test]
fn index_failures_are_isolated_per_entry() -> Result<(), MatchError> {
    let inner = InMemoryCorpus::new();
    inner.archive(&with_text(empty_artifact("good"), &[("a", 0)]), "Good")?;
    // Stored under "mislabeled" but claims to belong to "other".
    inner.insert(
        "mislabeled",
        "Mislabeled",
        with_text(empty_artifact("other"), &[("a", 0)]).text,
    )?;
    let corpus = FlakyCorpus { inner };

    let new = with_text(empty_artifact("new"), &[("ch1", 0)]);
    let report = generate_report(&new, &corpus, &ReportConfig::default())?;

    assert_eq!(report.text_records.len(), 1);
    assert_eq!(report.text_records[0].compared_artifact_id, "good");
    assert_eq!(report.text_score, 0.0);

    let inconsistent: Vec<&str> = report
        .warnings
        .iter()
        .filter_map(|w| match w {
            ReportWarning::IndexInconsistency {
                modality: Modality::Text,
                artifact_id,
                ..
            } => Some(artifact_id.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(inconsistent, vec!["mislabeled", "ghost", "broken"]);
    assert!(report.warnings.iter().any(|w| matches!(
        w,
        ReportWarning::IndexUnavailable {
            modality: Modality::Image,
            ..
        }
    )));
    assert_eq!(report.image_score, 100.0);
    assert!(!report.is_complete());
    Ok(())
}

#[test]
fn invalid_config_is_fatal() {
    let cfg = ReportConfig::default().with_text_scoring(HashScoring::new(64, 0));
    let err = generate_report(&empty_artifact("new"), &InMemoryCorpus::new(), &cfg)
        .expect_err("config should be invalid");
    assert!(matches!(err, MatchError::InvalidConfig(_)));
}

#[derive(Clone)]
struct RecordingMetrics {
    events: Arc<RwLock<Vec<(String, usize, usize)>>>,
}

impl RecordingMetrics {
    fn new() -> Self {
        Self {
            events: Arc::new(RwLock::new(Vec::new())),
        }
    }

    fn snapshot(&self) -> Vec<(String, usize, usize)> {
        self.events.read().unwrap().clone()
    }
}

impl ReportMetrics for RecordingMetrics {
    fn record_report(
        &self,
        artifact_id: &str,
        _latency: Duration,
        records: usize,
        warnings: usize,
    ) {
        self.events
            .write()
            .unwrap()
            .push((artifact_id.to_string(), records, warnings));
    }
}

#[test]
fn metrics_recorder_observes_reports() -> Result<(), MatchError> {
    let metrics = Arc::new(RecordingMetrics::new());
    set_report_metrics(Some(metrics.clone()));

    let corpus = InMemoryCorpus::new();
    corpus.archive(&with_text(empty_artifact("old"), &[("a", 1)]), "Old")?;
    let new = with_text(empty_artifact("metrics-probe"), &[("ch1", 0)]);
    generate_report(&new, &corpus, &ReportConfig::default())?;

    let events = metrics.snapshot();
    // Other tests may report concurrently while the recorder is installed,
    // so only look for this test's event.
    assert!(events
        .iter()
        .any(|(artifact, records, warnings)| artifact == "metrics-probe"
            && *records == 1
            && *warnings == 0));

    set_report_metrics(None);
    Ok(())
}

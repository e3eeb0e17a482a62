use std::time::Instant;

use index::{
    ArtifactFingerprints, BlobUnit, CorpusIndex, FingerprintBlob, FingerprintScheme, Modality,
    UnitFingerprint,
};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::metrics::metrics_recorder;
use crate::similarity::{code_score, containment, hamming_distance, jaccard, HashScoring};
use crate::types::{
    BlobReference, Checkreport, MatchError, ReportConfig, ReportWarning, SimilarityMeasure,
    SimilarityRecord, NO_OVERLAP_SCORE,
};

#[cfg(test)]
mod tests;

/// Compare a new artifact against every archived artifact in `corpus`.
///
/// Records are ordered by new unit, then by corpus list order, then by
/// archived unit, whether or not the scan runs in parallel. Entries the index
/// cannot serve, and blobs that cannot be compared, become warnings on the
/// report instead of errors.
#[tracing::instrument(level = "debug", skip_all, fields(artifact_id = %new.artifact_id))]
pub fn generate_report(
    new: &ArtifactFingerprints,
    corpus: &dyn CorpusIndex,
    cfg: &ReportConfig,
) -> Result<Checkreport, MatchError> {
    cfg.validate()?;
    let start = Instant::now();

    let mut warnings: Vec<ReportWarning> = new
        .unavailable
        .iter()
        .map(|unit| ReportWarning::UnitUnavailable {
            modality: unit.modality,
            unit_id: unit.unit_id.clone(),
            reason: unit.reason.clone(),
        })
        .collect();

    let mut references = Vec::new();
    for modality in Modality::ALL {
        references.push(BlobReference {
            artifact_id: new.artifact_id.clone(),
            modality,
            digest: new.blob(modality).digest()?,
        });
    }

    let mut per_modality: Vec<Vec<SimilarityRecord>> = Vec::with_capacity(3);
    for modality in Modality::ALL {
        let scan = scan_modality(new, modality, corpus, cfg);
        warnings.extend(scan.warnings);
        references.extend(scan.references);
        per_modality.push(scan.records);
    }

    let image_records = per_modality.pop().unwrap_or_default();
    let code_records = per_modality.pop().unwrap_or_default();
    let text_records = per_modality.pop().unwrap_or_default();

    let report = Checkreport {
        artifact_id: new.artifact_id.clone(),
        text_score: aggregate(&text_records),
        code_score: aggregate(&code_records),
        image_score: aggregate(&image_records),
        text_records,
        code_records,
        image_records,
        references,
        warnings,
    };

    let latency = start.elapsed();
    info!(
        records = report.record_count(),
        warnings = report.warnings.len(),
        text_score = report.text_score,
        code_score = report.code_score,
        image_score = report.image_score,
        latency_ms = latency.as_millis() as u64,
        "report generated"
    );
    if let Some(recorder) = metrics_recorder() {
        recorder.record_report(
            &report.artifact_id,
            latency,
            report.record_count(),
            report.warnings.len(),
        );
    }

    Ok(report)
}

/// Minimum score over `records`, or [`NO_OVERLAP_SCORE`] when there are none.
pub fn aggregate(records: &[SimilarityRecord]) -> f64 {
    records
        .iter()
        .map(|record| record.score)
        .fold(None, |min: Option<f64>, score| {
            Some(min.map_or(score, |m| m.min(score)))
        })
        .unwrap_or(NO_OVERLAP_SCORE)
}

#[derive(Default)]
struct ModalityScan {
    records: Vec<SimilarityRecord>,
    warnings: Vec<ReportWarning>,
    references: Vec<BlobReference>,
}

#[derive(Default)]
struct EntryScan {
    /// Records tagged with the index of the new unit they belong to.
    records: Vec<(usize, SimilarityRecord)>,
    warnings: Vec<ReportWarning>,
    reference: Option<BlobReference>,
}

fn scan_modality(
    new: &ArtifactFingerprints,
    modality: Modality,
    corpus: &dyn CorpusIndex,
    cfg: &ReportConfig,
) -> ModalityScan {
    let new_blob = new.blob(modality);
    let mut scan = ModalityScan::default();

    let ids = match corpus.list(modality) {
        Ok(ids) => ids,
        Err(err) => {
            warn!(%modality, error = %err, "corpus listing failed");
            scan.warnings.push(ReportWarning::IndexUnavailable {
                modality,
                reason: err.to_string(),
            });
            return scan;
        }
    };
    debug!(%modality, entries = ids.len(), units = new_blob.len(), "scanning corpus");

    let entries: Vec<EntryScan> = if cfg.use_parallel {
        ids.par_iter()
            .map(|id| scan_entry(new_blob, modality, id, corpus, cfg))
            .collect()
    } else {
        ids.iter()
            .map(|id| scan_entry(new_blob, modality, id, corpus, cfg))
            .collect()
    };

    let mut tagged = Vec::new();
    for entry in entries {
        tagged.extend(entry.records);
        scan.warnings.extend(entry.warnings);
        scan.references.extend(entry.reference);
    }
    // Stable: keeps corpus order, then archived unit order, within a new unit.
    tagged.sort_by_key(|(unit_index, _)| *unit_index);
    scan.records = tagged.into_iter().map(|(_, record)| record).collect();
    scan
}

fn scan_entry(
    new_blob: &FingerprintBlob,
    modality: Modality,
    artifact_id: &str,
    corpus: &dyn CorpusIndex,
    cfg: &ReportConfig,
) -> EntryScan {
    let mut entry = EntryScan::default();
    let inconsistency = |reason: String| ReportWarning::IndexInconsistency {
        modality,
        artifact_id: artifact_id.to_string(),
        reason,
    };
    let incompatible = |reason: String| ReportWarning::IncompatibleFingerprint {
        modality,
        artifact_id: artifact_id.to_string(),
        reason,
    };

    let archived = match corpus.get(modality, artifact_id) {
        Ok(Some(blob)) => blob,
        Ok(None) => {
            warn!(%modality, artifact_id, "listed entry has no blob");
            entry
                .warnings
                .push(inconsistency("listed but no blob could be fetched".into()));
            return entry;
        }
        Err(err) => {
            warn!(%modality, artifact_id, error = %err, "failed to fetch blob");
            entry.warnings.push(inconsistency(err.to_string()));
            return entry;
        }
    };

    if archived.modality != modality || archived.artifact_id != artifact_id {
        warn!(%modality, artifact_id, "blob does not match its index entry");
        entry.warnings.push(inconsistency(format!(
            "blob belongs to `{}` ({})",
            archived.artifact_id, archived.modality
        )));
        return entry;
    }

    match archived.digest() {
        Ok(digest) => {
            entry.reference = Some(BlobReference {
                artifact_id: artifact_id.to_string(),
                modality,
                digest,
            })
        }
        Err(err) => entry.warnings.push(inconsistency(err.to_string())),
    }

    if !new_blob.scheme.compatible_with(&archived.scheme) {
        warn!(%modality, artifact_id, "fingerprint schemes differ");
        entry.warnings.push(incompatible(format!(
            "scheme {} does not match {}",
            describe(&archived.scheme),
            describe(&new_blob.scheme)
        )));
        return entry;
    }

    let title = match corpus.title(artifact_id) {
        Ok(title) => title.unwrap_or_default(),
        Err(err) => {
            warn!(artifact_id, error = %err, "failed to fetch title");
            String::new()
        }
    };

    for (unit_index, new_unit) in new_blob.units().iter().enumerate() {
        for old_unit in archived.units() {
            match compare(new_unit, old_unit, cfg.scoring(modality)) {
                Comparison::Scored(measure, score) => entry.records.push((
                    unit_index,
                    SimilarityRecord {
                        origin_artifact_id: new_blob.artifact_id.clone(),
                        compared_artifact_id: artifact_id.to_string(),
                        compared_title: title.clone(),
                        origin_content_id: new_unit.id.clone(),
                        compared_content_id: old_unit.id.clone(),
                        measure,
                        score,
                    },
                )),
                Comparison::Skipped => {}
                Comparison::Incompatible(reason) => entry.warnings.push(incompatible(format!(
                    "{} vs {}: {reason}",
                    new_unit.id, old_unit.id
                ))),
            }
        }
    }

    entry
}

enum Comparison {
    Scored(SimilarityMeasure, f64),
    /// Nothing to compare: different languages or both fingerprints empty.
    Skipped,
    Incompatible(String),
}

fn compare(new: &BlobUnit, old: &BlobUnit, scoring: Option<&HashScoring>) -> Comparison {
    match (&new.fingerprint, &old.fingerprint, scoring) {
        (
            UnitFingerprint::Code {
                language: new_lang,
                fingerprint: a,
            },
            UnitFingerprint::Code {
                language: old_lang,
                fingerprint: b,
            },
            None,
        ) => {
            if new_lang != old_lang {
                return Comparison::Skipped;
            }
            match jaccard(a, b) {
                Some(value) => Comparison::Scored(
                    SimilarityMeasure::Jaccard {
                        value,
                        containment: containment(a, b).unwrap_or(0.0),
                    },
                    code_score(value),
                ),
                None => Comparison::Skipped,
            }
        }
        (UnitFingerprint::Hash(a), UnitFingerprint::Hash(b), Some(scoring)) => {
            if a.bits() != scoring.bits {
                return Comparison::Incompatible(format!(
                    "{}-bit hash scored as {}-bit",
                    a.bits(),
                    scoring.bits
                ));
            }
            match hamming_distance(a, b) {
                Some(distance) => Comparison::Scored(
                    SimilarityMeasure::Hamming {
                        distance,
                        bits: scoring.bits,
                    },
                    scoring.score(distance),
                ),
                None => Comparison::Incompatible(format!(
                    "{}-bit hash vs {}-bit hash",
                    a.bits(),
                    b.bits()
                )),
            }
        }
        _ => Comparison::Incompatible("fingerprint kinds differ".into()),
    }
}

fn describe(scheme: &FingerprintScheme) -> String {
    match scheme {
        FingerprintScheme::Code {
            canonical_version,
            params,
        } => format!(
            "code(canonical v{canonical_version}, v{}, k={}, w={}, seed={}, ignore_whitespace={})",
            params.version, params.k, params.w, params.seed, params.ignore_whitespace
        ),
        FingerprintScheme::Hash { algorithm, bits } => format!("{algorithm}/{bits}"),
    }
}

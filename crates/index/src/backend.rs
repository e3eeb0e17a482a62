use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::blob::{ArtifactFingerprints, FingerprintBlob, Modality};
use crate::snapshot::{CorpusSnapshot, SnapshotEntry, SNAPSHOT_VERSION};
use crate::IndexError;

/// Read-only view of the archived corpus used by a report run.
///
/// Implementations must answer consistently for the duration of one report;
/// the report generator does not lock anything itself.
pub trait CorpusIndex: Send + Sync {
    /// Ids of archived artifacts holding a blob of `modality`, in a stable order.
    fn list(&self, modality: Modality) -> Result<Vec<String>, IndexError>;
    /// The archived blob of `modality` for `artifact_id`.
    fn get(
        &self,
        modality: Modality,
        artifact_id: &str,
    ) -> Result<Option<Arc<FingerprintBlob>>, IndexError>;
    /// Human-readable title of an archived artifact.
    fn title(&self, artifact_id: &str) -> Result<Option<String>, IndexError>;
}

#[derive(Debug, Clone, Default)]
struct ArchivedArtifact {
    title: String,
    blobs: HashMap<Modality, Arc<FingerprintBlob>>,
}

/// An in-memory corpus using a `RwLock` around a `HashMap`.
#[derive(Debug, Default)]
pub struct InMemoryCorpus {
    artifacts: RwLock<HashMap<String, ArchivedArtifact>>,
}

impl InMemoryCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the blob of `blob.modality` for `artifact_id`.
    ///
    /// The blob is stored under the id given here even if its own
    /// `artifact_id` disagrees, so a corrupted snapshot stays observable.
    pub fn insert(
        &self,
        artifact_id: &str,
        title: &str,
        blob: FingerprintBlob,
    ) -> Result<(), IndexError> {
        let mut guard = self
            .artifacts
            .write()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        let entry = guard.entry(artifact_id.to_string()).or_default();
        entry.title = title.to_string();
        entry.blobs.insert(blob.modality, Arc::new(blob));
        Ok(())
    }

    /// Add an accepted artifact's three blobs in one step.
    pub fn archive(
        &self,
        fingerprints: &ArtifactFingerprints,
        title: &str,
    ) -> Result<(), IndexError> {
        // A single write lock is held for all three blobs.
        let mut guard = self
            .artifacts
            .write()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        let entry = guard
            .entry(fingerprints.artifact_id.clone())
            .or_default();
        entry.title = title.to_string();
        for modality in Modality::ALL {
            entry
                .blobs
                .insert(modality, Arc::new(fingerprints.blob(modality).clone()));
        }
        debug!(artifact_id = %fingerprints.artifact_id, "archived artifact");
        Ok(())
    }

    /// Remove an artifact and all its blobs. Returns whether it existed.
    pub fn remove(&self, artifact_id: &str) -> Result<bool, IndexError> {
        Ok(self
            .artifacts
            .write()
            .map_err(|_| IndexError::backend("poisoned lock"))?
            .remove(artifact_id)
            .is_some())
    }

    pub fn len(&self) -> usize {
        self.artifacts.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serializable copy of the whole corpus, artifacts ordered by id.
    pub fn snapshot(&self) -> Result<CorpusSnapshot, IndexError> {
        let guard = self
            .artifacts
            .read()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        let mut artifacts: Vec<SnapshotEntry> = guard
            .iter()
            .map(|(id, archived)| {
                let mut blobs: Vec<FingerprintBlob> = archived
                    .blobs
                    .values()
                    .map(|blob| blob.as_ref().clone())
                    .collect();
                blobs.sort_by_key(|blob| blob.modality);
                SnapshotEntry {
                    id: id.clone(),
                    title: archived.title.clone(),
                    blobs,
                }
            })
            .collect();
        artifacts.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(CorpusSnapshot {
            version: SNAPSHOT_VERSION,
            artifacts,
        })
    }

    pub fn from_snapshot(snapshot: CorpusSnapshot) -> Result<Self, IndexError> {
        snapshot.validate()?;
        let corpus = Self::new();
        for entry in snapshot.artifacts {
            for blob in entry.blobs {
                corpus.insert(&entry.id, &entry.title, blob)?;
            }
        }
        Ok(corpus)
    }
}

impl CorpusIndex for InMemoryCorpus {
    fn list(&self, modality: Modality) -> Result<Vec<String>, IndexError> {
        let guard = self
            .artifacts
            .read()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        let mut ids: Vec<String> = guard
            .iter()
            .filter(|(_, archived)| archived.blobs.contains_key(&modality))
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn get(
        &self,
        modality: Modality,
        artifact_id: &str,
    ) -> Result<Option<Arc<FingerprintBlob>>, IndexError> {
        let guard = self
            .artifacts
            .read()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        Ok(guard
            .get(artifact_id)
            .and_then(|archived| archived.blobs.get(&modality))
            .cloned())
    }

    fn title(&self, artifact_id: &str) -> Result<Option<String>, IndexError> {
        let guard = self
            .artifacts
            .read()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        Ok(guard.get(artifact_id).map(|archived| archived.title.clone()))
    }
}

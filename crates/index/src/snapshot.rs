//! JSON snapshot of a corpus, used to hand a corpus to the CLI and tests.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::blob::FingerprintBlob;
use crate::IndexError;

/// Bump this value whenever the snapshot layout changes.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub blobs: Vec<FingerprintBlob>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusSnapshot {
    #[serde(default = "default_snapshot_version")]
    pub version: u32,
    pub artifacts: Vec<SnapshotEntry>,
}

const fn default_snapshot_version() -> u32 {
    SNAPSHOT_VERSION
}

impl CorpusSnapshot {
    pub fn from_json(json: &str) -> Result<Self, IndexError> {
        let snapshot: CorpusSnapshot =
            serde_json::from_str(json).map_err(|err| IndexError::Decode(err.to_string()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn to_json(&self) -> Result<String, IndexError> {
        serde_json::to_string_pretty(self).map_err(|err| IndexError::Encode(err.to_string()))
    }

    /// Checks the version and that no artifact id appears twice.
    ///
    /// Blob contents are not checked here; inconsistent blobs are reported
    /// per entry when a report scans them.
    pub fn validate(&self) -> Result<(), IndexError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(IndexError::SnapshotVersion {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        let mut seen = HashSet::new();
        for entry in &self.artifacts {
            if !seen.insert(entry.id.as_str()) {
                return Err(IndexError::Decode(format!(
                    "artifact `{}` appears more than once",
                    entry.id
                )));
            }
        }
        Ok(())
    }
}

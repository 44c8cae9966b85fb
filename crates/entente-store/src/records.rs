//! Relation and sanction files.
//!
//! Both files are JSON arrays. Decoding is lenient per element: an element
//! that is not an object, names an unknown status, or lacks a party is
//! skipped with a debug log, and missing optional fields take their
//! defaults (`status` neutral, `startedAt` now, `expiresAt` permanent,
//! `reason` empty). Semantic filtering (neutral, orphaned, expired) is left
//! to the caller, which knows the nation store and the clock.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;

use entente_types::{Expiry, NationId, Relation, RelationStatus, Sanction};

use crate::error::StoreError;
use crate::fs::{read_json_value, write_json};

pub(crate) const DIPLOMACY_DIR: &str = "diplomacy";
const RELATIONS_FILE: &str = "relations.json";
const SANCTIONS_FILE: &str = "sanctions.json";

/// On-disk shape of a relation, every field optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelationRecord {
    nation_a: Option<NationId>,
    nation_b: Option<NationId>,
    status: Option<RelationStatus>,
    started_at: Option<i64>,
    expires_at: Option<i64>,
    reason: Option<String>,
}

impl RelationRecord {
    fn into_relation(self, now: i64) -> Option<Relation> {
        Some(Relation {
            nation_a: self.nation_a?,
            nation_b: self.nation_b?,
            status: self.status.unwrap_or_default(),
            started_at: self.started_at.unwrap_or(now),
            expires_at: self.expires_at.map_or(Expiry::Permanent, Expiry::from_millis),
            reason: self.reason.unwrap_or_default(),
        })
    }
}

/// On-disk shape of a sanction, every field optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SanctionRecord {
    sanctioner_id: Option<NationId>,
    target_id: Option<NationId>,
    started_at: Option<i64>,
    expires_at: Option<i64>,
    reason: Option<String>,
}

impl SanctionRecord {
    fn into_sanction(self, now: i64) -> Option<Sanction> {
        Some(Sanction {
            sanctioner_id: self.sanctioner_id?,
            target_id: self.target_id?,
            started_at: self.started_at.unwrap_or(now),
            expires_at: self.expires_at.map_or(Expiry::Permanent, Expiry::from_millis),
            reason: self.reason.unwrap_or_default(),
        })
    }
}

/// Location of the diplomacy state files under a data directory.
#[derive(Debug, Clone)]
pub struct DiplomacyFiles {
    data_dir: PathBuf,
}

impl DiplomacyFiles {
    /// Files rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// The data directory everything else lives under.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the relations file.
    pub fn relations_path(&self) -> PathBuf {
        self.data_dir.join(DIPLOMACY_DIR).join(RELATIONS_FILE)
    }

    /// Path of the sanctions file.
    pub fn sanctions_path(&self) -> PathBuf {
        self.data_dir.join(DIPLOMACY_DIR).join(SANCTIONS_FILE)
    }

    /// Load every decodable relation. A missing file yields no relations.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the file exists but cannot be read or is
    /// not JSON.
    pub fn load_relations(&self, now: i64) -> Result<Vec<Relation>, StoreError> {
        let path = self.relations_path();
        let records: Vec<RelationRecord> = decode_elements(&path)?;
        Ok(records
            .into_iter()
            .filter_map(|record| record.into_relation(now))
            .collect())
    }

    /// Load every decodable sanction. A missing file yields no sanctions.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the file exists but cannot be read or is
    /// not JSON.
    pub fn load_sanctions(&self, now: i64) -> Result<Vec<Sanction>, StoreError> {
        let path = self.sanctions_path();
        let records: Vec<SanctionRecord> = decode_elements(&path)?;
        Ok(records
            .into_iter()
            .filter_map(|record| record.into_sanction(now))
            .collect())
    }

    /// Replace the relations file.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the file cannot be written.
    pub fn save_relations(&self, relations: &[Relation]) -> Result<(), StoreError> {
        write_json(&self.relations_path(), relations)?;
        tracing::debug!(count = relations.len(), "Saved relations");
        Ok(())
    }

    /// Replace the sanctions file.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the file cannot be written.
    pub fn save_sanctions(&self, sanctions: &[Sanction]) -> Result<(), StoreError> {
        write_json(&self.sanctions_path(), sanctions)?;
        tracing::debug!(count = sanctions.len(), "Saved sanctions");
        Ok(())
    }
}

/// Decode each array element independently, skipping the ones that fail.
fn decode_elements<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let Some(root) = read_json_value(path)? else {
        return Ok(Vec::new());
    };
    let serde_json::Value::Array(elements) = root else {
        tracing::warn!(path = %path.display(), "Expected a JSON array, ignoring file");
        return Ok(Vec::new());
    };

    let decoded = elements
        .into_iter()
        .filter(serde_json::Value::is_object)
        .filter_map(|element| match serde_json::from_value(element) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "Skipping malformed record");
                None
            }
        })
        .collect();
    Ok(decoded)
}

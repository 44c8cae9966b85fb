//! Readers for the pre-unification sanction and ceasefire files.
//!
//! These files are folded into the unified stores once. After the unified
//! files have been written, the caller records the import in
//! `diplomacy/legacy-import.json` and later starts skip the legacy files.
//! Every reader is best-effort: an unreadable file or a malformed entry is
//! logged and skipped, never fatal.
//!
//! | Path | Shape |
//! |------|-------|
//! | `sanctions/<sanctionerId>.json` | `{"sanctioned": [targetId, ...]}` |
//! | `treaties/sanctions.json` | `{sanctionerId: [targetId, ...], ...}` |
//! | `ceasefires/*.json` | `{nationA, nationB, expiresAt, permanent}` |

use std::path::Path;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use entente_types::{Expiry, NationId};

use crate::error::StoreError;
use crate::fs::{json_files, read_json_value, write_json};
use crate::records::{DIPLOMACY_DIR, DiplomacyFiles};

const IMPORT_MARKER_FILE: &str = "legacy-import.json";

/// A sanction found in a legacy file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacySanction {
    /// The nation imposing the sanction.
    pub sanctioner: NationId,
    /// The nation being sanctioned.
    pub target: NationId,
}

/// A ceasefire found in a legacy file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyCeasefire {
    /// One party.
    pub nation_a: NationId,
    /// The other party.
    pub nation_b: NationId,
    /// When the ceasefire lapses.
    pub expires_at: Expiry,
}

/// Everything found in legacy files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyData {
    /// Sanctions from both legacy sanction formats.
    pub sanctions: Vec<LegacySanction>,
    /// Ceasefires from the legacy ceasefire directory.
    pub ceasefires: Vec<LegacyCeasefire>,
}

impl LegacyData {
    /// Whether no legacy records were found.
    pub fn is_empty(&self) -> bool {
        self.sanctions.is_empty() && self.ceasefires.is_empty()
    }
}

/// Contents of the import marker.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportMarker {
    imported_at: i64,
    sanctions: usize,
    ceasefires: usize,
}

#[derive(Debug, Deserialize)]
struct SanctionListFile {
    #[serde(default)]
    sanctioned: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CeasefireFile {
    nation_a: Option<NationId>,
    nation_b: Option<NationId>,
    expires_at: Option<i64>,
    #[serde(default)]
    permanent: bool,
}

impl DiplomacyFiles {
    /// Path of the marker written once the legacy files have been imported.
    pub fn legacy_marker_path(&self) -> PathBuf {
        self.data_dir().join(DIPLOMACY_DIR).join(IMPORT_MARKER_FILE)
    }

    /// Whether a previous start already imported the legacy files.
    pub fn legacy_imported(&self) -> bool {
        self.legacy_marker_path().is_file()
    }

    /// Record that the legacy files have been folded into the unified
    /// stores. Call only after those stores were written.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the marker cannot be written.
    pub fn mark_legacy_imported(&self, at: i64, data: &LegacyData) -> Result<(), StoreError> {
        let marker = ImportMarker {
            imported_at: at,
            sanctions: data.sanctions.len(),
            ceasefires: data.ceasefires.len(),
        };
        write_json(&self.legacy_marker_path(), &marker)?;
        tracing::info!(path = %self.legacy_marker_path().display(), "Recorded legacy import");
        Ok(())
    }

    /// Read every legacy file under the data directory.
    pub fn read_legacy(&self) -> LegacyData {
        let root = self.data_dir();
        let mut data = LegacyData::default();

        for path in list_or_warn(&root.join("sanctions")) {
            best_effort(&path, |p| read_sanction_list(p, &mut data.sanctions));
        }
        best_effort(&root.join("treaties").join("sanctions.json"), |p| {
            read_sanction_map(p, &mut data.sanctions)
        });
        for path in list_or_warn(&root.join("ceasefires")) {
            best_effort(&path, |p| read_ceasefire(p, &mut data.ceasefires));
        }

        if !data.is_empty() {
            tracing::info!(
                sanctions = data.sanctions.len(),
                ceasefires = data.ceasefires.len(),
                "Found legacy diplomacy records"
            );
        }
        data
    }
}

fn list_or_warn(dir: &Path) -> Vec<PathBuf> {
    json_files(dir).unwrap_or_else(|err| {
        tracing::warn!(dir = %dir.display(), error = %err, "Cannot list legacy directory");
        Vec::new()
    })
}

fn best_effort(path: &Path, read: impl FnOnce(&Path) -> Result<(), StoreError>) {
    if let Err(err) = read(path) {
        tracing::warn!(path = %path.display(), error = %err, "Skipping unreadable legacy file");
    }
}

fn push_targets(
    sanctioner: &NationId,
    targets: impl IntoIterator<Item = serde_json::Value>,
    out: &mut Vec<LegacySanction>,
) {
    if sanctioner.is_blank() {
        return;
    }
    for target in targets {
        let Some(target) = target.as_str().map(NationId::from) else {
            continue;
        };
        if target.is_blank() {
            continue;
        }
        out.push(LegacySanction {
            sanctioner: sanctioner.clone(),
            target,
        });
    }
}

/// `sanctions/<sanctionerId>.json`
fn read_sanction_list(path: &Path, out: &mut Vec<LegacySanction>) -> Result<(), StoreError> {
    let Some(value) = read_json_value(path)? else {
        return Ok(());
    };
    let file: SanctionListFile =
        serde_json::from_value(value).map_err(|err| StoreError::serialization(path, err))?;
    let sanctioner = path
        .file_stem()
        .map_or_else(|| NationId::from(""), |stem| NationId::new(stem.to_string_lossy()));
    push_targets(&sanctioner, file.sanctioned, out);
    Ok(())
}

/// `treaties/sanctions.json`
fn read_sanction_map(path: &Path, out: &mut Vec<LegacySanction>) -> Result<(), StoreError> {
    let Some(serde_json::Value::Object(map)) = read_json_value(path)? else {
        return Ok(());
    };
    for (sanctioner, targets) in map {
        let serde_json::Value::Array(targets) = targets else {
            continue;
        };
        push_targets(&NationId::new(sanctioner), targets, out);
    }
    Ok(())
}

/// `ceasefires/*.json`
fn read_ceasefire(path: &Path, out: &mut Vec<LegacyCeasefire>) -> Result<(), StoreError> {
    let Some(value) = read_json_value(path)? else {
        return Ok(());
    };
    let file: CeasefireFile =
        serde_json::from_value(value).map_err(|err| StoreError::serialization(path, err))?;
    let (Some(nation_a), Some(nation_b)) = (file.nation_a, file.nation_b) else {
        return Ok(());
    };
    if nation_a.is_blank() || nation_b.is_blank() {
        return Ok(());
    }

    let expires_at = if file.permanent {
        Expiry::Permanent
    } else {
        file.expires_at.map_or(Expiry::Permanent, Expiry::from_millis)
    };
    out.push(LegacyCeasefire {
        nation_a,
        nation_b,
        expires_at,
    });
    Ok(())
}

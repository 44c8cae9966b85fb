//! File-backed nation repository.
//!
//! Each nation lives in `<dir>/<id>.json`. The directory is read once when
//! the repository is opened; afterwards reads are served from a cache and
//! every save writes through to disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use entente_types::{Nation, NationId};

use crate::error::StoreError;
use crate::fs::{json_files, read_optional, write_json};
use crate::repository::NationRepository;

/// A [`NationRepository`] storing one JSON file per nation.
#[derive(Debug)]
pub struct JsonNationRepository {
    dir: PathBuf,
    cache: RwLock<BTreeMap<NationId, Nation>>,
}

impl JsonNationRepository {
    /// Open the repository rooted at `dir`, loading every readable record.
    ///
    /// Files that cannot be decoded are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created or
    /// listed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|err| StoreError::io(&dir, err))?;

        let mut cache = BTreeMap::new();
        for path in json_files(&dir)? {
            match load_nation(&path) {
                Ok(Some(nation)) => {
                    cache.insert(nation.id.clone(), nation);
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "Skipping unreadable nation file");
                }
            }
        }

        tracing::info!(dir = %dir.display(), nations = cache.len(), "Nation repository opened");
        Ok(Self {
            dir,
            cache: RwLock::new(cache),
        })
    }

    /// Directory holding the nation files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &NationId) -> Result<PathBuf, StoreError> {
        let raw = id.as_str();
        let unsafe_name = id.is_blank()
            || raw == "."
            || raw == ".."
            || raw.contains(['/', '\\', '\0']);
        if unsafe_name {
            return Err(StoreError::InvalidNationId(raw.to_owned()));
        }
        Ok(self.dir.join(format!("{raw}.json")))
    }
}

fn load_nation(path: &Path) -> Result<Option<Nation>, StoreError> {
    let Some(text) = read_optional(path)? else {
        return Ok(None);
    };
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|err| StoreError::serialization(path, err))
}

impl NationRepository for JsonNationRepository {
    fn get(&self, id: &NationId) -> Option<Nation> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    fn list(&self) -> Vec<Nation> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    fn save(&self, nation: &Nation) -> Result<(), StoreError> {
        let path = self.path_for(&nation.id)?;
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(nation.id.clone(), nation.clone());
        write_json(&path, nation)
    }
}

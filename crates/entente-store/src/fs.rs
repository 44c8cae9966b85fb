//! Small filesystem helpers shared by the stores.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::Serialize;

use crate::error::StoreError;

/// Read a file to a string. A missing file reads as `None`.
pub fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(StoreError::io(path, err)),
    }
}

/// Parse a file as untyped JSON. A missing file reads as `None`.
pub fn read_json_value(path: &Path) -> Result<Option<serde_json::Value>, StoreError> {
    let Some(text) = read_optional(path)? else {
        return Ok(None);
    };
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|err| StoreError::serialization(path, err))
}

/// Serialize `value` as pretty JSON and replace `path` with it.
///
/// The data is written to a sibling temporary file first and renamed into
/// place, so readers never observe a half-written file.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| StoreError::io(parent, err))?;
    }

    let text =
        serde_json::to_string_pretty(value).map_err(|err| StoreError::serialization(path, err))?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, text).map_err(|err| StoreError::io(&tmp, err))?;
    fs::rename(&tmp, path).map_err(|err| StoreError::io(path, err))
}

/// Every `*.json` file directly inside `dir`, sorted by name. A missing
/// directory yields an empty list.
pub fn json_files(dir: &Path) -> Result<Vec<std::path::PathBuf>, StoreError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(StoreError::io(dir, err)),
    };

    let mut files: Vec<_> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_optional(&dir.path().join("absent.json")).unwrap().is_none());
        assert!(json_files(&dir.path().join("absent")).unwrap().is_empty());
    }

    #[test]
    fn write_creates_parents_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data.json");
        write_json(&path, &vec![1, 2, 3]).unwrap();

        let value = read_json_value(&path).unwrap().unwrap();
        assert_eq!(value, serde_json::json!([1, 2, 3]));
        assert_eq!(json_files(&dir.path().join("nested")).unwrap(), vec![path]);
    }
}

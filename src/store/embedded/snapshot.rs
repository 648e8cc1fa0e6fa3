//! Key-value slot and database image encoding for the embedded backend
//!
//! The whole database travels as its native SQLite file image, stored as the
//! text of a JSON array of byte values under a single key.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::backup::Progress;
use rusqlite::{Connection, DatabaseName};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;

use crate::store::error::{RepoError, Result};

/// Fixed slot key holding the database image
pub const SNAPSHOT_KEY: &str = "qms_database";

/// Minimal string key-value storage the embedded backend persists into
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&mut self, key: &str, value: String) -> Result<()>;
}

/// Slot backed by a JSON object file on disk
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let contents = fs::read_to_string(&self.path).map_err(|e| {
            RepoError::unavailable(format!("cannot read {}: {}", self.path.display(), e))
        })?;
        if contents.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(RepoError::unavailable(format!(
                "{} is not a JSON object",
                self.path.display()
            ))),
            Err(e) => Err(RepoError::unavailable(format!(
                "{} is not valid JSON: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

impl KeyValueStore for FileSlot {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let map = self.read_map()?;
        match map.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Ok(Some(other.to_string())),
        }
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        let mut map = self.read_map()?;
        map.insert(key.to_string(), Value::String(value));

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)
            .map_err(|e| RepoError::unavailable(format!("cannot create {}: {}", dir.display(), e)))?;

        // Write beside the target and rename so a crash never leaves half a file
        let tmp = NamedTempFile::new_in(&dir).map_err(RepoError::unavailable)?;
        serde_json::to_writer(tmp.as_file(), &Value::Object(map))
            .map_err(|e| RepoError::unavailable(format!("cannot write slot: {}", e)))?;
        tmp.persist(&self.path).map_err(|e| {
            RepoError::unavailable(format!("cannot write {}: {}", self.path.display(), e))
        })?;
        Ok(())
    }
}

/// Slot held in memory, mostly for tests. Counts writes.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    entries: HashMap<String, String>,
    writes: usize,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set` calls so far
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

impl KeyValueStore for MemorySlot {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.writes += 1;
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// Export the main database of `conn` as its SQLite file image
pub fn export_image(conn: &Connection) -> Result<Vec<u8>> {
    let dir = tempfile::tempdir().map_err(RepoError::unavailable)?;
    let path = dir.path().join("image.db");
    conn.backup(DatabaseName::Main, &path, None)?;
    fs::read(&path).map_err(|e| RepoError::unavailable(format!("cannot read image: {}", e)))
}

/// Replace the main database of `conn` with the given file image
pub fn import_image(conn: &mut Connection, image: &[u8]) -> Result<()> {
    let dir = tempfile::tempdir().map_err(RepoError::unavailable)?;
    let path = dir.path().join("image.db");
    fs::write(&path, image)
        .map_err(|e| RepoError::unavailable(format!("cannot stage image: {}", e)))?;
    conn.restore(DatabaseName::Main, &path, None::<fn(Progress)>)?;
    Ok(())
}

/// Image bytes as the text of a JSON array of byte values
pub fn encode_image(image: &[u8]) -> Result<String> {
    serde_json::to_string(image).map_err(|e| RepoError::unavailable(format!("encode: {}", e)))
}

pub fn decode_image(text: &str) -> Result<Vec<u8>> {
    serde_json::from_str::<Vec<u8>>(text)
        .map_err(|e| RepoError::unavailable(format!("stored snapshot is corrupt: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_encode_is_json_byte_array() {
        assert_eq!(encode_image(&[83, 81, 0, 255]).unwrap(), "[83,81,0,255]");
        assert_eq!(decode_image("[1, 2,3]").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_image("[1, 300]").unwrap_err();
        assert!(matches!(err, RepoError::BackendUnavailable { .. }));
        assert!(decode_image("not json").is_err());
    }

    #[test]
    fn test_image_roundtrip_through_connection() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v TEXT); INSERT INTO t VALUES ('kept');")
            .unwrap();
        let image = export_image(&conn).unwrap();
        assert!(image.starts_with(b"SQLite format 3\0"));

        let mut restored = Connection::open_in_memory().unwrap();
        import_image(&mut restored, &image).unwrap();
        let v: String = restored
            .query_row("SELECT v FROM t", [], |row| row.get(0))
            .unwrap();
        assert_eq!(v, "kept");
    }

    #[test]
    fn test_import_rejects_non_database() {
        let mut conn = Connection::open_in_memory().unwrap();
        let result = import_image(&mut conn, b"definitely not sqlite, just some text padding");
        assert!(result.is_err());
    }

    #[test]
    fn test_file_slot_keeps_other_keys() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("slot.json");
        let mut slot = FileSlot::new(&path);

        assert_eq!(slot.get(SNAPSHOT_KEY).unwrap(), None);
        slot.set("other", "x".into()).unwrap();
        slot.set(SNAPSHOT_KEY, "[1,2]".into()).unwrap();

        let reopened = FileSlot::new(&path);
        assert_eq!(reopened.get("other").unwrap().as_deref(), Some("x"));
        assert_eq!(reopened.get(SNAPSHOT_KEY).unwrap().as_deref(), Some("[1,2]"));
    }

    #[test]
    fn test_file_slot_rejects_non_object() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("slot.json");
        fs::write(&path, "[1,2,3]").unwrap();
        let err = FileSlot::new(&path).get(SNAPSHOT_KEY).unwrap_err();
        assert!(matches!(err, RepoError::BackendUnavailable { .. }));
    }

    #[test]
    fn test_memory_slot_counts_writes() {
        let mut slot = MemorySlot::new();
        slot.set("a", "1".into()).unwrap();
        slot.set("a", "2".into()).unwrap();
        assert_eq!(slot.writes(), 2);
        assert_eq!(slot.get("a").unwrap().as_deref(), Some("2"));
    }
}

//! A remote table kept in a local JSON file.
//!
//! Layout: `{"tables": {"<table id>": {"<tab name>": [[...], ...]}}}`. The
//! whole file is rewritten on every change, through a temporary file that
//! is renamed into place.

use crate::error::{SyncError, SyncResult};
use crate::remote::{RemoteTable, ValueMatrix};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Serialize, Deserialize)]
struct RemoteFile {
    #[serde(default)]
    tables: BTreeMap<String, BTreeMap<String, ValueMatrix>>,
}

/// A [`RemoteTable`] backed by a JSON file.
#[derive(Debug)]
pub struct FileRemoteTable {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileRemoteTable {
    /// Opens a file-backed remote. The file is created on first write.
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> SyncResult<RemoteFile> {
        if !self.path.exists() {
            return Ok(RemoteFile::default());
        }
        let bytes = fs::read(&self.path)?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(RemoteFile::default());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn store(&self, file: &RemoteFile) -> SyncResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(file)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update<F>(&self, table_id: &str, tab_name: &str, f: F) -> SyncResult<()>
    where
        F: FnOnce(&mut ValueMatrix),
    {
        let _guard = self.lock.lock();
        let mut file = self.load()?;
        let tab = file
            .tables
            .entry(table_id.to_string())
            .or_default()
            .entry(tab_name.to_string())
            .or_default();
        f(tab);
        self.store(&file)
    }
}

impl RemoteTable for FileRemoteTable {
    fn read_values(&self, table_id: &str, tab_name: &str) -> SyncResult<ValueMatrix> {
        let _guard = self.lock.lock();
        let file = self.load()?;
        file.tables
            .get(table_id)
            .and_then(|tabs| tabs.get(tab_name))
            .cloned()
            .ok_or_else(|| SyncError::TableNotFound {
                table_id: table_id.to_string(),
                tab_name: tab_name.to_string(),
            })
    }

    fn clear_values(&self, table_id: &str, tab_name: &str) -> SyncResult<()> {
        self.update(table_id, tab_name, |tab| tab.clear())
    }

    fn write_values(
        &self,
        table_id: &str,
        tab_name: &str,
        values: &[Vec<String>],
    ) -> SyncResult<usize> {
        self.update(table_id, tab_name, |tab| *tab = values.to_vec())?;
        Ok(values.iter().map(Vec::len).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn values_persist_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("remote.json");

        let remote = FileRemoteTable::open(&path);
        let values = vec![
            vec!["SyncId".to_string(), "Mark".to_string()],
            vec!["a".to_string(), "D1".to_string()],
        ];
        assert_eq!(remote.write_values("t", "Doors", &values).unwrap(), 4);

        let reopened = FileRemoteTable::open(&path);
        assert_eq!(reopened.read_values("t", "Doors").unwrap(), values);
        assert!(!dir.path().join("remote.json.tmp").exists());
    }

    #[test]
    fn missing_file_reads_as_not_found() {
        let dir = TempDir::new().unwrap();
        let remote = FileRemoteTable::open(dir.path().join("none.json"));
        assert!(matches!(
            remote.read_values("t", "Doors"),
            Err(SyncError::TableNotFound { .. })
        ));
    }

    #[test]
    fn clear_creates_empty_tab() {
        let dir = TempDir::new().unwrap();
        let remote = FileRemoteTable::open(dir.path().join("nested/remote.json"));
        remote.clear_values("t", "Doors").unwrap();
        assert!(remote.read_values("t", "Doors").unwrap().is_empty());
    }

    #[test]
    fn corrupt_file_is_codec_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("remote.json");
        fs::write(&path, "{not json").unwrap();
        let remote = FileRemoteTable::open(&path);
        assert!(matches!(
            remote.read_values("t", "Doors"),
            Err(SyncError::Codec(_))
        ));
    }
}

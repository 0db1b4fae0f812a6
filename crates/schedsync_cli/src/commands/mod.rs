//! CLI command implementations.

pub mod export;
pub mod import;
pub mod schedules;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors reading or writing the CLI's JSON files.
#[derive(Error, Debug)]
pub enum CommandError {
    /// The file could not be read or written.
    #[error("{path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not valid JSON for the expected shape.
    #[error("{path}: invalid JSON: {source}")]
    Json {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
}

/// Files a sync command works on.
#[derive(Debug, Clone)]
pub struct SyncPaths {
    /// Document file.
    pub document: PathBuf,
    /// Sync profile file.
    pub profile: PathBuf,
    /// Remote table file.
    pub remote: PathBuf,
}

impl SyncPaths {
    /// Bundles the three paths.
    pub fn new(document: PathBuf, profile: PathBuf, remote: PathBuf) -> Self {
        Self {
            document,
            profile,
            remote,
        }
    }
}

/// Reads a JSON file.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, CommandError> {
    let bytes = fs::read(path).map_err(|source| CommandError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| CommandError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes a JSON file through a temporary file renamed into place.
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CommandError> {
    let json = serde_json::to_vec_pretty(value).map_err(|source| CommandError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let tmp = path.with_extension("json.tmp");
    let io_err = |source: std::io::Error| CommandError::Io {
        path: path.to_path_buf(),
        source,
    };
    fs::write(&tmp, json).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use schedsync_core::SyncProfile;
    use tempfile::TempDir;

    #[test]
    fn json_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profile.json");
        let profile = SyncProfile::new("t", "Doors", "SyncId");

        save_json(&path, &profile).unwrap();
        let loaded: SyncProfile = load_json(&path).unwrap();
        assert_eq!(loaded, profile);
    }

    #[test]
    fn load_errors_name_the_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.json");
        let err = load_json::<SyncProfile>(&missing).unwrap_err();
        assert!(matches!(err, CommandError::Io { .. }));
        assert!(err.to_string().contains("missing.json"));

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "[1, 2").unwrap();
        let err = load_json::<SyncProfile>(&bad).unwrap_err();
        assert!(matches!(err, CommandError::Json { .. }));
    }
}

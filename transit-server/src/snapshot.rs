//! Loading network and fare data from JSON files.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::domain::NetworkSnapshot;
use crate::fares::FareData;

/// A data file could not be read or parsed.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Read a network snapshot from a JSON file.
pub fn load_network(path: impl AsRef<Path>) -> Result<NetworkSnapshot, SnapshotError> {
    load(path.as_ref())
}

/// Read passenger types and fare rules from a JSON file.
pub fn load_fares(path: impl AsRef<Path>) -> Result<FareData, SnapshotError> {
    load(path.as_ref())
}

fn load<T: DeserializeOwned>(path: &Path) -> Result<T, SnapshotError> {
    let text = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| SnapshotError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

//! JSON array store for symbol lists and fundamentals files.
//!
//! Every file managed here is a single JSON array. Appends are
//! read-modify-write so the file stays valid JSON after each record; that is
//! only safe because the fetch pipeline has exactly one writer by
//! construction.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not a valid JSON array: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not serialize records for {path}: {source}")]
    Serialize {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// File store rooted at the data directory.
#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn symbols_path(&self, exchange: &str) -> PathBuf {
        self.root.join(format!("symbols_{exchange}.json"))
    }

    pub fn fundamentals_path(&self, exchange: &str) -> PathBuf {
        self.root.join(format!("fundamentals_{exchange}.json"))
    }

    pub fn value_stocks_path(&self, exchange: &str) -> PathBuf {
        self.root.join(format!("value_stocks_{exchange}.json"))
    }

    /// Read a whole array file. A missing file is an error; callers that
    /// tolerate absence use [`JsonStore::read_array_or_empty`].
    pub fn read_array<T: DeserializeOwned>(&self, path: &Path) -> Result<Vec<T>, StoreError> {
        let raw = std::fs::read_to_string(path).map_err(|source| StoreError::Read {
            path: display_path(path),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| StoreError::Malformed {
            path: display_path(path),
            source,
        })
    }

    /// Read a whole array file, treating a missing file as an empty array.
    pub fn read_array_or_empty<T: DeserializeOwned>(
        &self,
        path: &Path,
    ) -> Result<Vec<T>, StoreError> {
        match std::fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| StoreError::Malformed {
                path: display_path(path),
                source,
            }),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(source) => Err(StoreError::Read {
                path: display_path(path),
                source,
            }),
        }
    }

    /// Append one record, rewriting the file as a complete pretty-printed
    /// array. Single-writer only.
    pub fn append<T: Serialize>(&self, path: &Path, record: &T) -> Result<(), StoreError> {
        let mut records: Vec<serde_json::Value> = self.read_array_or_empty(path)?;
        let value = serde_json::to_value(record).map_err(|source| StoreError::Serialize {
            path: display_path(path),
            source,
        })?;
        records.push(value);
        self.write_array(path, &records)
    }

    /// Replace the file with a complete pretty-printed array.
    pub fn write_array<T: Serialize>(&self, path: &Path, records: &[T]) -> Result<(), StoreError> {
        let body =
            serde_json::to_string_pretty(records).map_err(|source| StoreError::Serialize {
                path: display_path(path),
                source,
            })?;
        std::fs::write(path, body).map_err(|source| StoreError::Write {
            path: display_path(path),
            source,
        })
    }
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_keeps_the_file_a_valid_array() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonStore::new(dir.path());
        let path = store.fundamentals_path("US");

        store.append(&path, &serde_json::json!({"n": 1})).expect("first append");
        store.append(&path, &serde_json::json!({"n": 2})).expect("second append");

        let records: Vec<serde_json::Value> = store.read_array(&path).expect("valid array");
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["n"], 2);
    }

    #[test]
    fn read_array_or_empty_tolerates_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonStore::new(dir.path());
        let path = store.symbols_path("US");

        let records: Vec<serde_json::Value> =
            store.read_array_or_empty(&path).expect("missing is empty");
        assert!(records.is_empty());
    }

    #[test]
    fn read_array_reports_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonStore::new(dir.path());
        let path = store.symbols_path("US");

        let error = store
            .read_array::<serde_json::Value>(&path)
            .expect_err("must fail");
        assert!(matches!(error, StoreError::Read { .. }));
    }

    #[test]
    fn malformed_file_is_reported_with_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonStore::new(dir.path());
        let path = store.fundamentals_path("US");
        std::fs::write(&path, "{not json").expect("write");

        let error = store
            .read_array::<serde_json::Value>(&path)
            .expect_err("must fail");
        assert!(matches!(error, StoreError::Malformed { .. }));
    }
}

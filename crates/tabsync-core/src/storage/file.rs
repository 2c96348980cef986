//! JSON-file storage scope
//!
//! One scope per file: the file holds a single JSON object mapping keys to
//! values. Reads and writes are whole-file; the values involved are small
//! (one snapshot, one mapping), so blocking IO inside the async trait is
//! acceptable at CLI scale.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use super::StorageScope;
use crate::error::{Error, Result};

pub struct FileScope {
    path: PathBuf,
}

impl FileScope {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_map(&self) -> Result<Map<String, Value>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Map::new());
            }
            Err(error) => return Err(error.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        // A corrupt scope file is an error, not an empty scope.
        let value: Value = serde_json::from_str(&raw).map_err(|error| {
            Error::Storage(format!(
                "scope file {} is not valid JSON: {error}",
                self.path.display()
            ))
        })?;
        match value {
            Value::Object(map) => Ok(map),
            _ => Err(Error::Storage(format!(
                "scope file {} is not a JSON object",
                self.path.display()
            ))),
        }
    }

    fn write_map(&self, map: &Map<String, Value>) -> Result<()> {
        let rendered = serde_json::to_string_pretty(&Value::Object(map.clone()))?;
        std::fs::write(&self.path, rendered + "\n")?;
        Ok(())
    }
}

#[async_trait]
impl StorageScope for FileScope {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let map = self.read_map()?;
        debug!(path = %self.path.display(), key, found = map.contains_key(key), "scope read");
        Ok(map.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut map = self.read_map()?;
        map.insert(key.to_string(), value);
        self.write_map(&map)?;
        debug!(path = %self.path.display(), key, "scope write");
        Ok(())
    }
}

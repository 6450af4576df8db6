//! File-backed store backend.
//!
//! Keeps the whole store as one JSON object on disk. A missing file reads as an
//! empty store; the parent directory is created on first write.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::{Result, StoreError};
use crate::store::SettingsStore;

/// A store persisted as a JSON object in a single file.
pub struct JsonFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles on the file within this process.
    io: Mutex<()>,
}

impl JsonFileStore {
    /// Use `path` as the backing file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            io: Mutex::new(()),
        }
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Map<String, Value>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = ?self.path, "store file not found, treating as empty");
                return Ok(Map::new());
            }
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            other => Err(StoreError::Unavailable(format!(
                "store file root must be an object, found {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait]
impl SettingsStore for JsonFileStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        let _guard = self.io.lock().await;
        let mut all = self.read_all().await?;
        Ok(keys
            .iter()
            .filter_map(|k| all.remove(*k).map(|v| ((*k).to_owned(), v)))
            .collect())
    }

    async fn set(&self, entries: Map<String, Value>) -> Result<()> {
        let _guard = self.io.lock().await;
        let mut all = self.read_all().await?;
        all.extend(entries);

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(&Value::Object(all))?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}

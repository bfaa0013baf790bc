//! Recorder appending interactions to per-user JSON files.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::RelayError;
use crate::types::DEFAULT_USER_ID;

use super::{InteractionRecord, InteractionRecorder};

const LOG_FILE_NAME: &str = "interaction_logs.json";

/// Appends records to `<base>/users/<user_id>/interaction_logs.json`, a
/// pretty-printed JSON array per user.
#[derive(Debug)]
pub struct FileInteractionRecorder {
    base_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileInteractionRecorder {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Location of the log for `user_id`.
    pub fn log_path(&self, user_id: &str) -> PathBuf {
        self.base_dir
            .join("users")
            .join(namespace_label(user_id))
            .join(LOG_FILE_NAME)
    }

    /// Raw log entries for `user_id`, oldest first. Entries written by
    /// other producers are returned as stored.
    pub async fn entries(&self, user_id: &str) -> Result<Vec<serde_json::Value>, RelayError> {
        read_log(&self.log_path(user_id)).await
    }

    /// Records stored for `user_id`, oldest first. Entries that do not
    /// decode as an [`InteractionRecord`] are skipped, not dropped from disk.
    pub async fn load(&self, user_id: &str) -> Result<Vec<InteractionRecord>, RelayError> {
        Ok(self
            .entries(user_id)
            .await?
            .into_iter()
            .filter_map(|entry| serde_json::from_value(entry).ok())
            .collect())
    }
}

/// Blank ids map to the default namespace; path separators are neutralised.
fn namespace_label(user_id: &str) -> String {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        return DEFAULT_USER_ID.to_string();
    }
    trimmed.replace(['/', '\\'], "_")
}

/// Read the log as untyped entries.
///
/// A missing file is an empty log. Valid JSON that is not an array is
/// replaced by an empty log. Anything that fails to parse is an error and
/// the file must be left as it is.
async fn read_log(path: &Path) -> Result<Vec<serde_json::Value>, RelayError> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(RelayError::Persistence(err.to_string())),
    };
    let parsed: serde_json::Value = serde_json::from_str(&raw).map_err(|e| {
        RelayError::Persistence(format!(
            "interaction log {} is not valid JSON: {e}",
            path.display()
        ))
    })?;
    match parsed {
        serde_json::Value::Array(entries) => Ok(entries),
        _ => {
            warn!(path = %path.display(), "interaction log is not a list; starting a new one");
            Ok(Vec::new())
        }
    }
}

#[async_trait]
impl InteractionRecorder for FileInteractionRecorder {
    async fn record(&self, record: &InteractionRecord) -> Result<(), RelayError> {
        let path = self.log_path(&record.user_id);
        let _guard = self.write_lock.lock().await;

        let mut entries = read_log(&path).await?;
        entries.push(serde_json::to_value(record)?);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RelayError::Persistence(e.to_string()))?;
        }
        let serialized = serde_json::to_string_pretty(&entries)?;
        tokio::fs::write(&path, serialized)
            .await
            .map_err(|e| RelayError::Persistence(e.to_string()))
    }
}

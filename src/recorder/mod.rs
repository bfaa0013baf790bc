//! Best-effort persistence of completed turns.

pub mod file;
pub mod http;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::RelayError;
use crate::tools::ToolCallRecord;

pub use file::FileInteractionRecorder;
pub use http::HttpInteractionRecorder;

/// One persisted turn. Written once, never updated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InteractionRecord {
    pub interaction_id: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub thread_id: Option<String>,
    pub user_message: String,
    pub assistant_response: String,
    #[serde(default)]
    pub tool_calls: Vec<ToolCallRecord>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl InteractionRecord {
    /// Start a record stamped with the current time and a fresh id.
    pub fn new(
        user_id: impl Into<String>,
        thread_id: Option<String>,
        user_message: impl Into<String>,
        assistant_response: impl Into<String>,
    ) -> Self {
        let timestamp = Utc::now();
        Self {
            interaction_id: interaction_id_at(timestamp),
            timestamp,
            user_id: user_id.into(),
            thread_id,
            user_message: user_message.into(),
            assistant_response: assistant_response.into(),
            tool_calls: Vec::new(),
            metadata: serde_json::json!({}),
        }
    }

    pub fn with_tool_calls(mut self, tool_calls: Vec<ToolCallRecord>) -> Self {
        self.tool_calls = tool_calls;
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// `INT_<date>_<time>_<micros>_<random>`: the timestamp keeps ids sortable,
/// the random suffix keeps turns finishing in the same microsecond apart.
pub fn interaction_id_at(timestamp: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "INT_{}_{}",
        timestamp.format("%Y%m%d_%H%M%S_%6f"),
        &suffix[..8]
    )
}

/// Destination for interaction records.
#[async_trait]
pub trait InteractionRecorder: Send + Sync {
    async fn record(&self, record: &InteractionRecord) -> Result<(), RelayError>;
}

/// Recorder used when no persistence target is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledRecorder;

#[async_trait]
impl InteractionRecorder for DisabledRecorder {
    async fn record(&self, record: &InteractionRecord) -> Result<(), RelayError> {
        debug!(interaction_id = %record.interaction_id, "interaction recording disabled");
        Ok(())
    }
}

/// Hand a record to `recorder`, logging and discarding any failure.
pub async fn record_best_effort(recorder: &dyn InteractionRecorder, record: &InteractionRecord) {
    match recorder.record(record).await {
        Ok(()) => debug!(
            interaction_id = %record.interaction_id,
            thread_id = record.thread_id.as_deref().unwrap_or(""),
            "interaction recorded"
        ),
        Err(err) => {
            let err = match err {
                RelayError::Persistence(_) => err,
                other => RelayError::Persistence(other.to_string()),
            };
            warn!(
                interaction_id = %record.interaction_id,
                error = %err,
                "failed to record interaction"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    #[test]
    fn interaction_id_embeds_timestamp() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let id = interaction_id_at(ts);
        assert!(id.starts_with("INT_20240309_140507_000000_"), "{id}");
        assert_eq!(id.len(), "INT_20240309_140507_000000_".len() + 8);
    }

    #[test]
    fn ids_for_the_same_instant_do_not_collide() {
        let ts = Utc::now();
        let ids: HashSet<String> = (0..1000).map(|_| interaction_id_at(ts)).collect();
        assert_eq!(ids.len(), 1000);
    }
}

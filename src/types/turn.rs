//! Turn request and response bodies exchanged with chat clients.

use bon::Builder;
use serde::{Deserialize, Serialize};

/// User id applied when the caller does not identify itself.
pub const DEFAULT_USER_ID: &str = "default";

/// Inbound turn submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Builder)]
pub struct TurnRequest {
    #[serde(default)]
    #[builder(into)]
    pub message: String,
    #[serde(default, alias = "userId", skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub thread_id: Option<String>,
}

impl TurnRequest {
    /// Effective user id: trimmed, falling back to [`DEFAULT_USER_ID`].
    pub fn user_id(&self) -> &str {
        self.user_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .unwrap_or(DEFAULT_USER_ID)
    }

    /// Thread to resume; blank ids mean "start a new conversation".
    pub fn thread_id(&self) -> Option<&str> {
        self.thread_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Successful turn response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TurnResponse {
    pub status: String,
    pub response: String,
    pub thread_id: String,
    pub run_id: String,
    pub user_id: String,
    pub tool_calls_count: usize,
}

/// Failed turn response. Never mixed with a partial success payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub status: String,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            error: error.into(),
        }
    }
}

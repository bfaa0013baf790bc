//! Run types as reported by the assistant engine.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::RelayError;

/// Remote run status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    /// A status this client does not know; treated as still running.
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Whether the run can no longer change state.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Cancelled | Self::Expired | Self::Incomplete
        )
    }

    /// Position in the lifecycle. Statuses only ever move to an equal or
    /// higher stage; `RequiresAction` and `InProgress` share a stage because
    /// the run moves back and forth between them.
    pub fn stage(self) -> u8 {
        match self {
            Self::Queued => 0,
            Self::InProgress | Self::RequiresAction | Self::Unknown => 1,
            Self::Cancelling => 2,
            Self::Completed
            | Self::Failed
            | Self::Cancelled
            | Self::Incomplete
            | Self::Expired => 3,
        }
    }
}

/// Error detail attached to a failed run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LastError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Why a run ended as `incomplete`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncompleteDetails {
    #[serde(default)]
    pub reason: Option<String>,
}

/// A run: one engine execution over a thread for a single turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Run {
    pub id: String,
    pub thread_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant_id: Option<String>,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_action: Option<RequiredAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<LastError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incomplete_details: Option<IncompleteDetails>,
}

impl Run {
    /// The tool-call batch the run is blocked on.
    ///
    /// A missing, empty or inconsistent batch while the run requires action
    /// is a protocol violation by the engine and yields an `Upstream` error.
    pub fn pending_tool_calls(&self) -> Result<&[ToolCall], RelayError> {
        let action = self.required_action.as_ref().ok_or_else(|| {
            RelayError::upstream(format!("run {} requires action but carries none", self.id))
        })?;
        if action.kind != "submit_tool_outputs" {
            return Err(RelayError::upstream(format!(
                "run {} requires unsupported action type '{}'",
                self.id, action.kind
            )));
        }
        let calls = action
            .submit_tool_outputs
            .as_ref()
            .map(|s| s.tool_calls.as_slice())
            .unwrap_or_default();
        if calls.is_empty() {
            return Err(RelayError::upstream(format!(
                "run {} requires action with an empty tool-call batch",
                self.id
            )));
        }

        let mut seen = HashSet::new();
        for call in calls {
            if call.id.trim().is_empty() || call.function.name.trim().is_empty() {
                return Err(RelayError::upstream(format!(
                    "run {} sent a tool call without id or name",
                    self.id
                )));
            }
            if call.kind != "function" {
                return Err(RelayError::upstream(format!(
                    "run {} sent tool call {} of unsupported type '{}'",
                    self.id, call.id, call.kind
                )));
            }
            if !seen.insert(call.id.as_str()) {
                return Err(RelayError::upstream(format!(
                    "run {} sent duplicate tool call id {}",
                    self.id, call.id
                )));
            }
        }
        Ok(calls)
    }

    /// Error describing why a terminal run did not complete.
    pub fn failure(&self) -> RelayError {
        let (code, detail) = match (&self.last_error, &self.incomplete_details) {
            (Some(err), _) => (err.code.clone(), err.message.clone()),
            (None, Some(details)) => (None, details.reason.clone()),
            (None, None) => (None, None),
        };
        let message = match detail {
            Some(detail) => format!("run {} ended as {}: {detail}", self.id, self.status),
            None => format!("run {} ended as {}", self.id, self.status),
        };
        RelayError::Upstream { message, code }
    }
}

/// A pending obligation to provide tool outputs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequiredAction {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit_tool_outputs: Option<SubmitToolOutputs>,
}

/// Tool calls awaiting outputs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SubmitToolOutputs {
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

/// One tool invocation requested by a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    pub function: FunctionCall,
}

fn function_kind() -> String {
    "function".to_string()
}

/// Function name plus JSON-encoded arguments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

impl ToolCall {
    /// Build a function tool call (used by tests and replay tooling).
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: &serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            kind: function_kind(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.to_string(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }

    /// Decode the arguments payload. An empty payload decodes to `{}`.
    pub fn parsed_arguments(&self) -> Result<serde_json::Value, serde_json::Error> {
        let raw = self.function.arguments.trim();
        if raw.is_empty() {
            return Ok(serde_json::json!({}));
        }
        serde_json::from_str(raw)
    }
}

/// Output submitted for one tool call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub output: String,
}

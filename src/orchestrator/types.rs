//! Orchestrator result types.

use serde::{Deserialize, Serialize};

use crate::tools::ToolCallRecord;
use crate::types::{RunStatus, TurnResponse};

/// Returned instead of an answer when the run finished without any
/// assistant text on the thread.
pub const NO_RESPONSE: &str = "No response from assistant.";

/// How the finished turn is handed to the interaction recorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordMode {
    /// Spawn a detached task; the response never waits for persistence.
    #[default]
    Background,
    /// Await the recorder before returning. Failures are still swallowed.
    Inline,
}

/// A completed turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub response: String,
    pub thread_id: String,
    pub run_id: String,
    pub user_id: String,
    /// Audit trail of every tool call the run requested, in request order.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Status polls made before the run reached `completed`.
    pub polls: u32,
    pub final_status: RunStatus,
}

impl TurnOutcome {
    pub fn tool_calls_count(&self) -> usize {
        self.tool_calls.len()
    }

    pub fn to_response(&self) -> TurnResponse {
        TurnResponse {
            status: "success".to_string(),
            response: self.response.clone(),
            thread_id: self.thread_id.clone(),
            run_id: self.run_id.clone(),
            user_id: self.user_id.clone(),
            tool_calls_count: self.tool_calls_count(),
        }
    }
}

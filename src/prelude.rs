//! Convenience re-exports for common use.

pub use crate::config::RelayConfig;
pub use crate::error::{RelayError, Result};
pub use crate::orchestrator::{RecordMode, RunOrchestrator, TurnOutcome};
pub use crate::provider::{AssistantsBackend, OpenAiAssistantsClient};
pub use crate::recorder::{InteractionRecord, InteractionRecorder};
pub use crate::tools::{ProxyToolDispatcher, ToolCallRecord, ToolDispatcher, ToolInvocation};
pub use crate::types::{Run, RunStatus, ToolCall, ToolOutput, TurnRequest, TurnResponse};
pub use crate::util::backoff::BackoffSchedule;

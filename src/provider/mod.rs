//! Assistant engine client trait and implementations.

pub mod http;
pub mod openai;

use async_trait::async_trait;

use crate::error::RelayError;
use crate::types::{Run, ThreadMessage, ToolOutput};

pub use openai::OpenAiAssistantsClient;

/// Operations the relay needs from a remote assistant engine.
///
/// Implementations hold no per-turn state and are shared across concurrent
/// turns.
#[async_trait]
pub trait AssistantsBackend: Send + Sync {
    /// Create an empty conversation thread and return its id.
    async fn create_thread(&self) -> Result<String, RelayError>;

    /// Append a user message to a thread.
    async fn add_user_message(&self, thread_id: &str, text: &str) -> Result<(), RelayError>;

    /// Start a run of `assistant_id` over the thread.
    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, RelayError>;

    /// Read the current state of a run.
    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, RelayError>;

    /// Submit one output per pending tool call, as a single batch.
    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run, RelayError>;

    /// Most recent thread messages, newest first.
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, RelayError>;
}

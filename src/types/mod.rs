//! Core types: engine runs, thread messages, turn request/response.

pub mod message;
pub mod run;
pub mod turn;

pub use message::{MessageContent, Role, ThreadMessage};
pub use run::{LastError, RequiredAction, Run, RunStatus, ToolCall, ToolOutput};
pub use turn::{ErrorResponse, TurnRequest, TurnResponse, DEFAULT_USER_ID};

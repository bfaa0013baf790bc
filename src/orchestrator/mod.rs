//! Turn orchestration: drives one engine run per user message to a
//! terminal state, executing the tool calls it requests on the way.

pub mod runner;
pub mod tool_phase;
pub mod types;

pub use runner::RunOrchestrator;
pub use tool_phase::{execute_batch, BatchResult};
pub use types::{RecordMode, TurnOutcome, NO_RESPONSE};

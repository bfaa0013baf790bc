//! Tool-call dispatch to the external routing collaborator.

pub mod dispatch;
pub mod types;

pub use dispatch::{ProxyToolDispatcher, ToolDispatcher};
pub use types::{ToolCallRecord, ToolInvocation};

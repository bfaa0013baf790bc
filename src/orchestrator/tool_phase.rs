//! Execution of one `requires_action` batch.

use futures::future;

use crate::tools::{ToolCallRecord, ToolDispatcher, ToolInvocation};
use crate::types::{ToolCall, ToolOutput};

/// Outputs to submit for a batch plus the audit records it produced.
///
/// `outputs[i]` and `records[i]` both belong to the i-th call of the batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult {
    pub outputs: Vec<ToolOutput>,
    pub records: Vec<ToolCallRecord>,
}

impl BatchResult {
    pub fn failures(&self) -> usize {
        self.records.iter().filter(|r| !r.success).count()
    }
}

/// Run every call of the batch concurrently and collect exactly one output
/// per call id. A failing call never cancels its siblings.
pub async fn execute_batch(dispatcher: &dyn ToolDispatcher, calls: &[ToolCall]) -> BatchResult {
    let invocations =
        future::join_all(calls.iter().map(|call| execute_call(dispatcher, call))).await;

    let (outputs, records): (Vec<_>, Vec<_>) = calls
        .iter()
        .zip(invocations)
        .map(|(call, invocation)| {
            (
                ToolOutput {
                    tool_call_id: call.id.clone(),
                    output: invocation.output,
                },
                invocation.record,
            )
        })
        .unzip();

    BatchResult { outputs, records }
}

async fn execute_call(dispatcher: &dyn ToolDispatcher, call: &ToolCall) -> ToolInvocation {
    match call.parsed_arguments() {
        Ok(arguments) => dispatcher.execute(&call.id, call.name(), &arguments).await,
        Err(err) => ToolInvocation::failure(
            &call.id,
            call.name(),
            serde_json::Value::String(call.function.arguments.clone()),
            None,
            format!("arguments are not valid JSON: {err}"),
        ),
    }
}

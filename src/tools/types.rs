//! Tool invocation results and audit records.

use serde::{Deserialize, Serialize};

/// Audit entry for one tool call, kept whether or not the call succeeded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCallRecord {
    pub call_id: String,
    pub tool_name: String,
    pub arguments: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub success: bool,
}

impl ToolCallRecord {
    pub fn succeeded(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        arguments: serde_json::Value,
        result: serde_json::Value,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            arguments,
            result: Some(result),
            error: None,
            success: true,
        }
    }

    pub fn failed(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        arguments: serde_json::Value,
        error: impl Into<String>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            arguments,
            result: None,
            error: Some(error.into()),
            success: false,
        }
    }
}

/// What one dispatch produced: the string handed back to the engine and
/// the matching audit record.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub output: String,
    pub record: ToolCallRecord,
}

impl ToolInvocation {
    /// A failed invocation with an error-shaped JSON output.
    pub fn failure(
        call_id: &str,
        tool_name: &str,
        arguments: serde_json::Value,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        let message = message.into();
        let mut body = serde_json::json!({
            "error": message,
            "tool": tool_name,
        });
        if let Some(status) = status {
            body["status"] = status.into();
        }
        Self {
            output: body.to_string(),
            record: ToolCallRecord::failed(call_id, tool_name, arguments, message),
        }
    }

    pub fn is_success(&self) -> bool {
        self.record.success
    }
}

//! Forward tool calls to the action router and normalise the outcome.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use tracing::{info, warn};

use crate::error::RelayError;
use crate::provider::http::{build_client, send_within, with_function_key};

use super::types::{ToolCallRecord, ToolInvocation};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Executes a single tool call.
///
/// Implementations never fail: every problem is folded into an error-shaped
/// output and a `success: false` record so that one broken tool cannot abort
/// the run it belongs to.
#[async_trait]
pub trait ToolDispatcher: Send + Sync {
    async fn execute(
        &self,
        call_id: &str,
        tool_name: &str,
        arguments: &serde_json::Value,
    ) -> ToolInvocation;
}

/// Dispatcher posting `{action, params}` envelopes to the proxy router.
///
/// The router owns action-name validation and required-parameter checks;
/// any non-2xx answer is treated like a transport failure.
#[derive(Debug, Clone)]
pub struct ProxyToolDispatcher {
    http: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
}

impl ProxyToolDispatcher {
    pub fn new(endpoint: &str, function_key: Option<&str>) -> Result<Self, RelayError> {
        Ok(Self::with_http_client(
            build_client(DEFAULT_TIMEOUT)?,
            with_function_key(endpoint, function_key)?,
        ))
    }

    pub fn with_http_client(http: reqwest::Client, endpoint: Url) -> Self {
        Self {
            http,
            endpoint,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn forward(
        &self,
        tool_name: &str,
        arguments: &serde_json::Value,
    ) -> Result<(u16, String), RelayError> {
        let envelope = serde_json::json!({
            "action": tool_name,
            "params": arguments,
        });
        let (status, body) =
            send_within(self.http.post(self.endpoint.clone()).json(&envelope), self.timeout)
                .await?;
        Ok((status.as_u16(), body))
    }
}

#[async_trait]
impl ToolDispatcher for ProxyToolDispatcher {
    async fn execute(
        &self,
        call_id: &str,
        tool_name: &str,
        arguments: &serde_json::Value,
    ) -> ToolInvocation {
        info!(tool = tool_name, call_id, "dispatching tool call");

        match self.forward(tool_name, arguments).await {
            Ok((status, body)) if (200..300).contains(&status) => {
                let result = serde_json::from_str(&body)
                    .unwrap_or_else(|_| serde_json::Value::String(body.clone()));
                ToolInvocation {
                    output: body,
                    record: ToolCallRecord::succeeded(call_id, tool_name, arguments.clone(), result),
                }
            }
            Ok((status, body)) => {
                let err = RelayError::ToolExecution {
                    tool_name: tool_name.to_string(),
                    message: format!("router answered {status}: {}", body.trim()),
                };
                warn!(tool = tool_name, call_id, status, error = %err, "tool call failed");
                ToolInvocation::failure(call_id, tool_name, arguments.clone(), Some(status), err.to_string())
            }
            Err(e) => {
                let err = RelayError::ToolExecution {
                    tool_name: tool_name.to_string(),
                    message: e.to_string(),
                };
                warn!(tool = tool_name, call_id, error = %err, "tool call failed");
                ToolInvocation::failure(call_id, tool_name, arguments.clone(), None, err.to_string())
            }
        }
    }
}

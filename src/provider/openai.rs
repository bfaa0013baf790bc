//! OpenAI Assistants v2 REST client.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::RelayError;
use crate::types::{Run, ThreadMessage, ToolOutput};
use crate::util::retry::RetryPolicy;

use super::http::{assistants_headers, build_client, status_to_error, trim_trailing_slash};
use super::AssistantsBackend;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const MESSAGE_PAGE_LIMIT: u32 = 20;

/// Client for the thread/run endpoints of the Assistants API.
#[derive(Debug, Clone)]
pub struct OpenAiAssistantsClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    read_retry: RetryPolicy,
}

#[derive(Deserialize)]
struct CreatedObject {
    id: String,
}

#[derive(Deserialize)]
struct MessageList {
    data: Vec<ThreadMessage>,
}

impl OpenAiAssistantsClient {
    pub fn new(api_key: String) -> Result<Self, RelayError> {
        Self::new_with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn new_with_base_url(
        api_key: String,
        base_url: impl Into<String>,
    ) -> Result<Self, RelayError> {
        Ok(Self::with_http_client(build_client(DEFAULT_TIMEOUT)?, api_key, base_url))
    }

    /// Wrap an existing client (shared connection pool, custom timeout).
    pub fn with_http_client(
        http: reqwest::Client,
        api_key: String,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_key,
            base_url: trim_trailing_slash(&base_url.into()).to_string(),
            read_retry: RetryPolicy::default(),
        }
    }

    /// Retry policy for idempotent reads. Writes are always sent once.
    pub fn with_read_retry(mut self, retry_policy: RetryPolicy) -> Self {
        self.read_retry = retry_policy;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, RelayError> {
        let resp = self
            .http
            .post(self.url(path))
            .headers(assistants_headers(&self.api_key))
            .json(body)
            .send()
            .await?;
        parse_response(resp).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RelayError> {
        self.read_retry
            .execute(path, || async move {
                let resp = self
                    .http
                    .get(self.url(path))
                    .headers(assistants_headers(&self.api_key))
                    .send()
                    .await?;
                parse_response(resp).await
            })
            .await
    }
}

async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, RelayError> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(status_to_error(status.as_u16(), &body));
    }
    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl AssistantsBackend for OpenAiAssistantsClient {
    async fn create_thread(&self) -> Result<String, RelayError> {
        debug!("creating thread");
        let created: CreatedObject = self.post_json("/threads", &serde_json::json!({})).await?;
        Ok(created.id)
    }

    async fn add_user_message(&self, thread_id: &str, text: &str) -> Result<(), RelayError> {
        debug!(thread_id, "adding user message");
        let _: CreatedObject = self
            .post_json(
                &format!("/threads/{thread_id}/messages"),
                &serde_json::json!({ "role": "user", "content": text }),
            )
            .await?;
        Ok(())
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, RelayError> {
        debug!(thread_id, assistant_id, "creating run");
        self.post_json(
            &format!("/threads/{thread_id}/runs"),
            &serde_json::json!({ "assistant_id": assistant_id }),
        )
        .await
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, RelayError> {
        self.get_json(&format!("/threads/{thread_id}/runs/{run_id}"))
            .await
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run, RelayError> {
        debug!(thread_id, run_id, count = outputs.len(), "submitting tool outputs");
        self.post_json(
            &format!("/threads/{thread_id}/runs/{run_id}/submit_tool_outputs"),
            &serde_json::json!({ "tool_outputs": outputs }),
        )
        .await
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, RelayError> {
        let list: MessageList = self
            .get_json(&format!(
                "/threads/{thread_id}/messages?order=desc&limit={MESSAGE_PAGE_LIMIT}"
            ))
            .await?;
        Ok(list.data)
    }
}

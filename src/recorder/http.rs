//! Recorder posting interactions to the persistence endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;

use crate::error::RelayError;
use crate::provider::http::{build_client, send_within, with_function_key};

use super::{InteractionRecord, InteractionRecorder};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts each record as JSON, identifying the owner with `X-User-Id`.
#[derive(Debug, Clone)]
pub struct HttpInteractionRecorder {
    http: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
}

impl HttpInteractionRecorder {
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
}

#[async_trait]
impl InteractionRecorder for HttpInteractionRecorder {
    async fn record(&self, record: &InteractionRecord) -> Result<(), RelayError> {
        let request = self
            .http
            .post(self.endpoint.clone())
            .header("X-User-Id", record.user_id.as_str())
            .json(record);
        let (status, body) = send_within(request, self.timeout)
            .await
            .map_err(|e| RelayError::Persistence(e.to_string()))?;

        if !status.is_success() {
            return Err(RelayError::Persistence(format!(
                "store answered {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }
        Ok(())
    }
}

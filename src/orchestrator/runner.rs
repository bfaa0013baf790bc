//! The run orchestrator and its poll loop.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::config::RelayConfig;
use crate::error::{RelayError, Result};
use crate::provider::http::{build_client, with_function_key};
use crate::provider::{AssistantsBackend, OpenAiAssistantsClient};
use crate::recorder::{
    record_best_effort, DisabledRecorder, FileInteractionRecorder, HttpInteractionRecorder,
    InteractionRecord, InteractionRecorder,
};
use crate::tools::{ProxyToolDispatcher, ToolCallRecord, ToolDispatcher};
use crate::types::{Role, RunStatus, ThreadMessage, ToolCall, TurnRequest};
use crate::util::backoff::BackoffSchedule;

use super::tool_phase::execute_batch;
use super::types::{RecordMode, TurnOutcome, NO_RESPONSE};

/// Drives turns against an assistant engine.
///
/// Holds only shared, read-only handles, so one orchestrator serves any
/// number of concurrent turns.
pub struct RunOrchestrator {
    backend: Arc<dyn AssistantsBackend>,
    dispatcher: Arc<dyn ToolDispatcher>,
    recorder: Arc<dyn InteractionRecorder>,
    assistant_id: String,
    schedule: BackoffSchedule,
    record_mode: RecordMode,
}

/// What is known about a run while it is being driven.
#[derive(Debug, Default)]
struct RunProgress {
    run_id: Option<String>,
    polls: u32,
    status: Option<RunStatus>,
    tool_calls: Vec<ToolCallRecord>,
}

impl RunOrchestrator {
    pub fn new(
        backend: Arc<dyn AssistantsBackend>,
        dispatcher: Arc<dyn ToolDispatcher>,
        assistant_id: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            dispatcher,
            recorder: Arc::new(DisabledRecorder),
            assistant_id: assistant_id.into(),
            schedule: BackoffSchedule::default(),
            record_mode: RecordMode::default(),
        }
    }

    /// Build the engine client, router dispatcher and recorder described by
    /// `config`. Each client is constructed once here and reused by every turn.
    pub fn from_config(config: &RelayConfig) -> Result<Self> {
        config.validate()?;

        let backend = OpenAiAssistantsClient::with_http_client(
            build_client(config.request_timeout())?,
            config.api_key()?.to_string(),
            config.base_url.clone(),
        );
        let dispatcher = ProxyToolDispatcher::with_http_client(
            build_client(config.tool_timeout())?,
            with_function_key(config.proxy_url()?, config.function_key.as_deref())?,
        )
        .with_timeout(config.tool_timeout());

        let recorder: Arc<dyn InteractionRecorder> =
            match (&config.interaction_url, &config.interaction_dir) {
                (Some(url), _) => Arc::new(HttpInteractionRecorder::new(
                    url,
                    config.function_key.as_deref(),
                )?),
                (None, Some(dir)) => Arc::new(FileInteractionRecorder::new(dir.clone())),
                (None, None) => Arc::new(DisabledRecorder),
            };

        let record_mode = if config.record_in_background {
            RecordMode::Background
        } else {
            RecordMode::Inline
        };

        Ok(Self::new(
            Arc::new(backend),
            Arc::new(dispatcher),
            config.assistant_id()?,
        )
        .with_recorder(recorder)
        .with_schedule(config.backoff_schedule())
        .with_record_mode(record_mode))
    }

    pub fn with_recorder(mut self, recorder: Arc<dyn InteractionRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    pub fn with_schedule(mut self, schedule: BackoffSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_record_mode(mut self, record_mode: RecordMode) -> Self {
        self.record_mode = record_mode;
        self
    }

    pub fn schedule(&self) -> &BackoffSchedule {
        &self.schedule
    }

    /// Handle one user message end to end.
    ///
    /// Creates a thread when the request carries none, runs the assistant,
    /// services its tool calls and returns the final assistant text. The
    /// interaction is recorded on success and on run failure; recording
    /// problems never change the result.
    pub async fn handle_turn(&self, request: &TurnRequest) -> Result<TurnOutcome> {
        if request.message.trim().is_empty() {
            return Err(RelayError::Validation(
                "'message' must be a non-empty string".to_string(),
            ));
        }
        let user_id = request.user_id().to_string();
        let started = Instant::now();

        let thread_id = match request.thread_id() {
            Some(id) => id.to_string(),
            None => {
                let id = self.backend.create_thread().await?;
                info!(thread_id = %id, user_id = %user_id, "created thread");
                id
            }
        };

        let mut progress = RunProgress::default();
        let result = self
            .drive(&thread_id, &request.message, &mut progress)
            .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let mut metadata = serde_json::json!({
            "run_id": progress.run_id,
            "assistant_id": self.assistant_id,
            "polls": progress.polls,
            "run_status": progress.status.map(|s| s.to_string()),
            "elapsed_ms": elapsed_ms,
        });

        match result {
            Ok(response) => {
                let run_id = progress.run_id.clone().unwrap_or_default();
                info!(
                    thread_id = %thread_id,
                    run_id = %run_id,
                    polls = progress.polls,
                    tool_calls = progress.tool_calls.len(),
                    elapsed_ms,
                    "turn completed"
                );
                metadata["status"] = "success".into();
                let record = InteractionRecord::new(
                    user_id.clone(),
                    Some(thread_id.clone()),
                    request.message.clone(),
                    response.clone(),
                )
                .with_tool_calls(progress.tool_calls.clone())
                .with_metadata(metadata);
                self.persist(record).await;

                Ok(TurnOutcome {
                    response,
                    thread_id,
                    run_id,
                    user_id,
                    tool_calls: progress.tool_calls,
                    polls: progress.polls,
                    final_status: progress.status.unwrap_or(RunStatus::Completed),
                })
            }
            Err(err) => {
                error!(
                    thread_id = %thread_id,
                    run_id = progress.run_id.as_deref().unwrap_or(""),
                    polls = progress.polls,
                    error = %err,
                    "turn failed"
                );
                metadata["status"] = "error".into();
                metadata["error"] = err.to_string().into();
                let record = InteractionRecord::new(
                    user_id,
                    Some(thread_id),
                    request.message.clone(),
                    err.to_string(),
                )
                .with_tool_calls(progress.tool_calls)
                .with_metadata(metadata);
                self.persist(record).await;
                Err(err)
            }
        }
    }

    async fn drive(
        &self,
        thread_id: &str,
        message: &str,
        progress: &mut RunProgress,
    ) -> Result<String> {
        self.backend.add_user_message(thread_id, message).await?;
        let run = self.backend.create_run(thread_id, &self.assistant_id).await?;
        info!(thread_id, run_id = %run.id, status = %run.status, "started run");
        progress.run_id = Some(run.id.clone());
        progress.status = Some(run.status);

        self.poll_until_completed(thread_id, &run.id, progress)
            .await?;

        let messages = self.backend.list_messages(thread_id).await?;
        Ok(latest_assistant_text(&messages, &run.id).unwrap_or_else(|| NO_RESPONSE.to_string()))
    }

    /// Poll the run until it completes, servicing tool-call batches.
    ///
    /// Every iteration waits, polls once and reacts to the observed status;
    /// after a batch is submitted the next status is never assumed. At most
    /// `schedule.max_attempts` polls are made. A call is dispatched at most
    /// once per run, even if the engine still shows it after submission.
    async fn poll_until_completed(
        &self,
        thread_id: &str,
        run_id: &str,
        progress: &mut RunProgress,
    ) -> Result<()> {
        let mut attempt = 0u32;
        let mut stage = progress.status.map(RunStatus::stage).unwrap_or(0);
        let mut submitted: HashSet<String> = HashSet::new();

        while self.schedule.has_attempts_remaining(attempt) {
            tokio::time::sleep(self.schedule.next_wait(attempt)).await;
            attempt += 1;
            progress.polls = attempt;

            let run = self.backend.retrieve_run(thread_id, run_id).await?;
            debug!(thread_id, run_id, attempt, status = %run.status, "polled run");
            if run.status.stage() < stage {
                warn!(thread_id, run_id, status = %run.status, "run status moved backwards");
            }
            stage = stage.max(run.status.stage());
            progress.status = Some(run.status);

            match run.status {
                RunStatus::Completed => return Ok(()),
                RunStatus::RequiresAction => {
                    let calls: Vec<ToolCall> = run
                        .pending_tool_calls()?
                        .iter()
                        .filter(|call| !submitted.contains(&call.id))
                        .cloned()
                        .collect();
                    if calls.is_empty() {
                        debug!(thread_id, run_id, "batch already submitted; waiting for the run");
                        continue;
                    }
                    info!(thread_id, run_id, count = calls.len(), "run requires tool outputs");
                    let batch = execute_batch(self.dispatcher.as_ref(), &calls).await;
                    if batch.failures() > 0 {
                        warn!(
                            thread_id,
                            run_id,
                            failed = batch.failures(),
                            "tool calls failed; submitting error outputs"
                        );
                    }
                    progress.tool_calls.extend(batch.records);
                    submitted.extend(calls.into_iter().map(|call| call.id));
                    let after = self
                        .backend
                        .submit_tool_outputs(thread_id, run_id, &batch.outputs)
                        .await?;
                    debug!(thread_id, run_id, status = %after.status, "tool outputs submitted");
                    progress.status = Some(after.status);
                }
                status if status.is_terminal() => return Err(run.failure()),
                _ => {}
            }
        }

        warn!(thread_id, run_id, attempts = attempt, "gave up waiting for run");
        Err(RelayError::TimedOut { attempts: attempt })
    }

    async fn persist(&self, record: InteractionRecord) {
        match self.record_mode {
            RecordMode::Inline => record_best_effort(self.recorder.as_ref(), &record).await,
            RecordMode::Background => {
                let recorder = Arc::clone(&self.recorder);
                tokio::spawn(async move {
                    record_best_effort(recorder.as_ref(), &record).await;
                });
            }
        }
    }
}

/// Text of the newest assistant message written by `run_id`; `messages` is
/// ordered newest first. Answers from earlier runs on the thread never count.
fn latest_assistant_text(messages: &[ThreadMessage], run_id: &str) -> Option<String> {
    messages
        .iter()
        .find(|m| m.role == Role::Assistant && m.run_id.as_deref() == Some(run_id))
        .map(ThreadMessage::text)
        .filter(|text| !text.is_empty())
}

//! Shared test helpers: a scripted engine, a canned dispatcher and
//! capturing recorders.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use runrelay::error::RelayError;
use runrelay::provider::AssistantsBackend;
use runrelay::recorder::{InteractionRecord, InteractionRecorder};
use runrelay::tools::{ToolCallRecord, ToolDispatcher, ToolInvocation};
use runrelay::types::run::SubmitToolOutputs;
use runrelay::types::{
    MessageContent, RequiredAction, Role, Run, RunStatus, ThreadMessage, ToolCall, ToolOutput,
};

pub const THREAD_ID: &str = "thread_1";
pub const RUN_ID: &str = "run_1";

pub fn run(status: RunStatus) -> Run {
    Run {
        id: RUN_ID.to_string(),
        thread_id: THREAD_ID.to_string(),
        assistant_id: Some("asst_1".to_string()),
        status,
        required_action: None,
        last_error: None,
        incomplete_details: None,
    }
}

pub fn requires_action(calls: Vec<ToolCall>) -> Run {
    Run {
        required_action: Some(RequiredAction {
            kind: "submit_tool_outputs".to_string(),
            submit_tool_outputs: Some(SubmitToolOutputs { tool_calls: calls }),
        }),
        ..run(RunStatus::RequiresAction)
    }
}

pub fn assistant_message(id: &str, text: &str) -> ThreadMessage {
    ThreadMessage {
        id: id.to_string(),
        role: Role::Assistant,
        content: vec![MessageContent::text(text)],
        run_id: Some(RUN_ID.to_string()),
        created_at: 0,
    }
}

/// In-memory engine replaying a queue of run snapshots.
///
/// Each `retrieve_run` pops the next snapshot; the last one is repeated
/// forever once the queue is down to a single entry.
pub struct ScriptedBackend {
    snapshots: Mutex<VecDeque<Run>>,
    messages: Mutex<Vec<ThreadMessage>>,
    events: Mutex<Vec<String>>,
    submissions: Mutex<Vec<Vec<ToolOutput>>>,
}

impl ScriptedBackend {
    pub fn new(snapshots: Vec<Run>) -> Self {
        Self {
            snapshots: Mutex::new(snapshots.into()),
            messages: Mutex::new(Vec::new()),
            events: Mutex::new(Vec::new()),
            submissions: Mutex::new(Vec::new()),
        }
    }

    /// Messages returned by `list_messages`, newest first.
    pub fn with_messages(self, messages: Vec<ThreadMessage>) -> Self {
        *self.messages.lock().unwrap() = messages;
        self
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.split(':').next() == Some(event))
            .count()
    }

    pub fn submissions(&self) -> Vec<Vec<ToolOutput>> {
        self.submissions.lock().unwrap().clone()
    }

    fn log(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }
}

#[async_trait]
impl AssistantsBackend for ScriptedBackend {
    async fn create_thread(&self) -> Result<String, RelayError> {
        self.log("create_thread");
        Ok(THREAD_ID.to_string())
    }

    async fn add_user_message(&self, thread_id: &str, text: &str) -> Result<(), RelayError> {
        self.log(format!("add_message:{thread_id}:{text}"));
        Ok(())
    }

    async fn create_run(&self, thread_id: &str, _assistant_id: &str) -> Result<Run, RelayError> {
        self.log(format!("create_run:{thread_id}"));
        Ok(Run {
            thread_id: thread_id.to_string(),
            ..run(RunStatus::Queued)
        })
    }

    async fn retrieve_run(&self, _thread_id: &str, _run_id: &str) -> Result<Run, RelayError> {
        self.log("retrieve_run");
        let mut snapshots = self.snapshots.lock().unwrap();
        let next = if snapshots.len() > 1 {
            snapshots.pop_front()
        } else {
            snapshots.front().cloned()
        };
        next.ok_or_else(|| RelayError::upstream("no scripted run snapshot left"))
    }

    async fn submit_tool_outputs(
        &self,
        _thread_id: &str,
        _run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run, RelayError> {
        self.log(format!("submit_tool_outputs:{}", outputs.len()));
        self.submissions.lock().unwrap().push(outputs.to_vec());
        Ok(run(RunStatus::Queued))
    }

    async fn list_messages(&self, _thread_id: &str) -> Result<Vec<ThreadMessage>, RelayError> {
        self.log("list_messages");
        Ok(self.messages.lock().unwrap().clone())
    }
}

/// Dispatcher answering known actions with canned JSON and unknown ones the
/// way the action router does: a 400 with an error body.
#[derive(Default)]
pub struct CannedDispatcher {
    answers: HashMap<String, Value>,
    seen: Mutex<Vec<(String, Value)>>,
}

impl CannedDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, action: &str, body: Value) -> Self {
        self.answers.insert(action.to_string(), body);
        self
    }

    pub fn seen(&self) -> Vec<(String, Value)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolDispatcher for CannedDispatcher {
    async fn execute(&self, call_id: &str, tool_name: &str, arguments: &Value) -> ToolInvocation {
        self.seen
            .lock()
            .unwrap()
            .push((tool_name.to_string(), arguments.clone()));
        match self.answers.get(tool_name) {
            Some(body) => ToolInvocation {
                output: body.to_string(),
                record: ToolCallRecord::succeeded(
                    call_id,
                    tool_name,
                    arguments.clone(),
                    body.clone(),
                ),
            },
            None => ToolInvocation::failure(
                call_id,
                tool_name,
                arguments.clone(),
                Some(400),
                format!("Unknown action '{tool_name}'"),
            ),
        }
    }
}

/// Recorder keeping every record in memory.
#[derive(Default)]
pub struct CapturingRecorder {
    records: Mutex<Vec<InteractionRecord>>,
}

impl CapturingRecorder {
    pub fn records(&self) -> Vec<InteractionRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl InteractionRecorder for CapturingRecorder {
    async fn record(&self, record: &InteractionRecord) -> Result<(), RelayError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Recorder whose store is always down.
pub struct FailingRecorder;

#[async_trait]
impl InteractionRecorder for FailingRecorder {
    async fn record(&self, _record: &InteractionRecord) -> Result<(), RelayError> {
        Err(RelayError::Persistence("store unavailable".to_string()))
    }
}

//! A full turn through real HTTP clients against mock engine and router.

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use runrelay::config::{PollSettings, RelayConfig};
use runrelay::orchestrator::RunOrchestrator;
use runrelay::recorder::FileInteractionRecorder;
use runrelay::types::TurnRequest;

fn run_body(status: &str) -> serde_json::Value {
    json!({
        "id": "run_e2e",
        "object": "thread.run",
        "thread_id": "thread_e2e",
        "assistant_id": "asst_e2e",
        "status": status
    })
}

async fn mount_engine(engine: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/threads"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "thread_e2e"})))
        .expect(1)
        .mount(engine)
        .await;
    Mock::given(method("POST"))
        .and(path("/threads/thread_e2e/messages"))
        .and(body_json(json!({"role": "user", "content": "What tasks are stored?"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "msg_user"})))
        .expect(1)
        .mount(engine)
        .await;
    Mock::given(method("POST"))
        .and(path("/threads/thread_e2e/runs"))
        .and(body_json(json!({"assistant_id": "asst_e2e"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body("queued")))
        .expect(1)
        .mount(engine)
        .await;

    let mut blocked = run_body("requires_action");
    blocked["required_action"] = json!({
        "type": "submit_tool_outputs",
        "submit_tool_outputs": {"tool_calls": [
            {"id": "call_1", "type": "function",
             "function": {"name": "read_blob_file", "arguments": "{\"file_name\":\"tasks.json\"}"}}
        ]}
    });
    Mock::given(method("GET"))
        .and(path("/threads/thread_e2e/runs/run_e2e"))
        .respond_with(ResponseTemplate::new(200).set_body_json(blocked))
        .up_to_n_times(1)
        .mount(engine)
        .await;
    Mock::given(method("GET"))
        .and(path("/threads/thread_e2e/runs/run_e2e"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body("completed")))
        .mount(engine)
        .await;

    Mock::given(method("POST"))
        .and(path("/threads/thread_e2e/runs/run_e2e/submit_tool_outputs"))
        .and(body_json(json!({"tool_outputs": [
            {"tool_call_id": "call_1", "output": "{\"tasks\":[\"file taxes\"]}"}
        ]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body("queued")))
        .expect(1)
        .mount(engine)
        .await;
    Mock::given(method("GET"))
        .and(path("/threads/thread_e2e/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": "msg_answer", "role": "assistant", "created_at": 2, "run_id": "run_e2e",
                 "content": [{"type": "text", "text": {"value": "You need to file taxes.", "annotations": []}}]},
                {"id": "msg_user", "role": "user", "created_at": 1,
                 "content": [{"type": "text", "text": {"value": "What tasks are stored?", "annotations": []}}]}
            ]
        })))
        .expect(1)
        .mount(engine)
        .await;
}

#[tokio::test]
async fn turn_with_tool_call_completes_and_is_recorded() {
    let engine = MockServer::start().await;
    let router = MockServer::start().await;
    mount_engine(&engine).await;
    Mock::given(method("POST"))
        .and(path("/api/proxy_router"))
        .and(body_json(json!({
            "action": "read_blob_file",
            "params": {"file_name": "tasks.json"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"tasks\":[\"file taxes\"]}"))
        .expect(1)
        .mount(&router)
        .await;

    let store = tempfile::tempdir().unwrap();
    let config = RelayConfig {
        api_key: Some("test-key".to_string()),
        base_url: engine.uri(),
        assistant_id: Some("asst_e2e".to_string()),
        proxy_url: Some(format!("{}/api/proxy_router", router.uri())),
        interaction_dir: Some(store.path().to_path_buf()),
        record_in_background: false,
        poll: PollSettings {
            initial_wait_ms: 5,
            fast_attempts: 2,
            multiplier: 2.0,
            max_wait_ms: 20,
            max_attempts: 10,
        },
        ..RelayConfig::default()
    };
    let orchestrator = RunOrchestrator::from_config(&config).unwrap();

    let outcome = orchestrator
        .handle_turn(
            &TurnRequest::builder()
                .message("What tasks are stored?")
                .user_id("user_e2e")
                .build(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.response, "You need to file taxes.");
    assert_eq!(outcome.thread_id, "thread_e2e");
    assert_eq!(outcome.run_id, "run_e2e");
    assert_eq!(outcome.tool_calls_count(), 1);
    assert_eq!(outcome.polls, 2);

    let records = FileInteractionRecorder::new(store.path())
        .load("user_e2e")
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].assistant_response, "You need to file taxes.");
    assert_eq!(records[0].tool_calls[0].result, Some(json!({"tasks": ["file taxes"]})));
}

#[tokio::test]
async fn from_config_requires_credentials() {
    let config = RelayConfig {
        assistant_id: Some("asst".to_string()),
        proxy_url: Some("http://127.0.0.1:1/api/proxy_router".to_string()),
        ..RelayConfig::default()
    };

    let err = RunOrchestrator::from_config(&config).err().unwrap();
    assert!(err.to_string().contains("OPENAI_API_KEY"));
}

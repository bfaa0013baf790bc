//! Tests for loading relay configuration from TOML files.

use std::time::Duration;

use pretty_assertions::assert_eq;

use runrelay::config::RelayConfig;
use runrelay::error::RelayError;

#[test]
fn toml_file_overrides_defaults_and_keeps_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("relay.toml");
    std::fs::write(
        &path,
        r#"
assistant_id = "asst_file"
proxy_url = "https://proxy.test/api/proxy_router"
interaction_dir = "/var/lib/runrelay"
tool_timeout_secs = 12

[poll]
initial_wait_ms = 250
max_attempts = 20
"#,
    )
    .unwrap();

    let config = RelayConfig::from_file(&path).unwrap();

    assert_eq!(config.assistant_id().unwrap(), "asst_file");
    assert_eq!(config.tool_timeout(), Duration::from_secs(12));
    assert_eq!(config.request_timeout(), Duration::from_secs(60));
    assert_eq!(config.bind_addr, "127.0.0.1:7071");
    assert!(config.record_in_background);

    let schedule = config.backoff_schedule();
    assert_eq!(schedule.initial_wait, Duration::from_millis(250));
    assert_eq!(schedule.fast_attempts, 4);
    assert_eq!(schedule.max_wait, Duration::from_secs(4));
    assert_eq!(schedule.max_attempts, 20);
}

#[test]
fn malformed_file_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "poll = [not valid").unwrap();

    let err = RelayConfig::from_file(&path).unwrap_err();

    match err {
        RelayError::Configuration(message) => assert!(message.contains("broken.toml")),
        other => panic!("expected configuration error, got {other:?}"),
    }
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = RelayConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, RelayError::Io(_)));
}

#[test]
fn zero_poll_attempts_fail_validation() {
    let config = RelayConfig::from_toml_str(
        r#"
api_key = "sk-test"
assistant_id = "asst_1"
proxy_url = "https://proxy.test/api/proxy_router"

[poll]
max_attempts = 0
"#,
    )
    .unwrap();

    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("max_attempts"));
}

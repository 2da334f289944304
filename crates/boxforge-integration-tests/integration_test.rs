//! Integration tests spanning `boxforge-config` and `boxforge-runtime`:
//! parsing a runtime config, validating it, and wiring its box definitions
//! into a live `Runtime` the way `boxforge-cli run` does.

#[path = "support.rs"]
mod support;

use boxforge_config::{parse_config_from_str, validate_config, ConfigError};
use boxforge_runtime::{BoxOptions, InMemorySandbox};
use std::sync::Arc;
use std::time::Duration;
use support::test_runtime;

const SAMPLE_CONFIG: &str = r#"
runtime:
  name: demo
  version: 0.1.0
  default_request_timeout_ms: 5000

boxes:
  - name: worker
    program: ["worker-guest"]
    auto_start: true
    message_handlers: ["echo"]
  - name: sender
    program: ["sender-guest"]
    task: "kickoff"
"#;

#[test]
fn parses_and_validates_sample_config() {
    let config = parse_config_from_str(SAMPLE_CONFIG).unwrap();
    validate_config(&config).unwrap();

    assert_eq!(config.runtime.name, "demo");
    assert_eq!(config.runtime.default_request_timeout_ms, 5000);
    assert_eq!(config.boxes.len(), 2);
    assert_eq!(config.boxes[0].message_handlers, vec!["echo".to_string()]);
    assert_eq!(config.boxes[1].task.as_deref(), Some("kickoff"));
}

#[test]
fn rejects_config_with_duplicate_box_names() {
    let yaml = r#"
runtime:
  name: demo
  version: 0.1.0
boxes:
  - name: a
    program: ["./a"]
  - name: a
    program: ["./a2"]
"#;
    let config = parse_config_from_str(yaml).unwrap();
    assert!(matches!(
        validate_config(&config),
        Err(ConfigError::DuplicateBoxName(_))
    ));
}

/// A config's box definitions drive `Runtime::create_box` + the
/// `task`/`on_message`/`on_event` registration calls the same way
/// `boxforge-cli run` does, independent of which sandbox adapter backs it.
#[tokio::test]
async fn config_boxes_register_against_a_live_runtime() {
    let config = parse_config_from_str(SAMPLE_CONFIG).unwrap();
    validate_config(&config).unwrap();

    let sandbox = Arc::new(InMemorySandbox::new());
    let runtime = test_runtime(sandbox);

    for def in &config.boxes {
        let managed = runtime
            .create_box(
                def.name.clone(),
                def.program.clone(),
                BoxOptions {
                    env: def.env.clone(),
                    timeout: Some(Duration::from_millis(config.runtime.default_request_timeout_ms)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        if let Some(task) = &def.task {
            managed.task(task.clone()).await;
        }
        for handler in &def.message_handlers {
            managed.on_message(handler.clone()).await;
        }
    }

    let mut names = runtime.list_boxes().await;
    names.sort();
    assert_eq!(names, vec!["sender".to_string(), "worker".to_string()]);
}

#[test]
fn rejects_config_with_empty_program() {
    let yaml = r#"
runtime:
  name: demo
  version: 0.1.0
boxes:
  - name: a
    program: []
"#;
    let config = parse_config_from_str(yaml).unwrap();
    assert!(matches!(
        validate_config(&config),
        Err(ConfigError::EmptyProgram(_))
    ));
}

#[test]
fn rejects_config_with_no_boxes() {
    let yaml = r#"
runtime:
  name: demo
  version: 0.1.0
boxes: []
"#;
    let config = parse_config_from_str(yaml).unwrap();
    assert!(matches!(validate_config(&config), Err(ConfigError::NoBoxesDefined)));
}

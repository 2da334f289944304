//! Entry point a guest binary's `main` calls into: read the manifest the
//! host prepared, install the named handlers it lists, run the startup task
//! if any, then sit in the event loop.

use crate::dispatch::{on_event, on_message};
use crate::error::{GuestError, Result};
use crate::registry::{find_event_handler, find_message_handler, find_task};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;

const MANIFEST_ENV: &str = "BOXLITE_HANDLER_MANIFEST";
const MANIFEST_PATH_ENV: &str = "BOXLITE_HANDLER_MANIFEST_PATH";
const BOX_NAME_ENV: &str = "BOXLITE_BOX_NAME";

/// Mirrors the JSON object produced by `boxforge_codegen::build_manifest`.
#[derive(Debug, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub task_name: Option<String>,
    #[serde(default)]
    pub message_handler_names: Vec<String>,
    #[serde(default)]
    pub event_handler_names: HashMap<String, Vec<String>>,
}

/// Read `BOXLITE_BOX_NAME` and the handler manifest (from
/// `BOXLITE_HANDLER_MANIFEST` directly, or a file named by
/// `BOXLITE_HANDLER_MANIFEST_PATH`), install every named handler by looking
/// it up in the compiled-in registry, run the task if one was named, then
/// run the event loop if any handler was installed.
///
/// Panics if a named handler is not found in the registry: that means the
/// guest binary was built from a different version than the host expects,
/// which is a deployment error, not something to recover from at runtime.
pub fn run_from_manifest() -> Result<()> {
    let box_name = env::var(BOX_NAME_ENV).map_err(|_| {
        GuestError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{BOX_NAME_ENV} not set in guest environment"),
        ))
    })?;
    crate::api::set_box_name(box_name);

    let manifest = load_manifest()?;
    install_manifest(&manifest);

    if let Some(task_name) = &manifest.task_name {
        let task = find_task(task_name)
            .unwrap_or_else(|| panic!("guest binary has no compiled-in task named {task_name:?}"));
        task();
    }

    let installed_any =
        !manifest.message_handler_names.is_empty() || !manifest.event_handler_names.is_empty();
    if installed_any {
        crate::api::run_forever()
    } else {
        Ok(())
    }
}

fn load_manifest() -> Result<Manifest> {
    let raw = if let Ok(inline) = env::var(MANIFEST_ENV) {
        inline
    } else {
        let path = env::var(MANIFEST_PATH_ENV).map_err(|_| {
            GuestError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("neither {MANIFEST_ENV} nor {MANIFEST_PATH_ENV} set"),
            ))
        })?;
        std::fs::read_to_string(path)?
    };
    Ok(serde_json::from_str(&raw)?)
}

fn install_manifest(manifest: &Manifest) {
    for name in &manifest.message_handler_names {
        let func = find_message_handler(name)
            .unwrap_or_else(|| panic!("guest binary has no compiled-in message handler named {name:?}"));
        on_message(move |sender, data| func(sender, data));
    }
    for (event, names) in &manifest.event_handler_names {
        for name in names {
            let func = find_event_handler(name).unwrap_or_else(|| {
                panic!("guest binary has no compiled-in event handler named {name:?}")
            });
            on_event(event.clone(), move |data| func(data));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_defaults_are_empty() {
        let manifest: Manifest = serde_json::from_str("{}").unwrap();
        assert!(manifest.task_name.is_none());
        assert!(manifest.message_handler_names.is_empty());
        assert!(manifest.event_handler_names.is_empty());
    }

    #[test]
    fn manifest_parses_full_shape() {
        let json = r#"{
            "task_name": "startup",
            "message_handler_names": ["echo"],
            "event_handler_names": {"ping": ["on_ping"]}
        }"#;
        let manifest: Manifest = serde_json::from_str(json).unwrap();
        assert_eq!(manifest.task_name.as_deref(), Some("startup"));
        assert_eq!(manifest.message_handler_names, vec!["echo".to_string()]);
        assert_eq!(
            manifest.event_handler_names.get("ping").unwrap(),
            &vec!["on_ping".to_string()]
        );
    }
}

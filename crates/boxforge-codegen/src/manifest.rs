//! Builds the JSON manifest a host hands a guest process at launch, telling
//! it which of its compiled-in handlers (by name, see `boxforge-guest`'s
//! registry) to install and in what order.

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CodegenError>;

/// The names a `ManagedBox` has registered, in registration order, ready to
/// serialize as the guest's startup manifest.
#[derive(Debug, Clone, Default)]
pub struct ManifestSource {
    pub task_name: Option<String>,
    pub message_handler_names: Vec<String>,
    pub event_handler_names: BTreeMap<String, Vec<String>>,
}

#[derive(Serialize)]
struct ManifestWire<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    task_name: &'a Option<String>,
    message_handler_names: &'a [String],
    event_handler_names: &'a BTreeMap<String, Vec<String>>,
}

/// Serialize a box's registered handler names into manifest JSON.
pub fn build_manifest(source: &ManifestSource) -> Result<String> {
    let wire = ManifestWire {
        task_name: &source.task_name,
        message_handler_names: &source.message_handler_names,
        event_handler_names: &source.event_handler_names,
    };
    Ok(serde_json::to_string(&wire)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_empty_manifest() {
        let source = ManifestSource::default();
        let json = build_manifest(&source).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.get("task_name").is_none());
        assert_eq!(value["message_handler_names"], serde_json::json!([]));
    }

    #[test]
    fn builds_full_manifest() {
        let mut event_handler_names = BTreeMap::new();
        event_handler_names.insert("ping".to_string(), vec!["on_ping".to_string()]);
        let source = ManifestSource {
            task_name: Some("startup".to_string()),
            message_handler_names: vec!["echo".to_string()],
            event_handler_names,
        };
        let json = build_manifest(&source).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["task_name"], "startup");
        assert_eq!(value["message_handler_names"][0], "echo");
        assert_eq!(value["event_handler_names"]["ping"][0], "on_ping");
    }
}

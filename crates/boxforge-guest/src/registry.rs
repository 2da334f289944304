//! Process-wide, string-keyed registry of handler functions compiled into a
//! guest binary. This is the Rust answer to the closure-serialization
//! problem described for the handler-injection component: a guest binary
//! cannot receive a host closure across the process boundary, so instead it
//! carries every handler it was compiled with, tagged by name, and the host
//! tells it (via the startup manifest) which names to install and in what
//! order.
//!
//! Entries are collected with `inventory`, so `#[box_handler]` /
//! `#[box_event_handler]` / `#[box_task]` (from `boxforge-macro`) can submit
//! an entry from anywhere in the guest binary without any central list.

use serde_json::Value;

pub type MessageHandlerFn = fn(&str, Value) -> Result<Value, String>;
pub type EventHandlerFn = fn(Value);
pub type TaskFn = fn();

pub struct NamedMessageHandler {
    pub name: &'static str,
    pub func: MessageHandlerFn,
}
inventory::collect!(NamedMessageHandler);

pub struct NamedEventHandler {
    pub name: &'static str,
    pub func: EventHandlerFn,
}
inventory::collect!(NamedEventHandler);

pub struct NamedTask {
    pub name: &'static str,
    pub func: TaskFn,
}
inventory::collect!(NamedTask);

/// Look up a compiled-in message handler by the name given to `#[box_handler]`.
pub fn find_message_handler(name: &str) -> Option<MessageHandlerFn> {
    inventory::iter::<NamedMessageHandler>()
        .into_iter()
        .find(|h| h.name == name)
        .map(|h| h.func)
}

/// Look up a compiled-in event handler by the name given to `#[box_event_handler]`.
pub fn find_event_handler(name: &str) -> Option<EventHandlerFn> {
    inventory::iter::<NamedEventHandler>()
        .into_iter()
        .find(|h| h.name == name)
        .map(|h| h.func)
}

/// Look up a compiled-in one-shot task by the name given to `#[box_task]`.
pub fn find_task(name: &str) -> Option<TaskFn> {
    inventory::iter::<NamedTask>()
        .into_iter()
        .find(|h| h.name == name)
        .map(|h| h.func)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_handler(_sender: &str, data: Value) -> Result<Value, String> {
        Ok(data)
    }

    inventory::submit! {
        NamedMessageHandler { name: "sample", func: sample_handler }
    }

    #[test]
    fn finds_submitted_handler_by_name() {
        let found = find_message_handler("sample").expect("registered above");
        assert_eq!(found("a", Value::Bool(true)).unwrap(), Value::Bool(true));
    }

    #[test]
    fn missing_handler_is_none() {
        assert!(find_message_handler("does-not-exist").is_none());
    }
}

//! The dynamic, ordered set of handlers actually installed for this guest
//! process, and the dispatch rules from the message/event loop.
//!
//! This is separate from [`crate::registry`]: the registry holds every
//! handler the binary was *compiled* with, keyed by name; this module holds
//! the subset that was *installed* for this run (via `on_message`/`on_event`,
//! whether called directly by a hand-written guest `main` or indirectly by
//! [`crate::bootstrap::run_from_manifest`]), in registration order.

use boxforge_proto::{Frame, Outcome};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

type MessageHandler = Box<dyn Fn(&str, Value) -> Result<Value, String> + Send + Sync>;
type EventHandler = Box<dyn Fn(Value) + Send + Sync>;

#[derive(Default)]
struct DispatchTable {
    message_handlers: Vec<MessageHandler>,
    event_handlers: HashMap<String, Vec<EventHandler>>,
}

static TABLE: OnceLock<Mutex<DispatchTable>> = OnceLock::new();

fn table() -> &'static Mutex<DispatchTable> {
    TABLE.get_or_init(|| Mutex::new(DispatchTable::default()))
}

/// Register a message handler, `Fn(sender, data) -> Result<response, error>`.
/// Handlers are tried in registration order; the first that does not error
/// decides the response.
pub fn on_message<F>(handler: F)
where
    F: Fn(&str, Value) -> Result<Value, String> + Send + Sync + 'static,
{
    table()
        .lock()
        .expect("dispatch table poisoned")
        .message_handlers
        .push(Box::new(handler));
}

/// Register a handler for a specific event name. Multiple handlers per event
/// are permitted and run in registration order.
pub fn on_event<F>(event: impl Into<String>, handler: F)
where
    F: Fn(Value) + Send + Sync + 'static,
{
    table()
        .lock()
        .expect("dispatch table poisoned")
        .event_handlers
        .entry(event.into())
        .or_default()
        .push(Box::new(handler));
}

pub(crate) fn has_any_handlers() -> bool {
    let t = table().lock().expect("dispatch table poisoned");
    !t.message_handlers.is_empty() || !t.event_handlers.is_empty()
}

/// The outcome of dispatching one inbound frame that is not a reply to an
/// in-flight `send_message`.
pub(crate) enum DispatchOutcome {
    /// Nothing to do, or a fire-and-forget handler already ran.
    Continue,
    /// The host asked the loop to exit.
    Shutdown,
}

/// Apply the message/event/shutdown dispatch rules to one inbound frame.
/// Shared by `run_forever`'s top-level loop and `send_message`'s nested read
/// loop so that a guest blocked sending still answers messages aimed at it.
pub(crate) fn dispatch_inbound(frame: Frame) -> DispatchOutcome {
    match frame {
        Frame::Message {
            sender,
            data,
            request_id,
        } => {
            let response = run_message_handlers(&sender, data);
            let outcome = match response {
                Ok(value) => Outcome::Result(value),
                Err(error) => Outcome::Error(error),
            };
            crate::io::write_frame(&Frame::Response {
                request_id,
                outcome,
            });
            DispatchOutcome::Continue
        }
        Frame::Event { event, data } => {
            invoke_event_handlers(&event, data);
            DispatchOutcome::Continue
        }
        Frame::Shutdown => DispatchOutcome::Shutdown,
        // `Send`/`Publish`/`Response`/`Reply` are outbound-only shapes from the
        // guest's perspective, or were already matched by the caller before
        // reaching here; anything else is forward-compat noise.
        _ => DispatchOutcome::Continue,
    }
}

fn run_message_handlers(sender: &str, data: Value) -> Result<Value, String> {
    let t = table().lock().expect("dispatch table poisoned");
    if t.message_handlers.is_empty() {
        return Ok(Value::Null);
    }
    let mut last_error: Option<String> = None;
    for handler in &t.message_handlers {
        match handler(sender, data.clone()) {
            Ok(value) => return Ok(value),
            Err(e) => last_error = Some(e),
        }
    }
    Err(last_error.unwrap_or_else(|| "no message handler registered".to_string()))
}

fn invoke_event_handlers(event: &str, data: Value) {
    let t = table().lock().expect("dispatch table poisoned");
    if let Some(handlers) = t.event_handlers.get(event) {
        for handler in handlers {
            handler(data.clone());
        }
    }
}

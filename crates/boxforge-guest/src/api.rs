//! Public guest-side API: `send_message`, `publish_event`, the event loop,
//! and handler registration.
//!
//! `send_message` is nesting-tolerant: a handler invoked from `run_forever`
//! may itself call `send_message`, which means a single thread can have
//! several sends awaiting a reply at once, innermost first. Rather than a
//! call stack of reader state, every waiting call shares one stdin and a
//! stash of replies that arrived for someone else's request id; a reply that
//! doesn't match the current wait is stashed and the read loop continues,
//! so whichever call is waiting on that id picks it up, either directly off
//! stdin or out of the stash, without the two calls coordinating explicitly.

use crate::dispatch::{dispatch_inbound, has_any_handlers, DispatchOutcome};
use crate::error::{GuestError, Result};
use crate::io::{read_frame, write_frame};
use boxforge_proto::{Frame, Outcome};
use serde_json::Value;
use std::collections::HashMap;
use std::io::{BufReader, Stdin};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, OnceLock};
use uuid::Uuid;

pub use crate::dispatch::{on_event, on_message};

static BOX_NAME: OnceLock<String> = OnceLock::new();
static STOPPED: AtomicBool = AtomicBool::new(false);
static STDIN: OnceLock<Mutex<BufReader<Stdin>>> = OnceLock::new();
static REPLY_STASH: OnceLock<Mutex<HashMap<String, Outcome>>> = OnceLock::new();

fn stdin_handle() -> &'static Mutex<BufReader<Stdin>> {
    STDIN.get_or_init(|| Mutex::new(BufReader::new(std::io::stdin())))
}

fn reply_stash() -> &'static Mutex<HashMap<String, Outcome>> {
    REPLY_STASH.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Set once by [`crate::bootstrap::run_from_manifest`] or by a hand-written
/// `main` before calling [`run_forever`]. Panics if called twice.
pub fn set_box_name(name: impl Into<String>) {
    BOX_NAME
        .set(name.into())
        .expect("set_box_name called more than once");
}

/// This box's own name, as given by the host at launch.
pub fn box_name() -> &'static str {
    BOX_NAME
        .get()
        .map(String::as_str)
        .unwrap_or("<unnamed box>")
}

/// Ask the host to deliver `data` to `target` and block for its response.
///
/// Returns `Err(GuestError::Remote(_))` if the target handler raised an
/// error rather than returning a value, and `Err(GuestError::ConnectionClosed)`
/// if the host closes the pipe before a reply arrives.
pub fn send_message(target: &str, data: Value) -> Result<Value> {
    let request_id = Uuid::new_v4().to_string();
    write_frame(&Frame::Send {
        target: target.to_string(),
        data,
        request_id: request_id.clone(),
    });
    wait_for_reply(&request_id)
}

fn wait_for_reply(request_id: &str) -> Result<Value> {
    loop {
        if let Some(outcome) = reply_stash().lock().expect("stash poisoned").remove(request_id) {
            return outcome_to_result(outcome);
        }
        if STOPPED.load(Ordering::SeqCst) {
            return Err(GuestError::ShutdownRequested);
        }
        let frame = {
            let mut guard = stdin_handle().lock().expect("stdin lock poisoned");
            read_frame(&mut *guard)
        };
        match frame {
            None => return Err(GuestError::ConnectionClosed),
            Some(Frame::Reply {
                request_id: rid,
                outcome,
            }) => {
                if rid == request_id {
                    return outcome_to_result(outcome);
                }
                reply_stash().lock().expect("stash poisoned").insert(rid, outcome);
            }
            Some(Frame::Shutdown) => {
                STOPPED.store(true, Ordering::SeqCst);
                return Err(GuestError::ShutdownRequested);
            }
            Some(other) => {
                dispatch_inbound(other);
            }
        }
    }
}

fn outcome_to_result(outcome: Outcome) -> Result<Value> {
    match outcome {
        Outcome::Result(v) => Ok(v),
        Outcome::Error(e) => Err(GuestError::Remote(e)),
    }
}

/// Fire-and-forget fan-out to every box subscribed to `event`.
pub fn publish_event(event: &str, data: Value) {
    write_frame(&Frame::Publish {
        event: event.to_string(),
        data,
    });
}

/// Ask the guest loop to stop at its next opportunity, as if the host had
/// sent a shutdown frame. Safe to call from inside a handler.
pub fn stop() {
    STOPPED.store(true, Ordering::SeqCst);
}

/// Block reading frames from the host and dispatching them to whatever
/// handlers are installed, until the host sends a shutdown frame, stdin is
/// closed, or [`stop`] is called. Returns cleanly in all three cases.
pub fn run_forever() -> Result<()> {
    if !has_any_handlers() {
        // Not an error: a guest with no handlers still answers Shutdown and
        // can still call send_message/publish_event from a task.
    }
    loop {
        if STOPPED.load(Ordering::SeqCst) {
            return Ok(());
        }
        let frame = {
            let mut guard = stdin_handle().lock().expect("stdin lock poisoned");
            read_frame(&mut *guard)
        };
        match frame {
            None => return Ok(()),
            Some(frame) => match dispatch_inbound(frame) {
                DispatchOutcome::Continue => {}
                DispatchOutcome::Shutdown => {
                    STOPPED.store(true, Ordering::SeqCst);
                    return Ok(());
                }
            },
        }
    }
}

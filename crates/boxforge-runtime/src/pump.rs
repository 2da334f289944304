//! Per-box background task that drains a guest's stdout and dispatches each
//! frame by type. This is the host-side mirror of the guest's `run_forever`:
//! where the guest dispatches `message`/`event`/`shutdown`, the pump
//! dispatches `send`/`publish`/`response`.

use crate::managed_box::ManagedBox;
use crate::runtime::Runtime;
use crate::Error;
use boxforge_proto::{decode_line, Frame, Outcome};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Weak};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Reads `stdout` to completion, dispatching every decoded frame. `owner` is
/// the box this stream belongs to (used to answer `send`/`response` back on
/// its own stdin); `runtime` is a weak handle back to the broker so a `send`
/// can be routed to another box and a `publish` can be broadcast.
///
/// Returns when stdout reaches EOF. On return, every entry left in the
/// owning box's pending table is failed with a peer-down error rather than
/// left to time out: a dead guest can never produce the response those
/// calls are waiting for.
pub async fn run_pump(
    owner: Arc<ManagedBox>,
    runtime: Weak<Runtime>,
    mut stdout: Box<dyn AsyncBufRead + Unpin + Send>,
) {
    let mut line = String::new();
    loop {
        line.clear();
        let n = match stdout.read_line(&mut line).await {
            Ok(n) => n,
            Err(e) => {
                eprintln!("boxforge: pump for {:?} failed to read stdout: {e}", owner.name());
                break;
            }
        };
        if n == 0 {
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let Some(frame) = decode_line(trimmed) else {
            owner.malformed_frame_count().fetch_add(1, Ordering::Relaxed);
            continue;
        };

        dispatch(&owner, &runtime, frame).await;
    }

    owner.fail_all_pending().await;
}

async fn dispatch(owner: &Arc<ManagedBox>, runtime: &Weak<Runtime>, frame: Frame) {
    match frame {
        Frame::Send {
            target,
            data,
            request_id,
        } => handle_send(owner, runtime, target, data, request_id).await,
        Frame::Publish { event, data } => handle_publish(owner, runtime, event, data).await,
        Frame::Response {
            request_id,
            outcome,
        } => owner.complete_pending(&request_id, outcome).await,
        // Message/Event/Reply/Shutdown are host -> guest shapes; a box's own
        // stdout should never carry them, but forward-compat says ignore.
        _ => {}
    }
}

async fn handle_send(
    owner: &Arc<ManagedBox>,
    runtime: &Weak<Runtime>,
    target: String,
    data: serde_json::Value,
    request_id: String,
) {
    // A box's own name never resolves as a send target: treat it the same
    // as any other unknown box rather than special-casing self-delivery.
    if target == owner.name() {
        let _ = owner
            .reply(&request_id, Outcome::Error(Error::UnknownBox(target).to_string()))
            .await;
        return;
    }

    let Some(runtime) = runtime.upgrade() else {
        let _ = owner
            .reply(&request_id, Outcome::Error("runtime is shutting down".to_string()))
            .await;
        return;
    };

    let outcome = match runtime.deliver(&target, owner.name(), data).await {
        Ok(value) => Outcome::Result(value),
        Err(e) => Outcome::Error(e.to_string()),
    };
    let _ = owner.reply(&request_id, outcome).await;
}

async fn handle_publish(owner: &Arc<ManagedBox>, runtime: &Weak<Runtime>, event: String, data: serde_json::Value) {
    if let Some(runtime) = runtime.upgrade() {
        runtime.broadcast(&event, data, owner.name()).await;
    }
}

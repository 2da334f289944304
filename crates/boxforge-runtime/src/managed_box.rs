//! A single box's host-side lifecycle: the sandbox it runs in, the guest
//! program's stdio, the table of requests it's currently waiting on a
//! response for, and the registered handler names that become its startup
//! manifest.

use crate::pump::run_pump;
use crate::runtime::Runtime;
use crate::sandbox::{Execution, ProcessHandle, SandboxAdapter, SandboxHandle};
use crate::{Error, Result};
use boxforge_codegen::{build_manifest, ManifestSource};
use boxforge_proto::{encode_line, Frame, Outcome};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{oneshot, Mutex};

/// How long `stop` waits for a guest to exit on its own after sending a
/// polite `Shutdown` frame before force-killing its process.
const STOP_GRACE_PERIOD: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Default)]
struct Registration {
    task_name: Option<String>,
    message_handler_names: Vec<String>,
    event_handler_names: HashMap<String, Vec<String>>,
}

struct RunningState {
    stdin: Mutex<Box<dyn AsyncWrite + Unpin + Send>>,
    process_handle: Mutex<Box<dyn ProcessHandle>>,
    pump_task: tokio::task::JoinHandle<()>,
}

/// Host-side handle to one box: its sandbox, its registered handlers, and
/// (once running) its guest process's stdio.
pub struct ManagedBox {
    name: String,
    sandbox: Arc<dyn SandboxAdapter>,
    sandbox_image: Option<String>,
    program: Vec<String>,
    env: HashMap<String, String>,
    default_timeout: Duration,
    registration: Mutex<Registration>,
    sandbox_handle: Mutex<Option<SandboxHandle>>,
    running: Mutex<Option<RunningState>>,
    pending: Mutex<HashMap<String, oneshot::Sender<Outcome>>>,
    malformed_frame_count: AtomicU64,
}

impl ManagedBox {
    pub fn new(
        name: impl Into<String>,
        sandbox: Arc<dyn SandboxAdapter>,
        program: Vec<String>,
        env: HashMap<String, String>,
        sandbox_image: Option<String>,
        default_timeout: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            sandbox,
            sandbox_image,
            program,
            env,
            default_timeout,
            registration: Mutex::new(Registration::default()),
            sandbox_handle: Mutex::new(None),
            running: Mutex::new(None),
            pending: Mutex::new(HashMap::new()),
            malformed_frame_count: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn malformed_frame_count(&self) -> &AtomicU64 {
        &self.malformed_frame_count
    }

    /// Number of `deliver` calls into this box still awaiting a `Response`.
    /// Exposed for tests asserting the pending table drains after a
    /// success, failure, or timeout.
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Registers the startup task run once before the box's event loop
    /// begins taking messages. Last registration wins.
    pub async fn task(&self, name: impl Into<String>) {
        self.registration.lock().await.task_name = Some(name.into());
    }

    /// Registers a handler name to be installed for inbound `Message`
    /// frames, tried in registration order until one claims the message.
    pub async fn on_message(&self, handler_name: impl Into<String>) {
        self.registration
            .lock()
            .await
            .message_handler_names
            .push(handler_name.into());
    }

    /// Registers a handler name to be installed for a specific event name.
    pub async fn on_event(&self, event: impl Into<String>, handler_name: impl Into<String>) {
        self.registration
            .lock()
            .await
            .event_handler_names
            .entry(event.into())
            .or_default()
            .push(handler_name.into());
    }

    /// Brings the sandbox up. Idempotent: calling it again once the sandbox
    /// is already up is a no-op.
    pub async fn start(&self) -> Result<()> {
        let mut slot = self.sandbox_handle.lock().await;
        if slot.is_some() {
            return Ok(());
        }
        let handle = self.sandbox.create(self.sandbox_image.as_deref(), &self.name).await?;
        self.sandbox.start(&handle).await?;
        *slot = Some(handle);
        Ok(())
    }

    /// Builds the startup manifest from registered handlers, launches the
    /// guest program inside the sandbox, and starts the background pump
    /// that drains its stdout. Fails if nothing has been registered, or if
    /// the box is already running.
    pub async fn run(self: &Arc<Self>, runtime: Weak<Runtime>, extra_env: HashMap<String, String>) -> Result<()> {
        {
            let running = self.running.lock().await;
            if running.is_some() {
                return Err(Error::AlreadyRunning(self.name.clone()));
            }
        }

        self.start().await?;

        let registration = self.registration.lock().await.clone();
        if registration.task_name.is_none()
            && registration.message_handler_names.is_empty()
            && registration.event_handler_names.is_empty()
        {
            return Err(Error::NothingRegistered(self.name.clone()));
        }

        let manifest = build_manifest(&ManifestSource {
            task_name: registration.task_name,
            message_handler_names: registration.message_handler_names,
            event_handler_names: registration.event_handler_names.into_iter().collect(),
        })?;

        let mut env = self.env.clone();
        env.extend(extra_env);
        env.insert("BOXLITE_BOX_NAME".to_string(), self.name.clone());
        env.insert("BOXLITE_HANDLER_MANIFEST".to_string(), manifest);

        let handle = self
            .sandbox_handle
            .lock()
            .await
            .clone()
            .ok_or_else(|| Error::NotRunning(self.name.clone()))?;

        let Execution {
            stdin,
            stdout,
            handle: process_handle,
        } = self.sandbox.exec(&handle, &self.program, &env).await?;

        let self_arc = Arc::clone(self);
        let pump_task = tokio::spawn(async move {
            run_pump(self_arc, runtime, stdout).await;
        });

        *self.running.lock().await = Some(RunningState {
            stdin: Mutex::new(stdin),
            process_handle: Mutex::new(process_handle),
            pump_task,
        });

        Ok(())
    }

    /// Waits for the guest process to exit and returns its exit code.
    pub async fn wait(&self) -> Result<i32> {
        let mut slot = self.running.lock().await;
        let state = slot.take().ok_or_else(|| Error::NotRunning(self.name.clone()))?;
        let code = state.process_handle.lock().await.wait().await?;
        state.pump_task.abort();
        self.fail_all_pending().await;
        Ok(code)
    }

    /// Asks the guest to shut down, then kills it and tears the sandbox
    /// down. Idempotent: safe to call on a box that was never started.
    pub async fn stop(&self) -> Result<()> {
        if let Some(state) = self.running.lock().await.take() {
            let _ = write_frame(&state.stdin, &Frame::Shutdown).await;

            let exited = {
                let mut handle = state.process_handle.lock().await;
                tokio::time::timeout(STOP_GRACE_PERIOD, handle.wait()).await.is_ok()
            };
            if !exited {
                let _ = state.process_handle.lock().await.kill().await;
            }

            state.pump_task.abort();
        }

        if let Some(handle) = self.sandbox_handle.lock().await.take() {
            let _ = self.sandbox.stop(&handle).await;
        }

        self.fail_all_pending().await;
        Ok(())
    }

    /// Pushes a `Message` frame into the guest and waits (up to this box's
    /// configured timeout) for the matching `Response`.
    pub async fn deliver(&self, sender: &str, data: serde_json::Value) -> Result<serde_json::Value> {
        let request_id = uuid::Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(request_id.clone(), tx);

        let frame = Frame::Message {
            sender: sender.to_string(),
            data,
            request_id: request_id.clone(),
        };
        if self.write_frame(&frame).await.is_err() {
            self.pending.lock().await.remove(&request_id);
            return Err(Error::PeerDown(self.name.clone()));
        }

        match tokio::time::timeout(self.default_timeout, rx).await {
            Ok(Ok(outcome)) => outcome_to_result(outcome, &self.name),
            Ok(Err(_canceled)) => Err(Error::PeerDown(self.name.clone())),
            Err(_elapsed) => {
                self.pending.lock().await.remove(&request_id);
                Err(Error::Timeout(self.name.clone()))
            }
        }
    }

    /// Writes an untagged `Reply` frame answering a guest-issued `Send`.
    pub async fn reply(&self, request_id: &str, outcome: Outcome) -> Result<()> {
        self.write_frame(&Frame::Reply {
            request_id: request_id.to_string(),
            outcome,
        })
        .await
    }

    /// Resolves a pending [`deliver`](Self::deliver) call by its request id,
    /// as invoked by this box's own pump when a `Response` frame arrives.
    pub async fn complete_pending(&self, request_id: &str, outcome: Outcome) {
        if let Some(tx) = self.pending.lock().await.remove(request_id) {
            let _ = tx.send(outcome);
        }
    }

    /// Best-effort fan-out write; errors are swallowed by the caller
    /// (broadcast to a dead box shouldn't fail the publish for everyone
    /// else).
    pub async fn write_frame(&self, frame: &Frame) -> Result<()> {
        let running = self.running.lock().await;
        let state = running.as_ref().ok_or_else(|| Error::PeerDown(self.name.clone()))?;
        write_frame(&state.stdin, frame).await
    }

    /// Drains the pending table, failing every in-flight `deliver` call
    /// with a peer-down error. Called when the guest's stdout reaches EOF
    /// or when the box is stopped.
    pub(crate) async fn fail_all_pending(&self) {
        // Dropping the senders, rather than sending an explicit outcome,
        // is enough: the receiving `deliver` call observes a closed
        // channel and maps that to `Error::PeerDown` itself.
        self.pending.lock().await.clear();
    }
}

async fn write_frame(stdin: &Mutex<Box<dyn AsyncWrite + Unpin + Send>>, frame: &Frame) -> Result<()> {
    let line = encode_line(frame)?;
    let mut guard = stdin.lock().await;
    guard.write_all(line.as_bytes()).await?;
    guard.flush().await?;
    Ok(())
}

fn outcome_to_result(outcome: Outcome, box_name: &str) -> Result<serde_json::Value> {
    match outcome {
        Outcome::Result(v) => Ok(v),
        Outcome::Error(e) => Err(Error::HandlerFailed(format!("{box_name}: {e}"))),
    }
}

//! The broker: owns every [`ManagedBox`] in a run, and is the thing the
//! pump calls back into to route a `send` to its target or fan a `publish`
//! out to everyone else.

use crate::managed_box::ManagedBox;
use crate::sandbox::SandboxAdapter;
use crate::{Error, Result};
use boxforge_proto::Frame;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Per-box settings a caller can override when registering it with the
/// broker; fields left `None` fall back to the runtime's defaults.
#[derive(Debug, Clone, Default)]
pub struct BoxOptions {
    pub sandbox_image: Option<String>,
    pub env: HashMap<String, String>,
    pub timeout: Option<Duration>,
}

/// Owns the set of boxes in one run and routes messages between them.
///
/// Boxes are kept in a `Vec` rather than a `HashMap` so that `list_boxes`,
/// `broadcast`, and `wait_all` iterate in creation order, as the registry
/// is specified to behave.
pub struct Runtime {
    sandbox: Arc<dyn SandboxAdapter>,
    default_timeout: Duration,
    boxes: Mutex<Vec<(String, Arc<ManagedBox>)>>,
}

impl Runtime {
    pub fn new(sandbox: Arc<dyn SandboxAdapter>, default_timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            sandbox,
            default_timeout,
            boxes: Mutex::new(Vec::new()),
        })
    }

    /// Registers a new box under `name` with the given guest program argv.
    /// Fails if a box with that name already exists.
    pub async fn create_box(
        self: &Arc<Self>,
        name: impl Into<String>,
        program: Vec<String>,
        options: BoxOptions,
    ) -> Result<Arc<ManagedBox>> {
        let name = name.into();
        let mut boxes = self.boxes.lock().await;
        if boxes.iter().any(|(n, _)| n == &name) {
            return Err(Error::DuplicateName(name));
        }

        let managed = Arc::new(ManagedBox::new(
            name.clone(),
            Arc::clone(&self.sandbox),
            program,
            options.env,
            options.sandbox_image,
            options.timeout.unwrap_or(self.default_timeout),
        ));
        boxes.push((name, Arc::clone(&managed)));
        Ok(managed)
    }

    /// Launches a registered box's guest program and starts its pump.
    /// Convenience wrapper over `ManagedBox::run` that supplies the weak
    /// back-reference the pump needs to route `send`/`publish` frames.
    pub async fn run_box(self: &Arc<Self>, name: &str, extra_env: HashMap<String, String>) -> Result<()> {
        let managed = self
            .get_box(name)
            .await
            .ok_or_else(|| Error::UnknownBox(name.to_string()))?;
        managed.run(Arc::downgrade(self), extra_env).await
    }

    pub async fn get_box(&self, name: &str) -> Option<Arc<ManagedBox>> {
        self.boxes.lock().await.iter().find(|(n, _)| n == name).map(|(_, b)| Arc::clone(b))
    }

    /// Snapshot of registered box names, in creation order.
    pub async fn list_boxes(&self) -> Vec<String> {
        self.boxes.lock().await.iter().map(|(n, _)| n.clone()).collect()
    }

    /// Routes a `send` from `sender` to `target`: looks `target` up and
    /// delivers `data` into it, awaiting its response.
    pub async fn deliver(&self, target: &str, sender: &str, data: serde_json::Value) -> Result<serde_json::Value> {
        let target_box = self
            .boxes
            .lock()
            .await
            .iter()
            .find(|(n, _)| n == target)
            .map(|(_, b)| Arc::clone(b))
            .ok_or_else(|| Error::UnknownBox(target.to_string()))?;
        target_box.deliver(sender, data).await
    }

    /// Fans an event out to every box except `except`, in registry order.
    /// Per-box write failures are swallowed: one dead box must not stop the
    /// event from reaching everyone else.
    pub async fn broadcast(&self, event: &str, data: serde_json::Value, except: &str) {
        let targets: Vec<Arc<ManagedBox>> = self
            .boxes
            .lock()
            .await
            .iter()
            .filter(|(name, _)| name.as_str() != except)
            .map(|(_, b)| Arc::clone(b))
            .collect();

        let frame = Frame::Event {
            event: event.to_string(),
            data,
        };
        for b in targets {
            let _ = b.write_frame(&frame).await;
        }
    }

    /// Waits for every box's guest process to exit, in registry order, up
    /// to `timeout` total if given. Returns one slot per box: its exit code
    /// if it exited in time, `None` if it did not (or `timeout` elapsed
    /// before its turn came up at all).
    pub async fn wait_all(&self, timeout: Option<Duration>) -> Vec<(String, Option<i32>)> {
        let boxes: Vec<(String, Arc<ManagedBox>)> = self.boxes.lock().await.clone();
        let deadline = timeout.map(|d| tokio::time::Instant::now() + d);

        let mut results = Vec::with_capacity(boxes.len());
        for (name, b) in boxes {
            let code = match deadline {
                None => b.wait().await.ok(),
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
                    match tokio::time::timeout(remaining, b.wait()).await {
                        Ok(result) => result.ok(),
                        Err(_elapsed) => None,
                    }
                }
            };
            results.push((name, code));
        }
        results
    }

    /// Stops every box: sends shutdown, kills the guest, tears the sandbox
    /// down. Best-effort; a single box failing to stop does not block the
    /// rest.
    pub async fn stop_all(&self) {
        let boxes: Vec<Arc<ManagedBox>> = self.boxes.lock().await.iter().map(|(_, b)| Arc::clone(b)).collect();
        for b in boxes {
            if let Err(e) = b.stop().await {
                eprintln!("boxforge: failed to stop box {:?}: {e}", b.name());
            }
        }
    }

    /// Stops every box and drops them from the registry.
    pub async fn shutdown(&self) {
        self.stop_all().await;
        self.boxes.lock().await.clear();
    }
}

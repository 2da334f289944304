//! The sandbox is a capability the broker depends on but does not
//! implement: something that can stand up an isolated place to run a guest
//! program and hand back its stdio. Two reference adapters are provided.
//! `LocalProcessSandbox` runs the guest as a real child OS process (grounded
//! on the teacher's `CliHandler`, which already wraps `tokio::process::Command`
//! with piped stdio and a timeout). `InMemorySandbox` runs a guest as an
//! in-process task talking over a `tokio::io::duplex` pipe, for fast
//! deterministic tests that don't want to pay for a process boundary.
//!
//! [`Execution`] hands back stdin, stdout and lifecycle control as three
//! independent pieces rather than one object guarded by a single lock: the
//! stream pump holds stdout for as long as the guest runs, while
//! `ManagedBox::deliver` needs to write to stdin at any moment, including
//! while the pump is mid-read. Bundling them behind one mutex would let a
//! blocked read starve an unrelated write.

use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::Mutex;

/// Opaque reference to a sandbox-managed place a guest can run. Adapters may
/// stuff whatever identifying information they need into the string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxHandle(pub String);

/// Lifecycle control for a running guest program, independent of its stdio.
#[async_trait]
pub trait ProcessHandle: Send {
    /// Wait for the guest program to exit and return its exit code.
    async fn wait(&mut self) -> Result<i32>;

    /// Forcibly terminate the guest program.
    async fn kill(&mut self) -> Result<()>;
}

/// A running guest program's stdio and lifecycle, as handed back by
/// [`SandboxAdapter::exec`].
pub struct Execution {
    pub stdin: Box<dyn AsyncWrite + Unpin + Send>,
    pub stdout: Box<dyn AsyncBufRead + Unpin + Send>,
    pub handle: Box<dyn ProcessHandle>,
}

/// What the broker needs from a sandbox: bring an isolated place up, launch
/// a guest program inside it, tear it down.
#[async_trait]
pub trait SandboxAdapter: Send + Sync {
    async fn create(&self, image: Option<&str>, name: &str) -> Result<SandboxHandle>;
    async fn start(&self, handle: &SandboxHandle) -> Result<()>;
    async fn exec(
        &self,
        handle: &SandboxHandle,
        argv: &[String],
        env: &HashMap<String, String>,
    ) -> Result<Execution>;
    async fn stop(&self, handle: &SandboxHandle) -> Result<()>;
}

/// Runs the guest program as a real child process. `image` is accepted and
/// ignored: a bare process has no notion of an image, but the trait is
/// shaped for adapters (containers, microVMs) that do.
#[derive(Debug, Default)]
pub struct LocalProcessSandbox;

impl LocalProcessSandbox {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SandboxAdapter for LocalProcessSandbox {
    async fn create(&self, _image: Option<&str>, name: &str) -> Result<SandboxHandle> {
        Ok(SandboxHandle(name.to_string()))
    }

    async fn start(&self, _handle: &SandboxHandle) -> Result<()> {
        Ok(())
    }

    async fn exec(
        &self,
        _handle: &SandboxHandle,
        argv: &[String],
        env: &HashMap<String, String>,
    ) -> Result<Execution> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| Error::Sandbox("empty program argv".to_string()))?;

        let mut cmd = Command::new(program);
        cmd.args(args);
        for (k, v) in env {
            cmd.env(k, v);
        }
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::Sandbox(format!("failed to spawn {program}: {e}")))?;

        let stdin = child.stdin.take().expect("piped stdin");
        let stdout = BufReader::new(child.stdout.take().expect("piped stdout"));

        Ok(Execution {
            stdin: Box::new(stdin),
            stdout: Box::new(stdout),
            handle: Box::new(LocalProcessHandle { child }),
        })
    }

    async fn stop(&self, _handle: &SandboxHandle) -> Result<()> {
        Ok(())
    }
}

struct LocalProcessHandle {
    child: tokio::process::Child,
}

#[async_trait]
impl ProcessHandle for LocalProcessHandle {
    async fn wait(&mut self) -> Result<i32> {
        let status = self
            .child
            .wait()
            .await
            .map_err(|e| Error::Sandbox(format!("wait failed: {e}")))?;
        Ok(status.code().unwrap_or(-1))
    }

    async fn kill(&mut self) -> Result<()> {
        self.child
            .kill()
            .await
            .map_err(|e| Error::Sandbox(format!("kill failed: {e}")))
    }
}

/// A guest body for [`InMemorySandbox`]: given its end of a duplex pipe,
/// drives it however the test wants (usually `boxforge_guest` against a
/// `tokio::io::split` pair).
pub type InMemoryGuestFn =
    Arc<dyn Fn(tokio::io::DuplexStream) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Runs a "guest" as an in-process task talking over an in-memory duplex
/// pipe rather than a real child process. `argv[0]` is looked up against
/// names registered with [`InMemorySandbox::register`]; there is no real
/// program to exec.
#[derive(Default)]
pub struct InMemorySandbox {
    guests: Mutex<HashMap<String, InMemoryGuestFn>>,
}

impl InMemorySandbox {
    pub fn new() -> Self {
        Self {
            guests: Mutex::new(HashMap::new()),
        }
    }

    pub async fn register(&self, program_name: impl Into<String>, guest: InMemoryGuestFn) {
        self.guests.lock().await.insert(program_name.into(), guest);
    }
}

#[async_trait]
impl SandboxAdapter for InMemorySandbox {
    async fn create(&self, _image: Option<&str>, name: &str) -> Result<SandboxHandle> {
        Ok(SandboxHandle(name.to_string()))
    }

    async fn start(&self, _handle: &SandboxHandle) -> Result<()> {
        Ok(())
    }

    async fn exec(
        &self,
        _handle: &SandboxHandle,
        argv: &[String],
        _env: &HashMap<String, String>,
    ) -> Result<Execution> {
        let program = argv
            .first()
            .ok_or_else(|| Error::Sandbox("empty program argv".to_string()))?;
        let guest = self
            .guests
            .lock()
            .await
            .get(program)
            .cloned()
            .ok_or_else(|| Error::Sandbox(format!("no in-memory guest registered as {program:?}")))?;

        let (host_side, guest_side) = tokio::io::duplex(64 * 1024);
        let task = tokio::spawn(guest(guest_side));
        let (read_half, write_half) = tokio::io::split(host_side);

        Ok(Execution {
            stdin: Box::new(write_half),
            stdout: Box::new(BufReader::new(read_half)),
            handle: Box::new(InMemoryProcessHandle { task: Some(task) }),
        })
    }

    async fn stop(&self, _handle: &SandboxHandle) -> Result<()> {
        Ok(())
    }
}

struct InMemoryProcessHandle {
    task: Option<tokio::task::JoinHandle<()>>,
}

#[async_trait]
impl ProcessHandle for InMemoryProcessHandle {
    async fn wait(&mut self) -> Result<i32> {
        if let Some(task) = self.task.take() {
            task.await
                .map_err(|e| Error::Sandbox(format!("guest task panicked: {e}")))?;
        }
        Ok(0)
    }

    async fn kill(&mut self) -> Result<()> {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        Ok(())
    }
}

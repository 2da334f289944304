//! # boxforge-runtime
//!
//! The host-side broker: brings up sandboxes, launches guest programs inside
//! them, and routes messages between boxes over the line-delimited JSON wire
//! protocol defined by `boxforge-proto`.
//!
//! ## Quick start
//!
//! ```no_run
//! use boxforge_runtime::{BoxOptions, InMemorySandbox, Runtime};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() -> boxforge_runtime::Result<()> {
//! let runtime = Runtime::new(Arc::new(InMemorySandbox::new()), Duration::from_secs(30));
//!
//! let worker = runtime
//!     .create_box("worker", vec!["worker-guest".to_string()], BoxOptions::default())
//!     .await?;
//! worker.on_message("echo").await;
//! runtime.run_box("worker", Default::default()).await?;
//!
//! runtime.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Sandbox adapters**: pluggable [`SandboxAdapter`] trait, with a real
//!   child-process adapter and an in-memory one for deterministic tests.
//! - **Message routing**: point-to-point `send`/`Message` pairs and
//!   fire-and-forget `publish`/`Event` fan-out, brokered by [`Runtime`].
//! - **Per-request timeouts**: every `send` carries its own deadline,
//!   failing the pending call without touching the rest of the box.

pub mod error;
pub mod managed_box;
pub mod pump;
pub mod runtime;
pub mod sandbox;

pub use error::{Error, Result};
pub use managed_box::ManagedBox;
pub use runtime::{BoxOptions, Runtime};
pub use sandbox::{Execution, InMemorySandbox, LocalProcessSandbox, ProcessHandle, SandboxAdapter, SandboxHandle};

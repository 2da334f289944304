//! # boxforge-guest
//!
//! Runtime library linked into every guest binary. Provides the blocking
//! `send_message`/`publish_event` calls, handler registration, the event
//! loop, and the manifest-driven bootstrap that lets a host-assembled
//! manifest install compiled-in handlers by name without the host and guest
//! sharing any closures.
//!
//! A typical guest `main`:
//!
//! ```no_run
//! fn main() -> boxforge_guest::error::Result<()> {
//!     boxforge_guest::bootstrap::run_from_manifest()
//! }
//! ```
//!
//! Handlers are registered at compile time with the `#[box_handler]` and
//! `#[box_event_handler]` attributes from `boxforge-macro`, which submit
//! them into the registry this crate exposes via [`registry`].

pub mod bootstrap;
pub mod dispatch;
pub mod error;
pub mod registry;

mod api;
mod io;

pub use api::{box_name, on_event, on_message, publish_event, send_message, set_box_name, stop, run_forever};

/// Re-exports used by the `#[box_handler]` family of attributes in
/// `boxforge-macro`'s generated code. Not part of the public API.
#[doc(hidden)]
pub mod __private {
    pub use inventory;
}

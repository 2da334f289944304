//! # boxforge-codegen
//!
//! Turns a `ManagedBox`'s registered handler names into the JSON manifest a
//! guest process reads at startup.

pub mod manifest;

pub use manifest::{build_manifest, CodegenError, ManifestSource, Result};

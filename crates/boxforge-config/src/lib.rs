//! # boxforge-config
//!
//! YAML configuration for a boxforge runtime: the boxes it knows how to
//! launch, and the defaults governing delivery timeouts and sandboxing.
//!
//! ## Quick start
//!
//! ```rust
//! use boxforge_config::{parse_config_from_str, validate_config};
//!
//! let yaml = r#"
//! runtime:
//!   name: demo
//!   version: 0.1.0
//!
//! boxes:
//!   - name: echo
//!     program: ["./echo_box"]
//!     auto_start: true
//! "#;
//!
//! let config = parse_config_from_str(yaml).expect("valid config");
//! validate_config(&config).expect("validation passes");
//!
//! assert_eq!(config.runtime.name, "demo");
//! assert_eq!(config.boxes.len(), 1);
//! ```
//!
//! ## Validation rules
//!
//! - Box names must be unique
//! - At least one box must be defined
//! - Every box's program argv must be non-empty

pub mod error;
pub mod parser;
pub mod types;
pub mod validator;

pub use error::{ConfigError, Result};
pub use parser::{parse_config, parse_config_from_str};
pub use types::*;
pub use validator::validate_config;

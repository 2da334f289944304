//! Scaffolds a guest-program crate: a binary linking `boxforge-guest` with
//! one example message handler already wired up, plus a runtime config that
//! launches it as a single box. The template content lives inline here
//! rather than as `include_str!`-ed files, since a freshly scaffolded guest
//! has nothing in common with this CLI's own source tree to sit alongside.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

const CARGO_TOML_TEMPLATE: &str = r#"[package]
name = "{{PROJECT_NAME}}"
version = "0.1.0"
edition = "2021"

[dependencies]
boxforge-guest = "0.1"
boxforge-macro = "0.1"
serde_json = "1"
"#;

const BOXFORGE_YAML_TEMPLATE: &str = r#"runtime:
  name: {{PROJECT_NAME}}
  version: "0.1.0"
  default_request_timeout_ms: 30000

boxes:
  - name: {{PROJECT_NAME}}
    program: ["./target/debug/{{PROJECT_NAME}}"]
    auto_start: true
"#;

const MAIN_RS_TEMPLATE: &str = r#"mod handlers;

fn main() -> boxforge_guest::error::Result<()> {
    boxforge_guest::bootstrap::run_from_manifest()
}
"#;

const HANDLERS_MOD_TEMPLATE: &str = r#"mod echo;
"#;

const ECHO_RS_TEMPLATE: &str = r#"use boxforge_macro::box_handler;
use serde_json::Value;

/// Echoes the message back to whichever box sent it.
#[box_handler("echo")]
fn echo(_sender: &str, data: Value) -> Result<Value, String> {
    Ok(data)
}
"#;

pub fn execute(name: &str, path: Option<&str>) -> Result<()> {
    let target_dir = if let Some(p) = path {
        Path::new(p).join(name)
    } else {
        Path::new(name).to_path_buf()
    };

    println!("Creating new boxforge guest project: {}", name);
    println!("  Location: {}", target_dir.display());

    fs::create_dir_all(&target_dir).context("Failed to create project directory")?;
    fs::create_dir_all(target_dir.join("src/handlers"))
        .context("Failed to create src/handlers directory")?;

    let cargo_toml = CARGO_TOML_TEMPLATE.replace("{{PROJECT_NAME}}", name);
    fs::write(target_dir.join("Cargo.toml"), cargo_toml).context("Failed to write Cargo.toml")?;

    let boxforge_yaml = BOXFORGE_YAML_TEMPLATE.replace("{{PROJECT_NAME}}", name);
    fs::write(target_dir.join("boxforge.yaml"), boxforge_yaml)
        .context("Failed to write boxforge.yaml")?;

    fs::write(target_dir.join("src/main.rs"), MAIN_RS_TEMPLATE)
        .context("Failed to write src/main.rs")?;
    fs::write(target_dir.join("src/handlers/mod.rs"), HANDLERS_MOD_TEMPLATE)
        .context("Failed to write src/handlers/mod.rs")?;
    fs::write(target_dir.join("src/handlers/echo.rs"), ECHO_RS_TEMPLATE)
        .context("Failed to write src/handlers/echo.rs")?;

    println!("✓ Project created successfully!");
    println!("\nNext steps:");
    println!("  cd {}", name);
    println!("  cargo build");
    println!("  boxforge run boxforge.yaml");

    Ok(())
}

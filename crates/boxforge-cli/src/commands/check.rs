use anyhow::{Context, Result};
use boxforge_config::{parse_config, validate_config};
use std::path::Path;

pub fn execute(config_path: &str) -> Result<()> {
    println!("Checking {}...", config_path);

    let config = parse_config(Path::new(config_path)).context("Failed to parse configuration")?;
    validate_config(&config).context("Configuration is invalid")?;

    println!("  Runtime: {} v{}", config.runtime.name, config.runtime.version);
    println!("  Default timeout: {}ms", config.runtime.default_request_timeout_ms);
    println!("  Boxes: {}", config.boxes.len());
    for b in &config.boxes {
        println!("    - {} ({})", b.name, b.program.join(" "));
    }
    println!("✓ Configuration is valid");

    Ok(())
}

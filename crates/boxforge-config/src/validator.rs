use crate::{ConfigError, Result, RuntimeConfig};
use std::collections::HashSet;

/// Box names unique; at least one box defined; each box's program argv non-empty.
pub fn validate_config(config: &RuntimeConfig) -> Result<()> {
    if config.boxes.is_empty() {
        return Err(ConfigError::NoBoxesDefined);
    }

    let mut seen = HashSet::new();
    for b in &config.boxes {
        if !seen.insert(b.name.as_str()) {
            return Err(ConfigError::DuplicateBoxName(b.name.clone()));
        }
        if b.program.is_empty() {
            return Err(ConfigError::EmptyProgram(b.name.clone()));
        }
    }

    Ok(())
}

#![no_main]

use boxforge_config::{validate_config, RuntimeConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(yaml_str) = std::str::from_utf8(data) {
        if let Ok(config) = serde_yaml::from_str::<RuntimeConfig>(yaml_str) {
            // Validation must never panic, regardless of how malformed the
            // parsed structure is.
            let _ = validate_config(&config);

            // Round-tripping a successfully parsed config back to YAML must
            // also never panic.
            let _ = serde_yaml::to_string(&config);
        }
    }
});

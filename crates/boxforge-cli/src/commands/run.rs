use anyhow::{Context, Result};
use boxforge_config::{parse_config, validate_config};
use boxforge_runtime::{BoxOptions, LocalProcessSandbox, Runtime};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub async fn execute(config_path: &str) -> Result<()> {
    println!("Starting boxforge runtime...");
    println!("  Config: {}", config_path);

    let config = parse_config(Path::new(config_path)).context("Failed to parse configuration")?;
    validate_config(&config).context("Configuration is invalid")?;

    println!("  Runtime: {} v{}", config.runtime.name, config.runtime.version);
    println!("  Boxes: {}", config.boxes.len());

    let default_timeout = Duration::from_millis(config.runtime.default_request_timeout_ms);
    let runtime = Runtime::new(Arc::new(LocalProcessSandbox::new()), default_timeout);

    for def in &config.boxes {
        let managed = runtime
            .create_box(
                def.name.clone(),
                def.program.clone(),
                BoxOptions {
                    sandbox_image: config.runtime.sandbox_image.clone(),
                    env: def.env.clone(),
                    timeout: None,
                },
            )
            .await
            .with_context(|| format!("Failed to register box {:?}", def.name))?;

        if let Some(task) = &def.task {
            managed.task(task.clone()).await;
        }
        for handler in &def.message_handlers {
            managed.on_message(handler.clone()).await;
        }
        for (event, handlers) in &def.event_handlers {
            for handler in handlers {
                managed.on_event(event.clone(), handler.clone()).await;
            }
        }
    }

    let mut started = Vec::new();
    for def in &config.boxes {
        if !def.auto_start {
            continue;
        }
        runtime
            .run_box(&def.name, Default::default())
            .await
            .with_context(|| format!("Failed to start box {:?}", def.name))?;
        println!("  ✓ {} started", def.name);
        started.push(def.name.clone());
    }

    for name in &started {
        if let Some(managed) = runtime.get_box(name).await {
            match managed.wait().await {
                Ok(code) => println!("  {} exited with code {}", name, code),
                Err(e) => eprintln!("boxforge: {} failed while waiting: {e}", name),
            }
        }
    }

    runtime.shutdown().await;
    println!("✓ Runtime exited");

    Ok(())
}

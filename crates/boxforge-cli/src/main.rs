mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "boxforge")]
#[command(about = "Multi-box sandboxed orchestration runtime", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scaffold a new guest-program crate
    New {
        /// Project name
        name: String,

        /// Target directory (defaults to current directory)
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Validate a runtime config file without launching anything
    Check {
        /// Path to the runtime's YAML config
        #[arg(default_value = "boxforge.yaml")]
        config: String,
    },

    /// Launch every box described by a runtime config
    Run {
        /// Path to the runtime's YAML config
        #[arg(default_value = "boxforge.yaml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::New { name, path } => {
            commands::new::execute(&name, path.as_deref())?;
        }
        Commands::Check { config } => {
            commands::check::execute(&config)?;
        }
        Commands::Run { config } => {
            commands::run::execute(&config).await?;
        }
    }

    Ok(())
}

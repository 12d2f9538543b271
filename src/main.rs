//! modhost: module host runtime.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!                 │                     BOOTSTRAP                        │
//!                 │                                                      │
//!   passive.toml ─┼─▶ config ──▶ observability ──▶ factory ──▶ sys       │
//!                 │                                  │          │        │
//!                 │                                  │          ▼        │
//!   active.toml ◀─┼──────────── active config ◀──────┼──── services      │
//!                 │                                  │          │        │
//!                 │                                  ▼          ▼        │
//!   lib*.so ──────┼─────────────────────────▶ DllModule    ModuleManager │
//!                 │                                  │          │        │
//!                 │                                  └────┬─────┘        │
//!                 │                                       ▼              │
//!                 │                            modules (start/stop)      │
//!                 │                                                      │
//!   SIGINT/TERM ──┼─▶ signals ──▶ stop event ──▶ stop ──▶ uninitialize   │
//!                 └──────────────────────────────────────────────────────┘
//! ```
//!
//! The process exit code is `0` on success, otherwise the code of the first
//! failing step's error kind.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use modhost::app::ExampleInitializer;
use modhost::bootstrap::{self, Bootstrap};
use modhost::config::PassiveConfig;
use modhost::error::HostError;

#[derive(Parser, Debug)]
#[command(name = "modhost")]
#[command(about = "Hosts statically linked and shared library modules", long_about = None)]
struct Cli {
    /// Passive configuration file
    #[arg(short, long, default_value = "modhost.toml")]
    config: PathBuf,

    /// Print the effective passive configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

fn print_config(path: &Path) -> Result<(), HostError> {
    let passive = PassiveConfig::load(ExampleInitializer::passive_keys()?, path)?;
    let rendered = serde_json::to_string_pretty(&passive.effective())
        .map_err(|e| HostError::InvalidArgument(e.to_string()))?;
    println!("{rendered}");
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = if cli.print_config {
        print_config(&cli.config)
    } else {
        let bootstrap = Arc::new(Bootstrap::new(Box::new(ExampleInitializer::new()), &cli.config));
        bootstrap::run(&bootstrap)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("modhost: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

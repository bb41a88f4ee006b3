// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! contactd - multi-tenant contact directory.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use contactd_config::{ConfigError, ContactdConfig};

/// contactd - multi-tenant contact directory.
#[derive(Parser, Debug)]
#[command(name = "contactd", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the directory until SIGINT or SIGTERM.
    Serve,
    /// Apply pending database migrations and exit.
    Migrate,
    /// Validate configuration and print the effective settings.
    CheckConfig,
}

fn load(cli: &Cli) -> Result<ContactdConfig, Vec<ConfigError>> {
    match &cli.config {
        Some(path) => contactd_config::load_and_validate_path(path),
        None => contactd_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load(&cli) {
        Ok(config) => config,
        Err(errors) => {
            contactd_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Migrate) => serve::run_migrate(config).await,
        Some(Commands::CheckConfig) => serve::print_config(&config),
        None => {
            println!("contactd: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("contactd: {e}");
        std::process::exit(1);
    }
}

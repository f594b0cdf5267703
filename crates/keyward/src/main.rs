//! keyward CLI - access key lifecycle for object-storage control planes
//!
//! This is the main entry point for the keyward command-line interface.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize rustls crypto provider (required for rustls 0.23+)
    // This must be done before any TLS operations
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let ctx = commands::Context::open(cli.state_dir.as_deref(), cli.json).await?;

    match cli.command {
        Commands::Config(cmd) => commands::config::run(cmd, &ctx).await,
        Commands::Role(cmd) => commands::role::run(cmd, &ctx).await,
        Commands::Creds(args) => commands::creds::run(args, &ctx).await,
        Commands::Namespace(cmd) => commands::namespace::run(cmd, &ctx).await,
        Commands::IamUser(cmd) => commands::iam_user::run(cmd, &ctx).await,
        Commands::Call(args) => commands::call::run(args, &ctx).await,
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

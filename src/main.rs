//! pagepilot - MCP bridge to a live web page
//!
//! CLI entry point for the pagepilot server.

#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod cli;
mod server;
mod websocket;

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // Stdout belongs to the stdio transport; logs go to stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pagepilot=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = cli::Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;
    let result = runtime.block_on(cli::run(cli));
    // A pending stdin read must not keep the process alive.
    runtime.shutdown_timeout(Duration::from_secs(1));
    result
}

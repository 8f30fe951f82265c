//! CLI module for pagepilot
//!
//! Provides commands:
//! - `serve`: Run the bridge (default)
//! - `tools`: Print the tool catalogue as JSON

use clap::{Args, Parser, Subcommand};
use pagepilot_core::{RequestCorrelator, SessionRegistry};
use pagepilot_tools::Dispatcher;
use std::sync::Arc;

use crate::server::config::{AppConfig, ServeMode};

/// MCP bridge to a live web page
#[derive(Parser, Debug)]
#[command(name = "pagepilot")]
#[command(about = "MCP bridge that drives a live web page through its browser session")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the bridge (default)
    Serve(ServeArgs),
    /// Print the tool catalogue as JSON
    Tools,
}

#[derive(Args, Debug, Default, Clone)]
pub struct ServeArgs {
    /// Transports to run
    #[arg(long, value_enum)]
    pub mode: Option<ServeMode>,
    /// HTTP listening port
    #[arg(long)]
    pub port: Option<u16>,
}

impl ServeArgs {
    /// Flags win over every configuration source
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(mode) = self.mode {
            config.server.mode = mode;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Tools) => print_tools(),
        Some(Commands::Serve(args)) => serve(args).await,
        None => serve(ServeArgs::default()).await,
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = crate::server::load_config()?;
    args.apply(&mut config);
    crate::server::run(config).await
}

fn print_tools() -> anyhow::Result<()> {
    let config = crate::server::load_config()?;
    let dispatcher = Dispatcher::new(
        Arc::new(SessionRegistry::new()),
        Arc::new(RequestCorrelator::new()),
        config.bridge.timeouts.budgets(),
    );
    let catalogue = serde_json::to_string_pretty(&dispatcher.definitions())?;
    println!("{}", catalogue);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_is_default() {
        let cli = Cli::try_parse_from(["pagepilot"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_serve_flags() {
        let cli = Cli::try_parse_from(["pagepilot", "serve", "--mode", "stdio", "--port", "4000"]).unwrap();
        let Some(Commands::Serve(args)) = cli.command else {
            panic!("expected serve");
        };
        let mut config = AppConfig::default();
        args.apply(&mut config);
        assert_eq!(config.server.mode, ServeMode::Stdio);
        assert_eq!(config.server.port, 4000);
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(Cli::try_parse_from(["pagepilot", "serve", "--mode", "grpc"]).is_err());
    }

    #[test]
    fn test_tools_subcommand() {
        let cli = Cli::try_parse_from(["pagepilot", "tools"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Tools)));
    }
}

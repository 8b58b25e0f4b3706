//! Command-line interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Bug tracker - HTTP API for reporting, triaging and closing bugs
#[derive(Parser)]
#[command(name = "bugtracker")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of the default locations
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve {
        /// Listen on this port instead of the configured one
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Connect to the store, ping it and exit
    #[command(alias = "-c", alias = "--check")]
    Check,

    /// Write a default config.toml with a fresh signing secret
    Init,
}

impl Cli {
    /// The subcommand to run, `serve` when none was given.
    #[must_use]
    pub fn command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or(Commands::Serve { port: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default() {
        let cli = Cli::parse_from(["bugtracker"]);
        assert_eq!(cli.command(), Commands::Serve { port: None });
    }

    #[test]
    fn parses_subcommands() {
        let cli = Cli::parse_from(["bugtracker", "serve", "--port", "8080"]);
        assert_eq!(cli.command(), Commands::Serve { port: Some(8080) });

        let cli = Cli::parse_from(["bugtracker", "--config", "/etc/bugs.toml", "check"]);
        assert_eq!(cli.command(), Commands::Check);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/bugs.toml")));
    }
}

//! CLI argument parsing via clap.

use clap::{Parser, Subcommand};

/// Resilient command-line client for the movie-tracking API.
#[derive(Debug, Parser)]
#[command(name = "reel", version)]
pub struct Args {
    /// Path to config file (default: ./reel.toml or ~/.config/reel/reel.toml).
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<String>,

    /// Override API base URL.
    #[arg(long = "base-url", global = true)]
    pub base_url: Option<String>,

    /// Override retries allowed after the first attempt.
    #[arg(long = "max-retries", global = true)]
    pub max_retries: Option<u32>,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one search and print the JSON result.
    Search {
        /// movies, theaters, or users.
        resource: String,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Read queries from stdin, one per line, and search as input settles.
    Live {
        /// movies, theaters, or users.
        resource: String,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Manage the config file.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Write the default config to ~/.config/reel/reel.toml if missing.
    Init,
    /// Print the effective configuration.
    Show,
}

/// Search criteria accepted on the command line.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct FilterArgs {
    /// Free-text query.
    #[arg(short = 'q', long = "query")]
    pub query: Option<String>,

    #[arg(long = "category")]
    pub category: Option<String>,

    /// Theater chain.
    #[arg(long = "chain")]
    pub chain: Option<String>,

    #[arg(long = "lat", allow_negative_numbers = true)]
    pub latitude: Option<f64>,

    #[arg(long = "lng", allow_negative_numbers = true)]
    pub longitude: Option<f64>,

    /// Search radius in kilometers (default from config).
    #[arg(long = "radius")]
    pub radius_km: Option<f64>,
}

impl FilterArgs {
    pub fn has_location(&self) -> bool {
        self.latitude.is_some() || self.longitude.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_parses_filters() {
        let args = Args::parse_from([
            "reel", "search", "theaters", "--query", "odeon", "--lat", "-33.8", "--lng", "151.2",
        ]);
        match args.command {
            Command::Search { resource, filters } => {
                assert_eq!(resource, "theaters");
                assert_eq!(filters.query.as_deref(), Some("odeon"));
                assert_eq!(filters.latitude, Some(-33.8));
                assert_eq!(filters.longitude, Some(151.2));
                assert!(filters.has_location());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let args = Args::parse_from(["reel", "live", "movies", "--max-retries", "1", "-vv"]);
        assert_eq!(args.max_retries, Some(1));
        assert_eq!(args.verbose, 2);
        assert!(matches!(args.command, Command::Live { .. }));
    }

    #[test]
    fn config_subcommands_parse() {
        let args = Args::parse_from(["reel", "--config", "x.toml", "config", "show"]);
        assert_eq!(args.config.as_deref(), Some("x.toml"));
        assert!(matches!(
            args.command,
            Command::Config {
                action: ConfigCommand::Show
            }
        ));
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Args::try_parse_from(["reel"]).is_err());
    }
}

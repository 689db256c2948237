use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI configuration parsed from command line arguments and environment variables
#[derive(Parser, Debug)]
#[command(name = "holocron")]
#[command(
    author,
    version,
    about = "Keeps a local SQLite mirror of a SWAPI-compatible catalog"
)]
#[command(after_help = "Examples:
  holocron sync
  holocron sync --base https://swapi.py4e.com/api --limit-people 20
  holocron sync --mirror tech
  holocron stats")]
pub struct Config {
    /// SQLite database URL (defaults to the user data directory)
    #[arg(long, env = "DATABASE_URL", global = true)]
    pub database_url: Option<String>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch planets, films and people and apply them in one transaction
    #[command(
        after_help = "Endpoint precedence: --mirror, then --base / SWAPI_BASE, then the default.
Exits with status 75 when the catalog was unreachable; running again later may succeed."
    )]
    Sync {
        /// Base URL of the catalog API
        #[arg(long, env = "SWAPI_BASE", value_name = "URL")]
        base: Option<String>,

        /// Use a named mirror from the mirrors file
        #[arg(short, long, value_name = "NAME")]
        mirror: Option<String>,

        /// Disable TLS certificate verification
        #[arg(long)]
        insecure: bool,

        /// Only apply the first N people records
        #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
        limit_people: Option<u64>,

        /// Custom path to mirrors.toml
        #[arg(short, long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
    /// Show row and relationship counts of the local store
    Stats,
    /// List mirrors from the mirrors file
    Mirrors {
        /// Custom path to mirrors.toml
        #[arg(short, long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

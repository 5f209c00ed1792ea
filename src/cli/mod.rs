//! CLI command definitions for task-calendar.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Task tracker with completion calendars
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    /// Directory for uploaded images (overrides config)
    #[arg(short, long, global = true)]
    pub upload_dir: Option<PathBuf>,

    /// Address to bind (overrides config)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Port to bind (overrides config)
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start the web server (default if no subcommand given)
    Serve,

    /// Create the database and apply migrations, then exit
    InitDb,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_defaults() {
        let cli = Cli::parse_from(["task-calendar"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.log, "2");
        assert!(!cli.verbose);
    }

    #[test]
    fn test_global_overrides_after_subcommand() {
        let cli = Cli::parse_from([
            "task-calendar",
            "serve",
            "--port",
            "8080",
            "--database",
            "/tmp/x.db",
        ]);
        assert_eq!(cli.command, Some(Command::Serve));
        assert_eq!(cli.port, Some(8080));
        assert_eq!(cli.database, Some(PathBuf::from("/tmp/x.db")));
    }

    #[test]
    fn test_init_db_subcommand() {
        let cli = Cli::parse_from(["task-calendar", "init-db"]);
        assert_eq!(cli.command, Some(Command::InitDb));
    }
}

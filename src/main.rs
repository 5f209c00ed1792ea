//! Task Calendar
//!
//! A personal task tracker with subtasks, image attachments and
//! daily/weekly/monthly completion calendars.

use anyhow::Result;
use clap::Parser;
use task_calendar::cli::{Cli, Command};
use task_calendar::config::{Config, ConfigLoader};
use task_calendar::db::Database;
use task_calendar::logging::{self, LogTarget};
use task_calendar::web::{self, AppState};
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_target: LogTarget = cli.log.parse()?;
    logging::init(&log_target, cli.verbose)?;

    let mut loader = ConfigLoader::load(cli.config.as_deref())?;
    for (tier, path) in loader.sources() {
        debug!(tier = %tier, path = %path.display(), "Config file merged");
    }

    // CLI flags override every config tier
    let config = loader.config_mut();
    if let Some(db_path) = &cli.database {
        config.server.db_path = db_path.clone();
    }
    if let Some(upload_dir) = &cli.upload_dir {
        config.uploads.dir = upload_dir.clone();
    }
    if let Some(host) = &cli.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    let config = loader.into_config();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => run_server(config).await,
        Command::InitDb => init_db(&config),
    }
}

fn open_database(config: &Config) -> Result<Database> {
    config.ensure_db_dir()?;
    let db = Database::open(&config.server.db_path)?;
    info!(path = %config.server.db_path.display(), "Database ready");
    Ok(db)
}

fn init_db(config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let counts = db.count_tasks()?;
    info!(
        tasks = counts.total,
        completed = counts.completed,
        subtasks = counts.subtasks,
        "Schema up to date"
    );
    Ok(())
}

async fn run_server(config: Config) -> Result<()> {
    let db = open_database(&config)?;
    config.ensure_upload_dir()?;

    let state = AppState::from_config(db, &config);
    let (shutdown_tx, addr) =
        web::start_server(state, &config.server.host, config.server.port).await?;
    info!(
        "Open http://{} (uploads in {})",
        addr,
        config.uploads.dir.display()
    );

    tokio::signal::ctrl_c().await?;
    info!("Interrupt received");
    let _ = shutdown_tx.send(());

    Ok(())
}

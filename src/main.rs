use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use taskflow::app::{App, AppEvent};
use taskflow::config::{Backend, Config, ServiceConfig, PUBLIC_KEY_ENV};
use taskflow::controller::TaskController;
use taskflow::service::{HttpService, RecordService, ServiceError, SqliteService};
use taskflow::ui;
use taskflow::view::TaskStats;

/// Get the config directory path (~/.config/taskflow/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("taskflow"))
}

#[derive(Parser, Debug)]
#[command(name = "taskflow", about = "Terminal task manager", version)]
struct Args {
    /// Config file (default: ~/.config/taskflow/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Reset the local database (delete and recreate)
    #[arg(long)]
    reset_db: bool,

    /// Print task counts and exit
    #[arg(long)]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they stay out of the TUI's way when redirected.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        println!("Created config directory: {}", config_dir.display());
    }

    // User-only access to the directory holding the database and key
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(&config_dir) {
            Ok(metadata) => {
                let mut perms = metadata.permissions();
                perms.set_mode(0o700);
                if let Err(e) = std::fs::set_permissions(&config_dir, perms) {
                    tracing::warn!(
                        path = %config_dir.display(),
                        error = %e,
                        "Failed to set config directory permissions to 0700"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = %config_dir.display(),
                    error = %e,
                    "Failed to read config directory metadata"
                );
            }
        }
    }

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let service = open_service(&config.service, &config_dir, args.reset_db).await?;

    if args.stats {
        let tasks = TaskController::new(Arc::clone(&service), config.page_size)
            .load()
            .await
            .context("Failed to load tasks")?;
        let today = chrono::Local::now().date_naive();
        let stats = TaskStats::compute(&tasks, today);
        println!("Total:     {}", stats.total);
        println!("Completed: {}", stats.completed);
        println!("Pending:   {}", stats.pending);
        println!("Overdue:   {}", stats.overdue);
        return Ok(());
    }

    let mut app = App::new(service, &config);
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);

    ui::run(&mut app, event_tx, event_rx).await?;

    println!("Goodbye!");
    Ok(())
}

/// Build the configured record service.
async fn open_service(
    config: &ServiceConfig,
    config_dir: &std::path::Path,
    reset_db: bool,
) -> Result<Arc<dyn RecordService>> {
    match config.backend {
        Backend::Sqlite => {
            let db_path = config
                .database
                .clone()
                .unwrap_or_else(|| config_dir.join("tasks.db"));

            if reset_db && db_path.exists() {
                std::fs::remove_file(&db_path).context("Failed to delete database")?;
                println!("Database reset.");
            }

            let db_path_str = db_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
            match SqliteService::open(db_path_str).await {
                Ok(db) => Ok(Arc::new(db)),
                Err(ServiceError::InstanceLocked) => {
                    eprintln!(
                        "Error: Another instance of taskflow appears to be running. Please close it and try again."
                    );
                    std::process::exit(1);
                }
                Err(e) => Err(anyhow::anyhow!("Failed to open database: {}", e)),
            }
        }
        Backend::Http => {
            if reset_db {
                tracing::warn!("--reset-db has no effect with the http backend");
            }
            let endpoint = config
                .endpoint
                .as_deref()
                .context("service.endpoint is required for the http backend")?;
            let project_id = config
                .project_id
                .clone()
                .context("service.project_id is required for the http backend")?;
            let public_key = config.public_key().with_context(|| {
                format!(
                    "service.public_key (or {}) is required for the http backend",
                    PUBLIC_KEY_ENV
                )
            })?;
            let service = HttpService::new(endpoint, project_id, public_key)
                .context("Failed to set up the record service client")?;
            tracing::info!(endpoint = %endpoint, "Using hosted record service");
            Ok(Arc::new(service))
        }
    }
}

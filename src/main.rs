use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{Level, info, warn};
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*};

use site_report::{
    AppState, Config, create_app, notifier::Notifier, startup_checks, storage,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the upload server (default if no command specified)
    Serve {
        #[arg(short, long)]
        port: Option<u16>,

        #[arg(long)]
        host: Option<String>,

        /// Automatically quit after specified number of seconds (useful for testing)
        #[arg(long)]
        quit_after: Option<u64>,
    },

    /// Delete uploaded files older than the given number of days
    Cleanup {
        #[arg(short, long, default_value_t = 30)]
        days: u64,
    },

    /// Move every uploaded photo and its metadata into the archive directory
    Archive {
        /// Archive directory (defaults to storage.archive_directory)
        #[arg(short, long)]
        destination: Option<PathBuf>,
    },

    /// Send a test message through the configured notifier
    NotifyTest,
}

fn load_config(config_path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if config_path.exists() {
        let config_content = std::fs::read_to_string(config_path)?;
        toml_edit::de::from_str::<Config>(&config_content)?
    } else {
        Config::default()
    };
    config.notifier = config.notifier.with_env_fallback();
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    init_logging(&cli.log_level, &config.storage.log_directory)?;
    if !cli.config.exists() {
        info!("Config file not found at {:?}, using defaults", cli.config);
    }

    match cli.command {
        Some(Commands::Serve {
            port,
            host,
            quit_after,
        }) => run_server(config, port, host, quit_after).await,
        Some(Commands::Cleanup { days }) => {
            let store = prepare_store(&config)?;
            let count = store.cleanup_older_than(days);
            println!("Deleted {} files older than {} days", count, days);
            Ok(())
        }
        Some(Commands::Archive { destination }) => {
            let store = prepare_store(&config)?;
            let destination = destination.unwrap_or(config.storage.archive_directory.clone());
            archive_uploads(&store, &destination)
        }
        Some(Commands::NotifyTest) => {
            let notifier = Notifier::from_config(config.notifier.clone())?;
            notifier.test_connection().await?;
            println!("Test message sent via {}", notifier.provider_name());
            Ok(())
        }
        None => run_server(config, None, None, None).await,
    }
}

/// Log to stdout and to today's file under the log directory.
fn init_logging(log_level: &str, log_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let (file_layer, file_error) = match storage::open_daily_log(log_dir) {
        Ok(file) => (
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file))),
            None,
        ),
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(LevelFilter::from_level(level))
        .with(fmt::layer())
        .with(file_layer)
        .try_init()?;

    if let Some(e) = file_error {
        warn!("Logging to stdout only, cannot open log file in {:?}: {}", log_dir, e);
    }
    Ok(())
}

fn prepare_store(config: &Config) -> Result<storage::FileStore, Box<dyn std::error::Error>> {
    storage::ensure_folders(
        &config.storage.upload_directory,
        &config.storage.log_directory,
    )?;
    Ok(storage::FileStore::new(
        config.storage.upload_directory.clone(),
    ))
}

fn archive_uploads(
    store: &storage::FileStore,
    destination: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let photos = store.list_uploaded();
    if photos.is_empty() {
        println!("Nothing to archive in {:?}", store.upload_dir());
        return Ok(());
    }

    let mut paths = Vec::with_capacity(photos.len() * 2);
    for photo in photos {
        let sidecar = photo.with_extension(storage::METADATA_EXTENSION);
        if sidecar.exists() {
            paths.push(sidecar);
        }
        paths.push(photo);
    }

    store.move_to_archive(&paths, destination)?;
    println!("Archived {} files to {:?}", paths.len(), destination);
    Ok(())
}

async fn run_server(
    config: Config,
    port: Option<u16>,
    host: Option<String>,
    quit_after: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let host = host.unwrap_or(config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    info!("Starting {} server", config.app.name);
    info!(
        "Upload directory: {:?}",
        config.storage.upload_directory
    );
    info!("Log directory: {:?}", config.storage.log_directory);

    match startup_checks::perform_startup_checks(&config).await {
        Ok(()) => info!("All startup checks passed"),
        Err(errors) => {
            for error in &errors {
                tracing::error!("Startup check failed: {}", error);
            }

            if errors.iter().any(|e| e.is_critical()) {
                tracing::error!("Critical startup check failed, exiting");
                return Err("Critical startup check failed".into());
            } else {
                tracing::warn!("Non-critical startup checks failed, continuing");
            }
        }
    }

    let app_state = AppState::new(config)?;
    info!(
        "Notifier provider: {} (enabled: {})",
        app_state.notifier.provider_name(),
        app_state.notifier.config().enabled
    );
    let app = create_app(app_state);

    let addr = SocketAddr::from((host.parse::<std::net::IpAddr>()?, port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal(quit_after));
    if let Err(e) = server.await {
        tracing::error!("Server error: {}", e);
    }

    // Registry is in-memory only; uploaded files stay on disk
    info!("Shutting down");

    Ok(())
}

async fn shutdown_signal(quit_after: Option<u64>) {
    use tokio::signal;
    use tokio::time::{Duration, sleep};

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let quit_timer = async {
        if let Some(seconds) = quit_after {
            info!(
                "Server will automatically shut down after {} seconds",
                seconds
            );
            sleep(Duration::from_secs(seconds)).await;
            info!("Quit timer expired, shutting down");
        } else {
            std::future::pending::<()>().await
        }
    };

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        },
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        },
        _ = quit_timer => {},
    }
}

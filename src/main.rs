use anyhow::Result;
use clap::{Parser, Subcommand};
use districtd::{config::DaemonConfig, rest, storage::Storage, AppContext};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "districtd",
    about = "District Administration backend — role-scoped tasks, dashboards, and analytics",
    version
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port
    #[arg(long, env = "DISTRICTD_PORT")]
    port: Option<u16>,

    /// Data directory for the SQLite database and config.toml
    #[arg(long, env = "DISTRICTD_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "DISTRICTD_LOG")]
    log: Option<String>,

    /// Bind address (default: 127.0.0.1; use 0.0.0.0 for LAN access)
    #[arg(long, env = "DISTRICTD_BIND")]
    bind_address: Option<String>,

    /// Write logs to this file path (rotated daily). Optional.
    #[arg(long, env = "DISTRICTD_LOG_FILE")]
    log_file: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server (default when no subcommand given).
    Serve,
    /// Create the three default accounts (admin, dept_head, staff) if the
    /// user table is empty, then exit.
    Seed,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Arc::new(DaemonConfig::new(
        args.port,
        args.data_dir,
        args.log,
        args.bind_address,
    ));
    let _guard = setup_logging(&config.log, args.log_file.as_deref(), &config.log_format);

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => run_server(config).await,
        Command::Seed => run_seed(config).await,
    }
}

async fn run_server(config: Arc<DaemonConfig>) -> Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "districtd starting");
    info!(
        data_dir = %config.data_dir.display(),
        port = config.port,
        "config loaded"
    );
    if config.uses_default_secret() {
        warn!("DISTRICTD_SECRET_KEY not set — using the built-in development secret");
    }

    let storage = Arc::new(
        Storage::new_with_slow_query(
            &config.data_dir,
            config.observability.slow_query_threshold_ms,
        )
        .await?,
    );

    let seeded = storage.seed_default_users().await?;
    if seeded > 0 {
        info!(count = seeded, "seeded default accounts into empty directory");
    }

    let ctx = Arc::new(AppContext::new(config, storage));
    rest::start_server(ctx).await
}

async fn run_seed(config: Arc<DaemonConfig>) -> Result<()> {
    let storage = Storage::new(&config.data_dir).await?;
    let seeded = storage.seed_default_users().await?;
    if seeded > 0 {
        println!("created {seeded} default accounts");
    } else {
        println!("user directory is not empty — nothing to do");
    }
    Ok(())
}

/// Initialise tracing. Returns a `WorkerGuard` that must stay alive for the
/// process lifetime when file logging is enabled.
///
/// `log_format` may be `"pretty"` (default, human-readable compact format) or
/// `"json"` (structured JSON for log aggregators).
///
/// If the log directory cannot be created, falls back to stdout-only logging
/// with a warning — never panics.
fn setup_logging(
    log_level: &str,
    log_file: Option<&std::path::Path>,
    log_format: &str,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let use_json = log_format == "json";

    if let Some(path) = log_file {
        let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let filename = path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("districtd.log"));

        // Ensure the directory exists before tracing-appender tries to open it.
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!(
                "warn: could not create log directory '{}': {e} — falling back to stdout",
                dir.display()
            );
            if use_json {
                tracing_subscriber::fmt().json().with_env_filter(log_level).init();
            } else {
                tracing_subscriber::fmt().with_env_filter(log_level).compact().init();
            }
            return None;
        }

        let appender = tracing_appender::rolling::daily(dir, filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);

        if use_json {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().json())
                .with(fmt::layer().json().with_writer(non_blocking))
                .init();
        } else {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().compact())
                .with(fmt::layer().with_writer(non_blocking))
                .init();
        }

        Some(guard)
    } else if use_json {
        tracing_subscriber::fmt().json().with_env_filter(log_level).init();
        None
    } else {
        tracing_subscriber::fmt().with_env_filter(log_level).compact().init();
        None
    }
}

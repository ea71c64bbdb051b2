use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::error;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_TOKEN_EXPIRY_MINUTES: i64 = 30;
const DEFAULT_SLOW_QUERY_MS: u64 = 100;

/// Built-in fallback signing secret. Fine for local development; any real
/// deployment must set `DISTRICTD_SECRET_KEY`.
const DEFAULT_SECRET_KEY: &str = "district-admin-secret-key";

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

// ─── ObservabilityConfig ─────────────────────────────────────────────────────

/// Observability configuration (`[observability]` in config.toml).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log SQLite queries that exceed this threshold (milliseconds). Default: 100.
    /// Set to 0 to disable slow query logging.
    pub slow_query_threshold_ms: u64,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            slow_query_threshold_ms: DEFAULT_SLOW_QUERY_MS,
        }
    }
}

// ─── TOML overlay ────────────────────────────────────────────────────────────

/// `{data_dir}/config.toml` — all fields are optional overrides.
#[derive(Debug, Default, Deserialize)]
struct TomlConfig {
    /// HTTP server port (default: 8000).
    port: Option<u16>,
    /// Bind address (default: "127.0.0.1"; use "0.0.0.0" for LAN access).
    bind_address: Option<String>,
    /// Log level filter (default: "info").
    log: Option<String>,
    /// Log output format: "pretty" (default) | "json".
    log_format: Option<String>,
    /// Token signing secret. Prefer the `DISTRICTD_SECRET_KEY` env var.
    secret_key: Option<String>,
    /// Access token lifetime in minutes (default: 30).
    token_expiry_minutes: Option<i64>,
    /// Observability configuration (`[observability]`).
    observability: Option<ObservabilityConfig>,
}

fn load_toml(data_dir: &Path) -> Option<TomlConfig> {
    let path = data_dir.join("config.toml");
    let contents = std::fs::read_to_string(&path).ok()?;
    match toml::from_str::<TomlConfig>(&contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            error!(path = %path.display(), err = %e, "failed to parse config.toml — using defaults");
            None
        }
    }
}

// ─── DaemonConfig ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub port: u16,
    pub data_dir: PathBuf,
    pub log: String,
    /// Bind address for the HTTP server (DISTRICTD_BIND env var, default: "127.0.0.1").
    pub bind_address: String,
    /// Log output format: "pretty" (default) | "json" (structured for log aggregators).
    pub log_format: String,
    /// HS256 signing secret for access tokens (DISTRICTD_SECRET_KEY env var).
    pub secret_key: String,
    /// Access token lifetime in minutes.
    pub token_expiry_minutes: i64,
    /// Observability: slow query threshold.
    pub observability: ObservabilityConfig,
}

impl DaemonConfig {
    /// Build config from CLI/env args + optional TOML file.
    ///
    /// Priority (highest to lowest):
    ///   1. CLI / env — passed as `Some(value)` from clap
    ///   2. TOML file at `{data_dir}/config.toml`
    ///   3. Built-in defaults
    pub fn new(
        port: Option<u16>,
        data_dir: Option<PathBuf>,
        log: Option<String>,
        bind_address: Option<String>,
    ) -> Self {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);

        // Load TOML as the lowest-priority override layer
        let toml = load_toml(&data_dir).unwrap_or_default();

        let port = port.or(toml.port).unwrap_or(DEFAULT_PORT);
        let log = log.or(toml.log).unwrap_or_else(|| "info".to_string());

        let bind_address = bind_address
            .or(std::env::var("DISTRICTD_BIND").ok().filter(|s| !s.is_empty()))
            .or(toml.bind_address)
            .unwrap_or_else(default_bind_address);

        let log_format = std::env::var("DISTRICTD_LOG_FORMAT")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.log_format)
            .unwrap_or_else(|| "pretty".to_string());

        let secret_key = std::env::var("DISTRICTD_SECRET_KEY")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.secret_key)
            .unwrap_or_else(|| DEFAULT_SECRET_KEY.to_string());

        let token_expiry_minutes = toml
            .token_expiry_minutes
            .unwrap_or(DEFAULT_TOKEN_EXPIRY_MINUTES);

        let observability = toml.observability.unwrap_or_default();

        Self {
            port,
            data_dir,
            log,
            bind_address,
            log_format,
            secret_key,
            token_expiry_minutes,
            observability,
        }
    }

    /// True when the token signing secret is the built-in development
    /// fallback rather than an operator-provided value.
    pub fn uses_default_secret(&self) -> bool {
        self.secret_key == DEFAULT_SECRET_KEY
    }
}

fn default_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        // ~/Library/Application Support/districtd
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("districtd");
        }
    }
    #[cfg(target_os = "linux")]
    {
        // $XDG_DATA_HOME/districtd or ~/.local/share/districtd
        if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
            if !xdg.is_empty() {
                return PathBuf::from(xdg).join("districtd");
            }
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join(".local")
                .join("share")
                .join("districtd");
        }
    }
    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata).join("districtd");
        }
    }
    PathBuf::from(".districtd")
}

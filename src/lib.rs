pub mod analytics;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod identity;
pub mod policy;
pub mod rest;
pub mod storage;
pub mod tasks;

use std::sync::Arc;

use auth::TokenService;
use config::DaemonConfig;
use storage::Storage;
use tasks::TaskStore;

/// Shared application state passed to every request handler.
///
/// Built once in the process entry point and injected as axum state — there
/// is no ambient global anywhere in the crate.
pub struct AppContext {
    pub config: Arc<DaemonConfig>,
    pub storage: Arc<Storage>,
    pub tasks: Arc<TaskStore>,
    pub tokens: TokenService,
    pub started_at: std::time::Instant,
}

impl AppContext {
    pub fn new(config: Arc<DaemonConfig>, storage: Arc<Storage>) -> Self {
        let tasks = Arc::new(TaskStore::new(storage.pool()));
        let tokens = TokenService::new(
            config.secret_key.as_bytes(),
            config.token_expiry_minutes,
        );
        Self {
            config,
            storage,
            tasks,
            tokens,
            started_at: std::time::Instant::now(),
        }
    }
}

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod core_state;
pub mod crypto;
pub mod db;
pub mod models;

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` wins over the
/// built-in default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}

//! Process-wide shared state: immutable settings, the token service, and
//! per-request database access.

use rusqlite::Connection;
use thiserror::Error;

use crate::config::Settings;
use crate::crypto::TokenService;
use crate::db::{self, DatabaseError};

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Shared by every request handler through `Arc<CoreState>`.
///
/// Nothing in here is mutated after startup.
pub struct CoreState {
    pub settings: Settings,
    pub tokens: TokenService,
}

impl CoreState {
    pub fn new(settings: Settings) -> Self {
        let tokens = TokenService::from_settings(&settings);
        Self { settings, tokens }
    }

    /// Create or upgrade the schema, and drop revocation records that can
    /// no longer matter. Run once before serving.
    pub fn prepare_database(&self) -> Result<(), CoreError> {
        let conn = db::open_database(&self.settings.database_path)?;
        let purged = db::purge_expired_revocations(&conn, chrono::Utc::now().timestamp())?;
        if purged > 0 {
            tracing::info!(purged, "Purged expired refresh-token revocations");
        }
        Ok(())
    }

    /// Open a database connection for one request.
    ///
    /// The connection closes when dropped, whether the request succeeded
    /// or not.
    pub fn open_db(&self) -> Result<Connection, CoreError> {
        db::open_connection(&self.settings.database_path).map_err(CoreError::Database)
    }
}

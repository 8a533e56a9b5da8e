//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::{Error, auth::TokenConfig, db::initialize};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The keys and settings used for issuing and verifying bearer tokens.
    pub token_config: TokenConfig,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_connection: Connection, token_config: TokenConfig) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            token_config,
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }

    /// Lock the database connection for the duration of one operation.
    ///
    /// # Errors
    /// Returns [Error::DatabaseLockError] if the lock is poisoned.
    pub(crate) fn connection(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.db_connection.lock().map_err(|error| {
            tracing::error!("Could not acquire database lock: {error}");
            Error::DatabaseLockError
        })
    }
}

// this impl lets the access guard extract the token settings from our state
impl FromRef<AppState> for TokenConfig {
    fn from_ref(state: &AppState) -> Self {
        state.token_config.clone()
    }
}

//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::{
    Error, auth::TokenKeys, config::Environment, db::initialize, pagination::PaginationConfig,
    timezone::get_local_offset,
};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The keys for signing and verifying access and refresh tokens.
    pub token_keys: TokenKeys,

    /// The environment the server runs in, controls error verbosity.
    pub environment: Environment,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// Decides what "today" is when computing budget periods and forecasts.
    pub local_timezone: String,

    /// The bcrypt cost used when hashing new passwords.
    pub password_hash_cost: u32,

    /// The config that controls how to page lists of data.
    pub pagination_config: PaginationConfig,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for
    /// the domain models and seeding the default categories.
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized or the timezone
    /// is not known.
    pub fn new(
        db_connection: Connection,
        token_keys: TokenKeys,
        environment: Environment,
        local_timezone: &str,
    ) -> Result<Self, Error> {
        if get_local_offset(local_timezone).is_none() {
            return Err(Error::InvalidTimezoneError(local_timezone.to_owned()));
        }

        initialize(&db_connection)?;

        Ok(Self {
            token_keys,
            environment,
            local_timezone: local_timezone.to_owned(),
            password_hash_cost: bcrypt::DEFAULT_COST,
            pagination_config: PaginationConfig::default(),
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }

    /// Use `cost` rounds when hashing passwords, e.g. a low cost in tests.
    pub fn with_password_hash_cost(mut self, cost: u32) -> Self {
        self.password_hash_cost = cost;
        self
    }
}

impl FromRef<AppState> for Environment {
    fn from_ref(state: &AppState) -> Self {
        state.environment
    }
}

/// Lock the shared database connection.
///
/// # Errors
/// Returns [Error::DatabaseLockError] if the mutex was poisoned.
pub(crate) fn lock_connection(
    db_connection: &Mutex<Connection>,
) -> Result<MutexGuard<'_, Connection>, Error> {
    db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })
}


#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{AppState, Environment, Error, TokenKeys};

    #[test]
    fn new_rejects_unknown_timezone() {
        let connection = Connection::open_in_memory().unwrap();

        let result = AppState::new(
            connection,
            TokenKeys::new("a", "b"),
            Environment::Test,
            "Not/AZone",
        );

        assert!(matches!(result, Err(Error::InvalidTimezoneError(_))));
    }
}

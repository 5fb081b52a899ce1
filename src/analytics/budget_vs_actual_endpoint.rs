//! Defines the endpoint comparing budgets with actual spending.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::Response,
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    analytics::comparison::compare,
    app_state::lock_connection,
    auth::UserID,
    date_range::DateRangeQuery,
    extract::ValidatedQuery,
    response::ok,
};

/// The state needed for analytics.
#[derive(Debug, Clone)]
pub struct AnalyticsState {
    /// The database connection for reading budgets and transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AnalyticsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler comparing the user's budgets with their spending between
/// the optional `startDate` and `endDate`.
///
/// # Errors
///
/// Returns a 400 error if either date is malformed.
pub async fn budget_vs_actual_endpoint(
    State(state): State<AnalyticsState>,
    Extension(user_id): Extension<UserID>,
    ValidatedQuery(query): ValidatedQuery<DateRangeQuery>,
) -> Result<Response, Error> {
    let range = query.to_range()?;

    let connection = lock_connection(&state.db_connection)?;
    let report = compare(user_id, range, &connection)?;

    Ok(ok(report))
}

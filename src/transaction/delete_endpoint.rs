//! Defines the endpoint for deleting a transaction.

use axum::{Extension, extract::State, response::Response};

use crate::{
    Error,
    app_state::lock_connection,
    auth::UserID,
    database_id::DatabaseId,
    extract::PathParam,
    response::message,
    transaction::{TransactionState, delete_transaction},
};

/// A route handler for deleting one of the user's transactions.
///
/// # Errors
///
/// Returns a 404 error if the user has no transaction with the ID.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    PathParam(transaction_id): PathParam<DatabaseId>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;
    delete_transaction(transaction_id, user_id, &connection)?;

    Ok(message("transaction deleted successfully"))
}

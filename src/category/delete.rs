//! Defines the endpoint for deleting a category.

use axum::{Extension, extract::State, response::Response};

use crate::{
    Error,
    app_state::lock_connection,
    auth::UserID,
    category::{CategoryState, delete_category},
    database_id::DatabaseId,
    extract::PathParam,
    response::message,
};

/// A route handler for deleting one of the caller's categories.
///
/// # Errors
///
/// Returns a 404 error for default categories and categories of other users.
pub async fn delete_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    PathParam(category_id): PathParam<DatabaseId>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;
    delete_category(category_id, user_id, &connection)?;

    Ok(message("category deleted successfully"))
}

//! The endpoint for logging out a single session.

use axum::{Extension, extract::State, response::Response};

use crate::{
    Error,
    app_state::lock_connection,
    auth::{AuthState, UserID, refresh::RefreshTokenForm, session::revoke_refresh_token},
    extract::ValidatedJson,
    response::message,
};

/// A route handler that forgets the given refresh token.
///
/// The access token stays valid until it expires, clients are expected to
/// discard it.
pub async fn log_out(
    State(state): State<AuthState>,
    Extension(user_id): Extension<UserID>,
    ValidatedJson(form): ValidatedJson<RefreshTokenForm>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;
    revoke_refresh_token(user_id, &form.refresh_token, &connection)?;

    tracing::info!("User {user_id} logged out");

    Ok(message("logged out successfully"))
}

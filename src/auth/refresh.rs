//! The endpoint for exchanging a refresh token for a new token pair.

use axum::{extract::State, response::Response};
use serde::Deserialize;
use validator::Validate;

use crate::{
    Error,
    app_state::lock_connection,
    auth::{AuthState, session::rotate_refresh_token},
    extract::ValidatedJson,
    response::ok,
};

/// A request body carrying a refresh token.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenForm {
    /// The raw refresh token.
    #[validate(length(min = 1, message = "refreshToken is required"))]
    pub refresh_token: String,
}

/// A route handler that rotates a refresh token.
///
/// Refresh tokens are single use. Presenting one a second time revokes every
/// session of its owner.
///
/// # Errors
///
/// Returns a 401 error if the token is invalid, expired or already used.
pub async fn refresh(
    State(state): State<AuthState>,
    ValidatedJson(form): ValidatedJson<RefreshTokenForm>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let (_, tokens) = rotate_refresh_token(&form.refresh_token, &state.token_keys, &connection)?;

    Ok(ok(tokens))
}

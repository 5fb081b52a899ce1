//! The endpoint for logging in with an email and password.

use axum::{extract::State, response::Response};
use serde::Deserialize;
use validator::Validate;

use crate::{
    Error,
    app_state::lock_connection,
    auth::{
        AuthState,
        register::AuthResponse,
        session::issue_token_pair,
        user::get_user_by_email,
    },
    extract::ValidatedJson,
    response::ok,
};

/// The credentials entered during log in.
#[derive(Debug, Deserialize, Validate)]
pub struct LogInForm {
    /// Email entered during log in.
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    /// Password entered during log in.
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// A route handler for logging in a user and starting a new session.
///
/// An unknown email and a wrong password produce the same error.
///
/// # Errors
///
/// Returns a 401 error if the credentials do not match a user.
pub async fn log_in(
    State(state): State<AuthState>,
    ValidatedJson(form): ValidatedJson<LogInForm>,
) -> Result<Response, Error> {
    let user = {
        let connection = lock_connection(&state.db_connection)?;

        match get_user_by_email(&form.email, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => return Err(Error::InvalidCredentials),
            Err(error) => return Err(error),
        }
    };

    user.password_hash
        .check(&form.password, Error::InvalidCredentials)?;

    let connection = lock_connection(&state.db_connection)?;
    let tokens = issue_token_pair(&user, &state.token_keys, &connection)?;

    tracing::info!("User {} logged in", user.id);

    Ok(ok(AuthResponse::new(&user, tokens)))
}

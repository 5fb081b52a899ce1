//! The endpoint for registering a new user.

use axum::{extract::State, response::Response};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    Error,
    app_state::lock_connection,
    auth::{
        AuthState, PasswordHash, TokenPair, User, ValidatedPassword,
        session::issue_token_pair,
        user::{NewUser, UserProfile, create_user, get_user_by_email},
    },
    extract::ValidatedJson,
    response::created,
};

/// The data for registering a user.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    /// The email to log in with.
    #[validate(email(message = "please provide a valid email"))]
    pub email: String,
    /// The raw password, checked by [ValidatedPassword].
    pub password: String,
    /// The user's given name.
    #[validate(length(min = 1, max = 50, message = "firstName must be 1 to 50 characters long"))]
    pub first_name: String,
    /// The user's family name.
    #[validate(length(min = 1, max = 50, message = "lastName must be 1 to 50 characters long"))]
    pub last_name: String,
}

/// A user together with a freshly issued token pair.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// The authenticated user.
    pub user: UserProfile,
    /// The new tokens.
    #[serde(flatten)]
    pub tokens: TokenPair,
}

impl AuthResponse {
    pub(super) fn new(user: &User, tokens: TokenPair) -> Self {
        Self {
            user: user.into(),
            tokens,
        }
    }
}

/// A route handler for registering a new user and starting their first session.
///
/// # Errors
///
/// Returns a 400 error if the input is invalid, e.g. a password that is too
/// short, and a 409 error if the email is already registered.
pub async fn register(
    State(state): State<AuthState>,
    ValidatedJson(form): ValidatedJson<RegisterForm>,
) -> Result<Response, Error> {
    let password = ValidatedPassword::new(&form.password)?;
    let password_hash = PasswordHash::new(password, state.password_hash_cost)?;

    let connection = lock_connection(&state.db_connection)?;

    match get_user_by_email(&form.email, &connection) {
        Ok(_) => {
            return Err(Error::Conflict(
                "a user with this email already exists".to_owned(),
            ));
        }
        Err(Error::NotFound) => {}
        Err(error) => return Err(error),
    }

    let user = create_user(
        NewUser {
            email: form.email,
            password_hash,
            first_name: form.first_name.trim().to_owned(),
            last_name: form.last_name.trim().to_owned(),
        },
        &connection,
    )?;
    let tokens = issue_token_pair(&user, &state.token_keys, &connection)?;

    tracing::info!("Registered user {}", user.id);

    Ok(created(AuthResponse::new(&user, tokens)))
}

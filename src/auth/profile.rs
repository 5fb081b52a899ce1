//! Endpoints for reading and updating the current user's profile and preferences.

use axum::{Extension, extract::State, response::Response};
use serde::Deserialize;
use validator::Validate;

use crate::{
    Error,
    app_state::lock_connection,
    auth::{
        AuthState, UserID,
        user::{
            PreferencesUpdate, UserProfile, get_user_by_id, update_preferences, update_profile,
        },
    },
    extract::ValidatedJson,
    response::ok,
};

/// A partial update to the user's names.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileForm {
    /// The new given name.
    #[validate(length(min = 1, max = 50, message = "firstName must be 1 to 50 characters long"))]
    pub first_name: Option<String>,
    /// The new family name.
    #[validate(length(min = 1, max = 50, message = "lastName must be 1 to 50 characters long"))]
    pub last_name: Option<String>,
}

/// A route handler for getting the current user's profile.
pub async fn get_profile(
    State(state): State<AuthState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let user = get_user_by_id(user_id, &connection)?;

    Ok(ok(UserProfile::from(&user)))
}

/// A route handler for changing the current user's names.
pub async fn put_profile(
    State(state): State<AuthState>,
    Extension(user_id): Extension<UserID>,
    ValidatedJson(form): ValidatedJson<ProfileForm>,
) -> Result<Response, Error> {
    let first_name = form.first_name.as_deref().map(str::trim);
    let last_name = form.last_name.as_deref().map(str::trim);

    let connection = lock_connection(&state.db_connection)?;
    let user = update_profile(user_id, first_name, last_name, &connection)?;

    Ok(ok(UserProfile::from(&user)))
}

/// A route handler for changing the current user's notification preferences.
pub async fn put_preferences(
    State(state): State<AuthState>,
    Extension(user_id): Extension<UserID>,
    ValidatedJson(update): ValidatedJson<PreferencesUpdate>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let user = update_preferences(user_id, update, &connection)?;

    Ok(ok(user.preferences))
}

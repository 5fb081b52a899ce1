//! Endpoints for changing the password and deleting the account, both of
//! which end every session of the user.

use axum::{Extension, extract::State, response::Response};
use serde::Deserialize;
use validator::Validate;

use crate::{
    Error,
    app_state::lock_connection,
    auth::{
        AuthState, PasswordHash, UserID, ValidatedPassword,
        session::{issue_token_pair, revoke_all_refresh_tokens},
        user::{delete_user, get_user_by_id, update_password_hash},
    },
    extract::ValidatedJson,
    response::{message, ok},
};

/// The data for changing the password.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordForm {
    /// The password the user currently logs in with.
    #[validate(length(min = 1, message = "currentPassword is required"))]
    pub current_password: String,
    /// The password to log in with from now on.
    pub new_password: String,
}

/// The password confirming an account deletion.
#[derive(Debug, Deserialize, Validate)]
pub struct DeleteAccountForm {
    /// The password the user currently logs in with.
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// A route handler for changing the password.
///
/// Every existing session is revoked and the caller receives a new token pair.
///
/// # Errors
///
/// Returns a 401 error if the current password is wrong and a 400 error if
/// the new password is not valid.
pub async fn change_password(
    State(state): State<AuthState>,
    Extension(user_id): Extension<UserID>,
    ValidatedJson(form): ValidatedJson<ChangePasswordForm>,
) -> Result<Response, Error> {
    let user = get_user_by_id(user_id, &*lock_connection(&state.db_connection)?)?;

    user.password_hash
        .check(&form.current_password, Error::IncorrectPassword)?;
    let new_password = ValidatedPassword::new(&form.new_password)?;
    let password_hash = PasswordHash::new(new_password, state.password_hash_cost)?;

    let connection = lock_connection(&state.db_connection)?;
    update_password_hash(user_id, &password_hash, &connection)?;
    revoke_all_refresh_tokens(user_id, &connection)?;
    let tokens = issue_token_pair(&user, &state.token_keys, &connection)?;

    tracing::info!("User {user_id} changed their password");

    Ok(ok(tokens))
}

/// A route handler for deleting the account and everything it owns.
///
/// # Errors
///
/// Returns a 401 error if the password is wrong.
pub async fn delete_account(
    State(state): State<AuthState>,
    Extension(user_id): Extension<UserID>,
    ValidatedJson(form): ValidatedJson<DeleteAccountForm>,
) -> Result<Response, Error> {
    let user = get_user_by_id(user_id, &*lock_connection(&state.db_connection)?)?;

    user.password_hash
        .check(&form.password, Error::IncorrectPassword)?;

    let connection = lock_connection(&state.db_connection)?;
    revoke_all_refresh_tokens(user_id, &connection)?;
    delete_user(user_id, &connection)?;

    tracing::info!("Deleted user {user_id}");

    Ok(message("account deleted successfully"))
}

#[cfg(test)]
mod account_tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        app_state::test_utils::{get_test_server, register_test_user},
        endpoints,
    };

    #[tokio::test]
    async fn change_password_revokes_old_sessions() {
        let server = get_test_server();
        let user = register_test_user(&server, "jane@example.com").await;

        let response = server
            .put(endpoints::PASSWORD)
            .authorization_bearer(&user.access_token)
            .json(&json!({
                "currentPassword": "averysecurepassword",
                "newPassword": "anevenbetterpassword",
            }))
            .await;

        response.assert_status_ok();
        let new_refresh_token = response.json::<Value>()["data"]["refreshToken"]
            .as_str()
            .unwrap()
            .to_owned();

        server
            .post(endpoints::REFRESH)
            .json(&json!({ "refreshToken": user.refresh_token }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": "jane@example.com", "password": "anevenbetterpassword" }))
            .await
            .assert_status_ok();
        assert_ne!(new_refresh_token, user.refresh_token);
    }

    #[tokio::test]
    async fn change_password_rejects_wrong_current_password() {
        let server = get_test_server();
        let user = register_test_user(&server, "jane@example.com").await;

        let response = server
            .put(endpoints::PASSWORD)
            .authorization_bearer(&user.access_token)
            .json(&json!({
                "currentPassword": "notmypassword",
                "newPassword": "anevenbetterpassword",
            }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.json::<Value>()["message"],
            "the current password is incorrect"
        );
    }

    #[tokio::test]
    async fn change_password_rejects_short_new_password() {
        let server = get_test_server();
        let user = register_test_user(&server, "jane@example.com").await;

        server
            .put(endpoints::PASSWORD)
            .authorization_bearer(&user.access_token)
            .json(&json!({
                "currentPassword": "averysecurepassword",
                "newPassword": "short",
            }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_account_removes_user() {
        let server = get_test_server();
        let user = register_test_user(&server, "jane@example.com").await;

        server
            .delete(endpoints::ACCOUNT)
            .authorization_bearer(&user.access_token)
            .json(&json!({ "password": "averysecurepassword" }))
            .await
            .assert_status_ok();

        server
            .get(endpoints::PROFILE)
            .authorization_bearer(&user.access_token)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": "jane@example.com", "password": "averysecurepassword" }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn delete_account_requires_password() {
        let server = get_test_server();
        let user = register_test_user(&server, "jane@example.com").await;

        server
            .delete(endpoints::ACCOUNT)
            .authorization_bearer(&user.access_token)
            .json(&json!({ "password": "notmypassword" }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}

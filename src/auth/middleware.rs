//! Authentication middleware that validates bearer access tokens.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    app_state::lock_connection,
    auth::{TokenKeys, UserID, token::TokenKind, user::user_exists},
};

/// The state needed for the auth middleware and auth endpoints.
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The database connection for checking that users still exist.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The keys for signing and verifying tokens.
    pub token_keys: TokenKeys,
    /// The bcrypt cost used when hashing new passwords.
    pub password_hash_cost: u32,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            token_keys: state.token_keys.clone(),
            password_hash_cost: state.password_hash_cost,
        }
    }
}

/// Resolve the bearer access token in `headers` to a registered user.
fn authenticate(state: &AuthState, headers: &HeaderMap) -> Result<UserID, Error> {
    let Authorization(bearer) = headers
        .typed_get::<Authorization<Bearer>>()
        .ok_or(Error::MissingToken)?;

    let user_id = state
        .token_keys
        .decode(TokenKind::Access, bearer.token())?
        .user_id();

    let connection = lock_connection(&state.db_connection)?;
    if user_exists(user_id, &connection)? {
        Ok(user_id)
    } else {
        tracing::debug!("Rejected access token of deleted user {user_id}");
        Err(Error::InvalidToken)
    }
}

/// Middleware function that checks for a valid bearer access token.
///
/// The user ID is placed into the request and the request executed normally
/// if the token is valid, otherwise a 401 error response is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(State(state): State<AuthState>, mut request: Request, next: Next) -> Response {
    match authenticate(&state, request.headers()) {
        Ok(user_id) => {
            request.extensions_mut().insert(user_id);
            next.run(request).await
        }
        Err(error) => error.into_response(),
    }
}

/// The caller's user ID if the request carries a valid access token.
///
/// A missing or invalid token yields `None` rather than an error, so routes
/// using this extractor serve anonymous and signed in callers alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionalUser(pub Option<UserID>);

impl<S> FromRequestParts<S> for OptionalUser
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(AUTHORIZATION) {
            return Ok(Self(None));
        }

        let state = AuthState::from_ref(state);

        match authenticate(&state, &parts.headers) {
            Ok(user_id) => Ok(Self(Some(user_id))),
            Err(Error::MissingToken | Error::InvalidToken) => Ok(Self(None)),
            Err(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod auth_guard_tests {
    use axum::{Extension, Router, extract::FromRef, http::StatusCode, middleware, routing::get};
    use axum_test::TestServer;
    use serde_json::Value;

    use crate::{
        app_state::{lock_connection, test_utils::get_test_app_state},
        auth::{
            AuthState, OptionalUser, PasswordHash, UserID, auth_guard,
            token::TokenKind,
            user::{NewUser, create_user, delete_user},
        },
    };

    const TEST_PROTECTED_ROUTE: &str = "/protected";
    const TEST_OPTIONAL_ROUTE: &str = "/optional";

    async fn protected_handler(Extension(user_id): Extension<UserID>) -> String {
        user_id.to_string()
    }

    async fn optional_handler(OptionalUser(user_id): OptionalUser) -> String {
        match user_id {
            Some(user_id) => user_id.to_string(),
            None => "anonymous".to_owned(),
        }
    }

    fn get_test_server() -> (TestServer, AuthState, UserID) {
        let state = AuthState::from_ref(&get_test_app_state());
        let user_id = {
            let connection = lock_connection(&state.db_connection).unwrap();
            create_user(
                NewUser {
                    email: "jane@example.com".to_owned(),
                    password_hash: PasswordHash::new_unchecked("hunter2"),
                    first_name: "Jane".to_owned(),
                    last_name: "Doe".to_owned(),
                },
                &connection,
            )
            .unwrap()
            .id
        };

        let app = Router::new()
            .route(TEST_PROTECTED_ROUTE, get(protected_handler))
            .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard))
            .route(TEST_OPTIONAL_ROUTE, get(optional_handler))
            .with_state(state.clone());

        (
            TestServer::new(app).expect("Could not create test server."),
            state,
            user_id,
        )
    }

    fn token(state: &AuthState, kind: TokenKind, user_id: UserID) -> String {
        state
            .token_keys
            .encode(kind, user_id, "jane@example.com")
            .unwrap()
    }

    #[tokio::test]
    async fn get_protected_route_with_valid_token() {
        let (server, state, user_id) = get_test_server();

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .authorization_bearer(token(&state, TokenKind::Access, user_id))
            .await;

        response.assert_status_ok();
        response.assert_text(user_id.to_string());
    }

    #[tokio::test]
    async fn get_protected_route_without_token_fails() {
        let (server, _, _) = get_test_server();

        let response = server.get(TEST_PROTECTED_ROUTE).await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.json::<Value>()["message"],
            "not authorized, no token provided"
        );
    }

    #[tokio::test]
    async fn get_protected_route_with_refresh_token_fails() {
        let (server, state, user_id) = get_test_server();

        server
            .get(TEST_PROTECTED_ROUTE)
            .authorization_bearer(token(&state, TokenKind::Refresh, user_id))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn get_protected_route_with_garbage_token_fails() {
        let (server, _, _) = get_test_server();

        server
            .get(TEST_PROTECTED_ROUTE)
            .authorization_bearer("FOOBAR")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn get_protected_route_after_account_deletion_fails() {
        let (server, state, user_id) = get_test_server();
        let access_token = token(&state, TokenKind::Access, user_id);
        delete_user(user_id, &lock_connection(&state.db_connection).unwrap()).unwrap();

        server
            .get(TEST_PROTECTED_ROUTE)
            .authorization_bearer(access_token)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn optional_user_is_anonymous_without_valid_token() {
        let (server, _, _) = get_test_server();

        server
            .get(TEST_OPTIONAL_ROUTE)
            .await
            .assert_text("anonymous");
        server
            .get(TEST_OPTIONAL_ROUTE)
            .authorization_bearer("FOOBAR")
            .await
            .assert_text("anonymous");
    }

    #[tokio::test]
    async fn optional_user_resolves_valid_token() {
        let (server, state, user_id) = get_test_server();

        server
            .get(TEST_OPTIONAL_ROUTE)
            .authorization_bearer(token(&state, TokenKind::Access, user_id))
            .await
            .assert_text(user_id.to_string());
    }
}

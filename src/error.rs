//! Defines the app level error type and its conversion into JSON error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::response::{ErrorDetail, error_body};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request body, query string or path was missing, malformed or out
    /// of range.
    ///
    /// The string explains which input was rejected and is shown to the client.
    #[error("{0}")]
    Validation(String),

    /// The email and password combination did not match a registered user.
    ///
    /// The same error is used for an unknown email and a wrong password so
    /// that clients cannot probe which emails are registered.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The password given to confirm a sensitive action was wrong.
    #[error("the current password is incorrect")]
    IncorrectPassword,

    /// The request did not carry a bearer token.
    #[error("not authorized, no token provided")]
    MissingToken,

    /// The token had a bad signature, the wrong type, had expired or refers
    /// to a user that no longer exists.
    #[error("not authorized, token is invalid or has expired")]
    InvalidToken,

    /// A refresh token that was already consumed was presented again.
    ///
    /// Every session of the token's owner has been revoked when this is returned.
    #[error("not authorized, token is invalid or has expired")]
    RefreshTokenReuse,

    /// The requested resource was not found.
    ///
    /// This is also returned for resources owned by another user so that
    /// clients cannot learn whether another user's record exists.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A unique entity already exists, e.g. a budget for the same category
    /// and period.
    #[error("{0}")]
    Conflict(String),

    /// A date computation left the supported calendar range.
    #[error("date out of range: {0}")]
    DateOutOfRange(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A JSON web token could not be signed.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl Error {
    /// The HTTP status code that represents this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::DateOutOfRange(_) => StatusCode::BAD_REQUEST,
            Error::InvalidCredentials
            | Error::IncorrectPassword
            | Error::MissingToken
            | Error::InvalidToken
            | Error::RefreshTokenReuse => StatusCode::UNAUTHORIZED,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::HashingError(_)
            | Error::TokenCreation(_)
            | Error::InvalidTimezoneError(_)
            | Error::DatabaseLockError
            | Error::SqlError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                Some(ref desc),
            ) => Error::Conflict(conflict_message(desc).to_owned()),
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// Pick a client facing message for a UNIQUE constraint failure from SQLite's
/// description, e.g. "UNIQUE constraint failed: user.email".
fn conflict_message(desc: &str) -> &'static str {
    if desc.contains("user.email") {
        "a user with this email already exists"
    } else if desc.contains("budget.") {
        "a budget for this category and period already exists"
    } else if desc.contains("category.") {
        "a category with this name already exists"
    } else {
        "the resource already exists"
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        if status_code.is_server_error() {
            tracing::error!("An unexpected error occurred: {}", self);
        }

        let message = self.to_string();
        let mut response = (status_code, error_body(&message)).into_response();
        response.extensions_mut().insert(ErrorDetail(message));

        response
    }
}

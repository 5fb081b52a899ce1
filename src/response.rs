//! The JSON envelopes wrapped around every response body.
//!
//! Successful responses look like `{"status": "success", "data": ...}` and
//! errors look like `{"status": "error", "message": "..."}`.

use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::config::Environment;

/// The message shown in place of internal error details in production.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong, please try again later";

/// The unredacted error message attached to error responses.
///
/// [error_envelope] reads this to decide what the client gets to see.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorDetail(pub String);

#[derive(Serialize)]
struct Success<T> {
    status: &'static str,
    data: T,
}

/// Wrap `data` in a success envelope with the status code 200 OK.
pub fn ok<T: Serialize>(data: T) -> Response {
    with_status(StatusCode::OK, data)
}

/// Wrap `data` in a success envelope with the status code 201 Created.
pub fn created<T: Serialize>(data: T) -> Response {
    with_status(StatusCode::CREATED, data)
}

/// Wrap a plain message in a success envelope, e.g. after a deletion.
pub fn message(text: &str) -> Response {
    ok(json!({ "message": text }))
}

fn with_status<T: Serialize>(status_code: StatusCode, data: T) -> Response {
    (
        status_code,
        Json(Success {
            status: "success",
            data,
        }),
    )
        .into_response()
}

/// The body of an error response.
pub fn error_body(message: &str) -> Json<Value> {
    Json(json!({
        "status": "error",
        "message": message,
    }))
}

/// Decide which message a client should see for an error.
///
/// Server errors in production are replaced with [GENERIC_ERROR_MESSAGE] so
/// internals such as SQL errors never leave the server. Everything else is
/// returned as is.
pub fn error_message(detail: &str, status_code: StatusCode, environment: Environment) -> String {
    if status_code.is_server_error() && environment.is_production() {
        GENERIC_ERROR_MESSAGE.to_owned()
    } else {
        detail.to_owned()
    }
}

/// Middleware that rewrites error bodies with [error_message] for the
/// configured environment.
pub async fn error_envelope(
    State(environment): State<Environment>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;

    let Some(ErrorDetail(detail)) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };

    let status_code = response.status();
    let message = error_message(&detail, status_code, environment);

    if message == detail {
        return response;
    }

    (status_code, error_body(&message)).into_response()
}

//! Request extractors that deserialize and validate input in one step.
//!
//! All extractors reject with [Error::Validation] so that malformed input
//! produces the usual 400 error envelope instead of axum's plain text
//! rejections.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::Error;

/// A JSON request body that passed its [Validate] rules.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(request, state)
            .await
            .map_err(|rejection| Error::Validation(rejection.body_text()))?;

        data.validate().map_err(format_validation_errors)?;

        Ok(Self(data))
    }
}

/// A query string that passed its [Validate] rules.
#[derive(Debug, Clone)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(data) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| Error::Validation(rejection.body_text()))?;

        data.validate().map_err(format_validation_errors)?;

        Ok(Self(data))
    }
}

/// Path parameters, e.g. the ID in "/api/budgets/{budget_id}".
#[derive(Debug, Clone)]
pub struct PathParam<T>(pub T);

impl<T, S> FromRequestParts<S> for PathParam<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(data) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| Error::Validation(rejection.body_text()))?;

        Ok(Self(data))
    }
}

/// Flatten validation errors into one message, one sentence per field.
///
/// Fields are sorted so the message is stable between requests.
fn format_validation_errors(errors: ValidationErrors) -> Error {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, field_errors)| {
            field_errors.iter().map(move |error| match &error.message {
                Some(message) => message.to_string(),
                None => format!("{field} is invalid ({})", error.code),
            })
        })
        .collect();
    messages.sort();

    Error::Validation(messages.join("; "))
}

//! REST API module.
//!
//! Contains all API routes and handlers. Every error surfaces as the
//! mapped status code with a JSON `{ message }` body.

mod customers;
mod followups;
mod integrations;
mod leads;

pub use customers::*;
pub use followups::*;
pub use integrations::*;
pub use leads::*;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::Serialize;

use crate::errors::AppError;

/// Handler result: a successful response or an error mapped to its
/// status code and `{ message }` body.
pub type ApiResult<T> = Result<T, AppError>;

/// Plain message response body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// JSON extractor whose rejection is a validation error, so malformed
/// bodies and out-of-enum values yield 400 + `{ message }` rather than
/// axum's default rejection.
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(AppError::Validation(rejection.body_text())),
        }
    }
}

use std::collections::BTreeMap;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::JsonResponse;

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("validation failed: {0:?}")]
    Validation(FieldErrors),
    #[error("{0}")]
    BadRequest(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    NotAuthorized(&'static str),
    #[error("forbidden")]
    Forbidden,
    #[error("{0}")]
    Conflict(&'static str),
    #[error("internal server error")]
    ServerError,
    #[error("database error: {0}")]
    DatabaseError(sqlx::Error),
}

/// Validation messages keyed by the offending request field.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Turns the collected messages into an error, or `Ok` when nothing was collected.
    pub fn into_result(self) -> Result<(), RequestError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(RequestError::Validation(self))
        }
    }
}

#[derive(Serialize, Debug)]
pub struct RequestErrorJsonWrapper {
    errors: FieldErrors,
}

impl RequestErrorJsonWrapper {
    pub fn new(error: &str) -> RequestErrorJsonWrapper {
        RequestErrorJsonWrapper {
            errors: FieldErrors::single("body", error),
        }
    }
}

impl From<sqlx::Error> for RequestError {
    fn from(value: sqlx::Error) -> Self {
        Self::DatabaseError(value)
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> axum::response::Response {
        self.to_json_response().into_response()
    }
}

impl RequestError {
    pub fn to_json_response(&self) -> JsonResponse<RequestErrorJsonWrapper> {
        let (status_code, json) = match self {
            RequestError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                RequestErrorJsonWrapper {
                    errors: errors.clone(),
                },
            ),
            RequestError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                RequestErrorJsonWrapper::new(message),
            ),
            RequestError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                RequestErrorJsonWrapper::new(message),
            ),
            RequestError::NotAuthorized(message) => (
                StatusCode::UNAUTHORIZED,
                RequestErrorJsonWrapper::new(message),
            ),
            RequestError::Forbidden => (
                StatusCode::FORBIDDEN,
                RequestErrorJsonWrapper::new("Forbidden"),
            ),
            RequestError::Conflict(message) => (
                StatusCode::CONFLICT,
                RequestErrorJsonWrapper::new(message),
            ),
            RequestError::ServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                RequestErrorJsonWrapper::new("Internal Server Error"),
            ),
            RequestError::DatabaseError(e) => {
                tracing::error!(error = %e, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    RequestErrorJsonWrapper::new("Internal Server Error"),
                )
            }
        };
        (status_code, Json(json))
    }
}

/// True when SQLite rejected a write because of a UNIQUE (or primary key) constraint.
pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(e) => e.message().contains("UNIQUE constraint failed"),
        _ => false,
    }
}

pub fn is_foreign_key_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(e) => e.message().contains("FOREIGN KEY constraint failed"),
        _ => false,
    }
}

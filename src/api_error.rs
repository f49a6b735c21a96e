use rocket::http::{ContentType, Status};
use rocket::response::{self, Responder, Response};
use rocket::Request;
use serde_json::json;
use thiserror::Error;

use std::io::Cursor;
use std::sync::PoisonError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed: {0:?}")]
    Validation(Vec<String>),

    #[error("missing or invalid session token")]
    Unauthorized,

    #[error("{0}")]
    AccessDenied(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("task already completed this period")]
    AlreadyCompleted,

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("not your completion")]
    NotYourCompletion,

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error("{0}")]
    Internal(String),
}

// Keeps `connection.lock()?` working on the shared Mutex<Connection>.
impl<T> From<PoisonError<T>> for ApiError {
    fn from(_: PoisonError<T>) -> ApiError {
        ApiError::LockPoisoned
    }
}

impl ApiError {
    pub fn access_denied(message: impl Into<String>) -> ApiError {
        ApiError::AccessDenied(message.into())
    }

    fn status(&self) -> Status {
        match self {
            ApiError::Validation(_) | ApiError::AlreadyCompleted => Status::BadRequest,
            ApiError::Unauthorized => Status::Unauthorized,
            ApiError::AccessDenied(_) | ApiError::NotYourCompletion => Status::Forbidden,
            ApiError::NotFound(_) | ApiError::NothingToUndo => Status::NotFound,
            ApiError::Database(_)
            | ApiError::Json(_)
            | ApiError::Io(_)
            | ApiError::LockPoisoned
            | ApiError::Internal(_) => Status::InternalServerError,
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();

        // Storage-level details are logged, never sent to the client.
        let body = if status == Status::InternalServerError {
            tracing::error!(error = %self, "request failed");
            json!({ "error": "internal server error" })
        } else if let ApiError::Validation(fields) = &self {
            json!({ "error": "validation failed", "fields": fields })
        } else {
            json!({ "error": self.to_string() })
        }
        .to_string();

        Response::build()
            .status(status)
            .header(ContentType::JSON)
            .sized_body(body.len(), Cursor::new(body))
            .ok()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

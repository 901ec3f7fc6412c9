mod chat;
pub mod metrics;
mod routes;
mod search;


pub use metrics::StudyBoltMetrics;
pub use routes::create_router;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use studybolt_core::{ChatPipeline, StudyBoltError};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: ChatPipeline,
    pub metrics: Arc<StudyBoltMetrics>,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(pipeline: ChatPipeline) -> Self {
        Self {
            pipeline,
            metrics: Arc::new(StudyBoltMetrics::new()),
            start_time: std::time::Instant::now(),
        }
    }
}

/// Error body: `{error}` plus an optional `message` with details.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Error returned by HTTP handlers before any stream is opened.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    body: ErrorBody,
}

impl AppError {
    pub fn bad_request(error: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody {
                error: error.into(),
                message: None,
            },
        }
    }

    /// A failure the caller did not cause, with `err` as the detail message.
    pub fn failed(error: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorBody {
                error: error.into(),
                message: Some(err.to_string()),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<StudyBoltError> for AppError {
    fn from(err: StudyBoltError) -> Self {
        match err {
            StudyBoltError::Validation(msg) => Self::bad_request(msg),
            other => Self::failed("Request failed", other),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Application error types, mapped to HTTP status codes at the edge.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Road service unavailable: {0}")]
    RoadServiceUnavailable(String),

    #[error("Road service error: {0}")]
    RoadServiceTransient(String),

    #[error("Solver error: {0}")]
    Solver(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Validation(msg) => HttpResponse::BadRequest().json(json!({
                "error": "Validation Error",
                "message": msg
            })),
            AppError::RoadServiceUnavailable(msg) => {
                HttpResponse::ServiceUnavailable().json(json!({
                    "error": "Road Service Unavailable",
                    "message": msg
                }))
            }
            AppError::RoadServiceTransient(msg) => HttpResponse::BadGateway().json(json!({
                "error": "Road Service Error",
                "message": msg
            })),
            AppError::Solver(msg) => HttpResponse::BadGateway().json(json!({
                "error": "Solver Error",
                "message": msg
            })),
            _ => HttpResponse::InternalServerError().json(json!({
                "error": "Internal Server Error",
                "message": self.to_string()
            })),
        }
    }
}

/// Maps a lower-layer orchestration failure (surfaced as `anyhow::Error`
/// from the pipeline) onto the HTTP-facing error hierarchy. The pipeline
/// only ever produces a hard top-level failure for an unavailable road
/// service or a cancelled request; everything else resolves into a
/// (possibly partial) response instead of an error.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(road_err) = err.downcast_ref::<crate::road::RoadError>() {
            if road_err.kind == crate::road::RoadErrorKind::Unavailable {
                return AppError::RoadServiceUnavailable(road_err.message.clone());
            }
        }
        AppError::Internal(err.to_string())
    }
}

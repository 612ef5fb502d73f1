//! Error types for artifact loading, the prediction API and PMB uploads.

use std::path::PathBuf;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Failures raised while loading or running a model/scaler artifact.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed artifact: {0}")]
    Json(#[from] serde_json::Error),

    /// tract reports failures as `anyhow` errors; the message is kept as text.
    #[error("onnx runtime error: {0}")]
    Onnx(String),

    #[error("unsupported artifact format for {0} (expected .onnx or .json)")]
    UnsupportedFormat(PathBuf),

    #[error("invalid artifact: {0}")]
    Invalid(String),

    #[error("shape mismatch: expected {expected} features, got {actual}")]
    Shape { expected: usize, actual: usize },
}

pub type ArtifactResult<T> = Result<T, ArtifactError>;

/// Errors returned by the prediction endpoint as `{"error": ...}` bodies.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Invalid input for scaler transform")]
    ScalerTransform,

    #[error("Trained model ({0}) not found on server")]
    ModelUnavailable(String),

    #[error("{0}")]
    Prediction(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ModelUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidInput(_) | Self::ScalerTransform | Self::Prediction(_) => {
                StatusCode::BAD_REQUEST
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

/// Failures while storing a PMB photo. Rendered into the page, never sent as
/// an HTTP error.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("could not create upload directory: {0}")]
    CreateDir(#[source] std::io::Error),

    #[error("could not write uploaded file: {0}")]
    Write(#[source] std::io::Error),

    #[error("could not store uploaded file: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("upload interrupted: {0}")]
    Stream(String),
}

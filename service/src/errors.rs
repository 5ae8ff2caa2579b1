// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use sftp_key_pipeline::errors::IngestError;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum AppError {
    #[error("validation error: {0}")]
    ValidationError(String),
    /// Read or write faults during ingest. Mapped to a 5xx status so the
    /// event source redelivers; reprocessing is idempotent.
    #[error("transient fault: {0}")]
    TransientFault(String),
    #[error("configuration error: {0}")]
    ConfigError(String),
    #[error("internal server error")]
    InternalServerError,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::TransientFault(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            Self::ConfigError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            Self::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error".to_string(),
            ),
        };

        let body = Json(json!({"code": status.as_u16(), "message": message}));

        (status, body).into_response()
    }
}

impl From<IngestError> for AppError {
    fn from(source: IngestError) -> Self {
        tracing::error!("{:?}", source);
        AppError::TransientFault(source.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(_source: serde_json::Error) -> Self {
        tracing::error!("{:?}", _source);
        AppError::InternalServerError
    }
}

impl From<std::io::Error> for AppError {
    fn from(_source: std::io::Error) -> Self {
        tracing::error!("{:?}", _source);
        AppError::InternalServerError
    }
}

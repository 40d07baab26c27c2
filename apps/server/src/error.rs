use std::io::Error as IoError;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use resmon_service::ResourceError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0:#}")]
    Io(#[from] IoError),
    #[error("Address parsing error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),
    #[error("Configuration error: {0}")]
    Config(#[from] resmon_service::config::Error),
    #[error("{0:#}")]
    Startup(#[from] anyhow::Error),
}

/// A [`ResourceError`] on its way out as an HTTP response
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] ResourceError);

impl ApiError {
    fn detail(&self) -> String {
        match &self.0 {
            ResourceError::AlreadyExists => "Resource with this url already exists".into(),
            ResourceError::NotFound => "Resource not found".into(),
            ResourceError::OutOfRange => "Value is out of range".into(),
            ResourceError::Unavailable => "Resource is unavailable".into(),
            ResourceError::InvalidUrl(reason) => format!("Invalid url: {reason}"),
            ResourceError::MissingState | ResourceError::Storage(_) => "Internal server error".into(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            ResourceError::AlreadyExists => StatusCode::CONFLICT,
            ResourceError::NotFound => StatusCode::NOT_FOUND,
            ResourceError::OutOfRange | ResourceError::Unavailable | ResourceError::InvalidUrl(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ResourceError::MissingState | ResourceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {:#}", self.0);
        }
        HttpResponse::build(status).json(json!({ "detail": self.detail() }))
    }
}

use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::location::LocationError;
use crate::weather::WeatherError;

pub mod error_codes {
    pub const VALIDATION_ERROR: i32 = 1000;
    pub const NOT_FOUND: i32 = 1004;
    pub const RATE_LIMIT: i32 = 1005;
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const UPSTREAM_ERROR: i32 = 5003;
}

/// 对外可见的请求错误
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("API limit exceeded")]
    BudgetExceeded,
    #[error("cannot locate {0}")]
    Location(String),
    #[error("upstream weather service error: {0}")]
    Upstream(String),
    #[error("Malformed request: {0}")]
    MalformedRequest(String),
    #[error("not found")]
    NotFound,
    #[error("cannot render page: {0}")]
    Render(String),
}

/// 启动阶段的错误
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("cannot build http client: {0}")]
    Http(#[from] reqwest::Error),
    #[error("cannot load templates: {0}")]
    Template(#[from] minijinja::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    code: i32,
    error_message: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BudgetExceeded | AppError::Location(_) | AppError::Upstream(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> i32 {
        match self {
            AppError::BudgetExceeded => error_codes::RATE_LIMIT,
            AppError::Location(_) | AppError::Upstream(_) => error_codes::UPSTREAM_ERROR,
            AppError::MalformedRequest(_) => error_codes::VALIDATION_ERROR,
            AppError::NotFound => error_codes::NOT_FOUND,
            AppError::Render(_) => error_codes::INTERNAL_ERROR,
        }
    }
}

impl From<WeatherError> for AppError {
    fn from(e: WeatherError) -> Self {
        match e {
            WeatherError::BudgetExceeded => AppError::BudgetExceeded,
            other => AppError::Upstream(other.to_string()),
        }
    }
}

impl From<LocationError> for AppError {
    fn from(e: LocationError) -> Self {
        match e {
            LocationError::BudgetExceeded => AppError::BudgetExceeded,
            other => AppError::Location(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            code: self.code(),
            error_message: self.to_string(),
        });

        (status, body).into_response()
    }
}

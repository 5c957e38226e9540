use http::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// User-visible fault categories shared by every service in the workspace.
///
/// Service crates keep their own typed errors and convert into `AppError`
/// at the boundary where a fault leaves the core.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Unauthorized: {0}")]
    Unauthorized(anyhow::Error),

    #[error("Forbidden: {0}")]
    Forbidden(anyhow::Error),

    #[error("Conflict: {0}")]
    Conflict(anyhow::Error),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

/// Serializable error body handed to whatever transport renders the fault.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub retryable: bool,
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InternalError(_) | AppError::ConfigError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Only transient faults may be retried. Authorization faults never are.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::ServiceUnavailable(_))
    }

    pub fn to_response(&self) -> ErrorResponse {
        let (error, details) = match self {
            AppError::BadRequest(err)
            | AppError::NotFound(err)
            | AppError::Unauthorized(err)
            | AppError::Forbidden(err)
            | AppError::Conflict(err) => (err.to_string(), None),
            AppError::InternalError(err) => (
                "Internal server error".to_string(),
                Some(format!("{:#?}", err)),
            ),
            AppError::ServiceUnavailable(msg) => {
                ("Service unavailable".to_string(), Some(msg.clone()))
            }
            AppError::ConfigError(err) => {
                ("Configuration error".to_string(), Some(err.to_string()))
            }
        };

        ErrorResponse {
            error,
            details,
            retryable: self.is_retryable(),
        }
    }
}

use service_core::error::AppError;
use thiserror::Error;

use crate::models::{GrantModifier, Target, TargetType};

/// Faults returned by evaluation and grant mutation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("No such right: {0}")]
    NoSuchRight(String),

    #[error("Right {right} is not applicable to target type {target_type}")]
    InvalidTarget {
        right: String,
        target_type: TargetType,
    },

    #[error("Permission denied: {right} on {target}")]
    PermissionDenied { right: String, target: String },

    #[error("Grantor {grantor} lacks delegable right {right} on {target}")]
    GrantorInsufficientRights {
        grantor: String,
        right: String,
        target: Target,
    },

    #[error("Grant already exists: {right} on {target} ({existing:?})")]
    AlreadyGranted {
        right: String,
        target: Target,
        existing: GrantModifier,
    },

    #[error("Grant not found: {right} on {target} ({modifier:?})")]
    GrantNotFound {
        right: String,
        target: Target,
        modifier: GrantModifier,
    },

    #[error("Evaluation unavailable: {0}")]
    EvaluationUnavailable(String),
}

impl AccessError {
    pub fn permission_denied(right: &str, target: &Target) -> Self {
        AccessError::PermissionDenied {
            right: right.to_string(),
            target: target.to_string(),
        }
    }

    /// Stable label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AccessError::NoSuchRight(_) => "no_such_right",
            AccessError::InvalidTarget { .. } => "invalid_target",
            AccessError::PermissionDenied { .. } => "permission_denied",
            AccessError::GrantorInsufficientRights { .. } => "grantor_insufficient_rights",
            AccessError::AlreadyGranted { .. } => "already_granted",
            AccessError::GrantNotFound { .. } => "grant_not_found",
            AccessError::EvaluationUnavailable(_) => "evaluation_unavailable",
        }
    }
}

/// Fault raised by a persistence or directory collaborator.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    #[error("Backend error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<BackendError> for AccessError {
    fn from(err: BackendError) -> Self {
        AccessError::EvaluationUnavailable(err.to_string())
    }
}

/// Fatal start-up faults while building the right catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Duplicate right name: {0}")]
    DuplicateRight(String),

    #[error("Combo right {combo} references unknown right {member}")]
    UnknownMember { combo: String, member: String },

    #[error("Combo right {0} contains itself")]
    ComboCycle(String),

    #[error("Invalid right definition {name}: {reason}")]
    InvalidDefinition { name: String, reason: String },

    #[error("Failed to read right definitions: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse right definitions: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<AccessError> for AppError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::NoSuchRight(_)
            | AccessError::InvalidTarget { .. }
            | AccessError::GrantNotFound { .. } => AppError::BadRequest(anyhow::anyhow!(err)),
            AccessError::PermissionDenied { .. }
            | AccessError::GrantorInsufficientRights { .. } => {
                AppError::Forbidden(anyhow::anyhow!(err))
            }
            AccessError::AlreadyGranted { .. } => AppError::Conflict(anyhow::anyhow!(err)),
            AccessError::EvaluationUnavailable(msg) => AppError::ServiceUnavailable(msg),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

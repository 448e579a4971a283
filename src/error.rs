use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::providers::ProviderError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("invalid plan `{0}`")]
    InvalidPlan(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("unauthorized")]
    Unauthorized,
    #[error("payment {intent_id} already verified")]
    AlreadyVerified { intent_id: Uuid },
    #[error("free plan limited to {limit} lines, got {line_count}; upgrade to premium")]
    QuotaExceeded { line_count: usize, limit: usize },
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("{0}")]
    Message(String),
}

impl AppError {
    /// Stable, machine-checkable error kind surfaced to clients.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Db(_) | AppError::Message(_) => "internal",
            AppError::Provider(ProviderError::UnknownProvider { .. }) => "unknown_provider",
            AppError::Provider(ProviderError::ProviderFailure { .. }) => "provider_failure",
            AppError::Provider(ProviderError::CapabilityUnsupported { .. }) => {
                "capability_unsupported"
            }
            AppError::Provider(ProviderError::Configuration(_)) => "internal",
            AppError::InvalidPlan(_) => "invalid_plan",
            AppError::NotFound(_) => "not_found",
            AppError::Unauthorized => "unauthorized",
            AppError::AlreadyVerified { .. } => "already_verified",
            AppError::QuotaExceeded { .. } => "quota_exceeded",
            AppError::BadRequest(_) => "bad_request",
            AppError::Conflict(_) => "conflict",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidPlan(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyVerified { .. } | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::QuotaExceeded { .. } => StatusCode::FORBIDDEN,
            AppError::Provider(ProviderError::UnknownProvider { .. }) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Provider(ProviderError::ProviderFailure { .. }) => StatusCode::BAD_GATEWAY,
            AppError::Provider(ProviderError::CapabilityUnsupported { .. }) => {
                StatusCode::NOT_IMPLEMENTED
            }
            AppError::Provider(ProviderError::Configuration(_))
            | AppError::Db(_)
            | AppError::Message(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// JSON body: `kind`, a human readable `error`, and the structured fields of the kind.
    pub fn body(&self) -> Value {
        let mut body = Map::new();
        body.insert("kind".into(), json!(self.kind()));
        let message = match self.kind() {
            "internal" => "internal server error".to_string(),
            _ => self.to_string(),
        };
        body.insert("error".into(), json!(message));
        match self {
            AppError::InvalidPlan(plan_type) => {
                body.insert("plan_type".into(), json!(plan_type));
            }
            AppError::AlreadyVerified { intent_id } => {
                body.insert("intent_id".into(), json!(intent_id));
            }
            AppError::QuotaExceeded { line_count, limit } => {
                body.insert("line_count".into(), json!(line_count));
                body.insert("limit".into(), json!(limit));
            }
            AppError::Provider(ProviderError::UnknownProvider { provider }) => {
                body.insert("provider".into(), json!(provider));
            }
            AppError::Provider(ProviderError::ProviderFailure { provider, cause }) => {
                body.insert("provider".into(), json!(provider));
                body.insert("cause".into(), json!(cause.to_string()));
            }
            AppError::Provider(ProviderError::CapabilityUnsupported {
                provider,
                capability,
            }) => {
                body.insert("provider".into(), json!(provider));
                body.insert("capability".into(), json!(capability));
            }
            _ => {}
        }
        Value::Object(body)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(?self);
        } else {
            tracing::debug!(kind = self.kind(), error = %self, "request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

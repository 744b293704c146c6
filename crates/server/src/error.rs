use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use proctor_core::pipeline::detect_faces_use_case::DetectFacesError;

/// Handler error. Every variant renders as a JSON body with a non-empty
/// `error` string; face-check failures also carry a `kind`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing, malformed or undecodable image upload.
    #[error("{0}")]
    Decode(String),

    /// The model session failed or returned something unusable.
    #[error("{0}")]
    Inference(String),

    /// Detection succeeded but the violation could not be recorded.
    #[error("{0}")]
    Store(String),

    #[error("Violation type is required")]
    MissingViolationType,

    /// Failure on the client-reported violation routes. The detail is
    /// logged, not returned.
    #[error("Internal server error")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn kind(&self) -> Option<&'static str> {
        match self {
            ApiError::Decode(_) => Some("decode"),
            ApiError::Inference(_) => Some("inference"),
            ApiError::Store(_) => Some("store"),
            ApiError::MissingViolationType | ApiError::Internal(_) => None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Decode(_) | ApiError::MissingViolationType => StatusCode::BAD_REQUEST,
            ApiError::Inference(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<DetectFacesError> for ApiError {
    fn from(err: DetectFacesError) -> Self {
        let message = err.to_string();
        match err {
            DetectFacesError::Decode(_) => ApiError::Decode(message),
            DetectFacesError::Inference(_) => ApiError::Inference(message),
            DetectFacesError::Store(_) => ApiError::Store(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Decode(msg) => log::warn!("Rejected image: {msg}"),
            ApiError::MissingViolationType => log::warn!("Rejected violation without a type"),
            ApiError::Inference(msg) => log::error!("Face detection failed: {msg}"),
            ApiError::Store(msg) | ApiError::Internal(msg) => {
                log::error!("Violation store failed: {msg}")
            }
        }

        let mut body = json!({ "error": self.to_string() });
        if let Some(kind) = self.kind() {
            body["kind"] = json!(kind);
        }
        (self.status(), Json(body)).into_response()
    }
}

//! Request and response bodies

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use deskpilot_rag::RequestContext;
use serde::{Deserialize, Serialize};

/// Body of both generate endpoints
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub context: RequestContext,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Failures surfaced at the HTTP boundary. Bodies are fixed strings; the
/// underlying cause is logged by the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    MissingPrompt,
    InvalidBody,
    GenerationFailed,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingPrompt | ApiError::InvalidBody => StatusCode::BAD_REQUEST,
            ApiError::GenerationFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ApiError::MissingPrompt => "Prompt is required",
            ApiError::InvalidBody => "Invalid request body",
            ApiError::GenerationFailed => "Failed to generate message",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.message().to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

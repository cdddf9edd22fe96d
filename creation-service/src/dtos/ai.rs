use crate::error::CreationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ArticleRequest {
    #[validate(length(min = 1, max = 4000, message = "Prompt must be 1-4000 characters"))]
    pub prompt: String,

    /// Requested length in output tokens.
    pub length: Option<u32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BlogTitleRequest {
    #[validate(length(min = 1, max = 1000, message = "Prompt must be 1-1000 characters"))]
    pub prompt: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ImageRequest {
    #[validate(length(min = 1, max = 1000, message = "Prompt must be 1-1000 characters"))]
    pub prompt: String,

    #[serde(default)]
    pub publish: bool,
}

/// Response envelope shared by every capability endpoint.
///
/// Failures are reported in-band with HTTP 200.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiResponse {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            success: true,
            content: Some(content.into()),
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            content: None,
            message: Some(message.into()),
        }
    }
}

impl From<Result<String, CreationError>> for ApiResponse {
    fn from(result: Result<String, CreationError>) -> Self {
        match result {
            Ok(content) => ApiResponse::success(content),
            Err(e) => ApiResponse::failure(e.to_string()),
        }
    }
}

impl From<CreationError> for ApiResponse {
    fn from(err: CreationError) -> Self {
        ApiResponse::failure(err.to_string())
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_omits_message() {
        let json = serde_json::to_value(ApiResponse::success("hello")).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "content": "hello"}));
    }

    #[test]
    fn failure_envelope_carries_error_text() {
        let response: ApiResponse =
            Err(CreationError::EntitlementDenied("Premium feature only".to_string())).into();
        let json = serde_json::to_value(response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"success": false, "message": "Premium feature only"})
        );
    }

    #[test]
    fn empty_prompt_fails_validation() {
        let req = BlogTitleRequest {
            prompt: String::new(),
        };
        assert!(req.validate().is_err());
    }
}

use std::collections::HashMap;

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use rmcp::model::Content;
use serde::Serialize;

/// Failure talking to the GitHub REST API.
#[derive(Debug, thiserror::Error)]
pub enum GithubError {
    #[error("invalid GitHub API base URL: {0}")]
    BaseUrl(String),

    #[error("request to GitHub failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("GitHub API error {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("unexpected GitHub response: {0}")]
    Decode(String),
}

impl GithubError {
    /// Builds an upstream error from a non-success response. The caller-facing
    /// message is GitHub's `message` field; the full body only goes to the log.
    pub async fn from_response(status: reqwest::StatusCode, response: reqwest::Response) -> Self {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), body = %body, "GitHub API returned an error");

        let fallback = status
            .canonical_reason()
            .unwrap_or("GitHub API error")
            .to_string();

        let message = serde_json::from_str::<HashMap<String, serde_json::Value>>(&body)
            .ok()
            .and_then(|map| {
                map.get("message")
                    .and_then(|m| m.as_str().map(str::to_string))
            })
            .unwrap_or(fallback);

        Self::Upstream {
            status: status.as_u16(),
            message,
        }
    }
}

/// Failure of a single tool call. Reported back to the caller as a tool error
/// result, never as a protocol failure.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("invalid argument `{field}`: {reason}")]
    InvalidArgument { field: &'static str, reason: String },

    #[error(transparent)]
    Github(#[from] GithubError),

    #[error("failed to encode tool output: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ToolError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field,
            reason: reason.into(),
        }
    }
}

impl rmcp::model::IntoContents for ToolError {
    fn into_contents(self) -> Vec<Content> {
        vec![Content::text(self.to_string())]
    }
}

/// OAuth error codes used by the façade endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthErrorCode {
    InvalidRequest,
    InvalidClientMetadata,
    InvalidGrant,
    UnsupportedGrantType,
}

impl OAuthErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthErrorCode::InvalidRequest => "invalid_request",
            OAuthErrorCode::InvalidClientMetadata => "invalid_client_metadata",
            OAuthErrorCode::InvalidGrant => "invalid_grant",
            OAuthErrorCode::UnsupportedGrantType => "unsupported_grant_type",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{}: {description}", .code.as_str())]
pub struct OAuthError {
    pub code: OAuthErrorCode,
    pub description: String,
    pub status: StatusCode,
}

impl OAuthError {
    pub fn new(code: OAuthErrorCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
            status: StatusCode::BAD_REQUEST,
        }
    }

    pub fn invalid_request(description: impl Into<String>) -> Self {
        Self::new(OAuthErrorCode::InvalidRequest, description)
    }

    pub fn method_not_allowed(method: &str) -> Self {
        Self {
            status: StatusCode::METHOD_NOT_ALLOWED,
            ..Self::invalid_request(format!("method {method} is not allowed, use POST"))
        }
    }
}

#[derive(Serialize)]
struct OAuthErrorBody<'a> {
    error: &'static str,
    error_description: &'a str,
}

impl IntoResponse for OAuthError {
    fn into_response(self) -> Response {
        let body = OAuthErrorBody {
            error: self.code.as_str(),
            error_description: &self.description,
        };
        let mut response = (self.status, Json(body)).into_response();
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_error_mentions_status() {
        let err = GithubError::Upstream {
            status: 404,
            message: "Not Found".to_string(),
        };

        assert_eq!(err.to_string(), "GitHub API error 404: Not Found");
    }

    #[test]
    fn invalid_argument_names_field() {
        let err = ToolError::invalid("owner", "must not be empty");
        assert_eq!(err.to_string(), "invalid argument `owner`: must not be empty");
    }

    #[test]
    fn method_not_allowed_keeps_invalid_request_code() {
        let err = OAuthError::method_not_allowed("GET");
        assert_eq!(err.status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(err.code, OAuthErrorCode::InvalidRequest);
    }
}

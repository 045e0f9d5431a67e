//! A stateless OAuth 2.0 façade.
//!
//! This speaks enough of RFC 8414 (discovery), RFC 7591 (dynamic client
//! registration) and RFC 6749 (token exchange) for a generic OAuth client to
//! obtain a bearer token, but it performs **no authorization**. The token it
//! hands out is whatever secret the caller supplied, normally a GitHub
//! personal access token typed into a client-secret field. Nothing is stored:
//! registered clients, codes and tokens are forgotten as soon as the response
//! is written, and GitHub stays the only authority on whether a token works.

pub mod routes;

use std::time::{SystemTime, UNIX_EPOCH};

use rand::{RngCore, rngs::OsRng};
use serde::{Deserialize, Serialize};

use crate::error::{OAuthError, OAuthErrorCode};

pub use routes::{OAuthState, router};

pub const GRANT_TYPES: [&str; 3] = ["client_credentials", "authorization_code", "refresh_token"];
pub const SCOPES: [&str; 1] = ["repo:read"];

/// RFC 8414 authorization server metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthorizationServerMetadata {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub registration_endpoint: String,
    pub response_types_supported: Vec<String>,
    pub grant_types_supported: Vec<String>,
    pub token_endpoint_auth_methods_supported: Vec<String>,
    pub code_challenge_methods_supported: Vec<String>,
    pub scopes_supported: Vec<String>,
}

/// RFC 9728 protected resource metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProtectedResourceMetadata {
    pub resource: String,
    pub authorization_servers: Vec<String>,
    pub bearer_methods_supported: Vec<String>,
    pub scopes_supported: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn metadata(issuer: &str) -> AuthorizationServerMetadata {
    let issuer = issuer.trim_end_matches('/');
    AuthorizationServerMetadata {
        issuer: issuer.to_string(),
        authorization_endpoint: format!("{issuer}/authorize"),
        token_endpoint: format!("{issuer}/token"),
        registration_endpoint: format!("{issuer}/register"),
        response_types_supported: strings(&["code"]),
        grant_types_supported: strings(&GRANT_TYPES),
        token_endpoint_auth_methods_supported: strings(&["client_secret_post", "none"]),
        code_challenge_methods_supported: strings(&["S256"]),
        scopes_supported: strings(&SCOPES),
    }
}

pub fn resource_metadata(resource: &str, issuer: &str) -> ProtectedResourceMetadata {
    ProtectedResourceMetadata {
        resource: resource.to_string(),
        authorization_servers: vec![issuer.trim_end_matches('/').to_string()],
        bearer_methods_supported: strings(&["header"]),
        scopes_supported: strings(&SCOPES),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RegistrationRequest {
    #[serde(default)]
    pub redirect_uris: Option<Vec<String>>,
    pub client_name: Option<String>,
    pub grant_types: Option<Vec<String>>,
    pub response_types: Option<Vec<String>>,
    pub token_endpoint_auth_method: Option<String>,
}

/// RFC 7591 registration response. Not stored anywhere: a later token
/// request is accepted whether or not this client was ever registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredClient {
    pub client_id: String,
    pub client_secret: String,
    pub client_id_issued_at: u64,
    /// Zero means the secret never expires.
    pub client_secret_expires_at: u64,
    pub redirect_uris: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    pub grant_types: Vec<String>,
    pub response_types: Vec<String>,
    pub token_endpoint_auth_method: String,
}

pub fn register(request: RegistrationRequest) -> Result<RegisteredClient, OAuthError> {
    let redirect_uris = request
        .redirect_uris
        .filter(|uris| !uris.is_empty())
        .ok_or_else(|| {
            OAuthError::new(
                OAuthErrorCode::InvalidClientMetadata,
                "redirect_uris must be a non-empty array",
            )
        })?;

    Ok(RegisteredClient {
        client_id: random_hex(16),
        client_secret: random_hex(32),
        client_id_issued_at: unix_now(),
        client_secret_expires_at: 0,
        redirect_uris,
        client_name: request.client_name,
        grant_types: request
            .grant_types
            .unwrap_or_else(|| strings(&["authorization_code", "refresh_token"])),
        response_types: request.response_types.unwrap_or_else(|| strings(&["code"])),
        token_endpoint_auth_method: request
            .token_endpoint_auth_method
            .unwrap_or_else(|| "client_secret_post".to_string()),
    })
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct TokenRequest {
    pub grant_type: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub code: Option<String>,
    pub refresh_token: Option<String>,
    pub redirect_uri: Option<String>,
    pub code_verifier: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl TokenResponse {
    fn bearer(access_token: String, refresh_token: Option<String>) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
            refresh_token,
        }
    }
}

/// Turns a token request into a token response.
pub trait TokenExchange: Send + Sync {
    fn exchange(&self, request: TokenRequest) -> Result<TokenResponse, OAuthError>;
}

/// Identity transform over credentials: the access token returned is exactly
/// the secret presented. It mints nothing and validates nothing, and must not
/// be mistaken for a [`TokenExchange`] that authorizes anyone.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughTokenExchange;

impl TokenExchange for PassthroughTokenExchange {
    fn exchange(&self, request: TokenRequest) -> Result<TokenResponse, OAuthError> {
        let grant_type = present(request.grant_type)
            .ok_or_else(|| OAuthError::invalid_request("grant_type is required"))?;

        match grant_type.as_str() {
            "client_credentials" => {
                let secret = present(request.client_secret)
                    .ok_or_else(|| OAuthError::invalid_request("client_secret is required"))?;
                Ok(TokenResponse::bearer(secret, None))
            }
            // The code is never issued in a way that could be checked, so it
            // is ignored; only the presented secret matters.
            "authorization_code" => {
                let secret = present(request.client_secret).ok_or_else(|| {
                    OAuthError::new(OAuthErrorCode::InvalidGrant, "client_secret is required")
                })?;
                Ok(TokenResponse::bearer(secret, None))
            }
            "refresh_token" => {
                let token = present(request.refresh_token)
                    .ok_or_else(|| OAuthError::invalid_request("refresh_token is required"))?;
                Ok(TokenResponse::bearer(token.clone(), Some(token)))
            }
            other => Err(OAuthError::new(
                OAuthErrorCode::UnsupportedGrantType,
                format!("grant type `{other}` is not supported"),
            )),
        }
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Decodes a token request body. Form encoding is tried first when the
/// content type says so, then JSON, then form as a last resort.
pub fn decode_token_request(
    content_type: Option<&str>,
    body: &[u8],
) -> Result<TokenRequest, OAuthError> {
    let is_form = content_type
        .is_some_and(|ct| ct.trim().starts_with("application/x-www-form-urlencoded"));

    if is_form {
        if let Some(request) = form_request(body, false) {
            return Ok(request);
        }
    }

    if let Ok(request) = serde_json::from_slice::<TokenRequest>(body) {
        return Ok(request);
    }

    if !is_form {
        if let Some(request) = form_request(body, true) {
            return Ok(request);
        }
    }

    Err(OAuthError::invalid_request(
        "request body must be form-encoded or JSON",
    ))
}

fn form_request(body: &[u8], require_grant_type: bool) -> Option<TokenRequest> {
    let fields: serde_json::Map<String, serde_json::Value> = url::form_urlencoded::parse(body)
        .into_owned()
        .map(|(key, value)| (key, serde_json::Value::String(value)))
        .collect();

    if require_grant_type && !fields.contains_key("grant_type") {
        return None;
    }

    serde_json::from_value(serde_json::Value::Object(fields)).ok()
}

/// Hex-encoded bytes from the operating system CSPRNG.
pub fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

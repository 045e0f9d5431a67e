use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{any, get},
};
use serde::Deserialize;
use url::Url;

use super::{
    PassthroughTokenExchange, RegistrationRequest, TokenExchange, decode_token_request, metadata,
    random_hex, register as register_client, resource_metadata,
};
use crate::error::{OAuthError, OAuthErrorCode};

#[derive(Clone)]
pub struct OAuthState {
    /// Fixed issuer; derived from the request's host when unset.
    public_url: Option<String>,
    exchange: Arc<dyn TokenExchange>,
}

impl OAuthState {
    pub fn new(public_url: Option<String>) -> Self {
        Self::with_exchange(public_url, Arc::new(PassthroughTokenExchange))
    }

    pub fn with_exchange(public_url: Option<String>, exchange: Arc<dyn TokenExchange>) -> Self {
        Self {
            public_url: public_url.map(|url| url.trim_end_matches('/').to_string()),
            exchange,
        }
    }

    fn issuer(&self, headers: &HeaderMap) -> String {
        if let Some(url) = &self.public_url {
            return url.clone();
        }

        let host = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("localhost");
        let scheme = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .unwrap_or("http");

        format!("{scheme}://{host}")
    }
}

/// Discovery, registration, authorize and token endpoints.
///
/// Every response carries `Cache-Control: no-store`; token responses contain
/// credentials and must not be cached by intermediaries.
pub fn router(state: OAuthState) -> Router {
    Router::new()
        .route(
            "/.well-known/oauth-authorization-server",
            get(authorization_server_metadata),
        )
        .route(
            "/.well-known/oauth-authorization-server/{*rest}",
            get(authorization_server_metadata),
        )
        .route(
            "/.well-known/oauth-protected-resource",
            get(protected_resource_metadata),
        )
        .route(
            "/.well-known/oauth-protected-resource/{*rest}",
            get(protected_resource_metadata_for_path),
        )
        .route("/authorize", get(authorize))
        .route("/register", any(register))
        .route("/token", any(token))
        .with_state(state)
}

fn no_store(response: impl IntoResponse) -> Response {
    let mut response = response.into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

async fn authorization_server_metadata(
    State(state): State<OAuthState>,
    headers: HeaderMap,
) -> Response {
    no_store(Json(metadata(&state.issuer(&headers))))
}

async fn protected_resource_metadata(
    State(state): State<OAuthState>,
    headers: HeaderMap,
) -> Response {
    let issuer = state.issuer(&headers);
    no_store(Json(resource_metadata(&format!("{issuer}/mcp"), &issuer)))
}

async fn protected_resource_metadata_for_path(
    State(state): State<OAuthState>,
    Path(rest): Path<String>,
    headers: HeaderMap,
) -> Response {
    let issuer = state.issuer(&headers);
    let resource = format!("{issuer}/{}", rest.trim_start_matches('/'));
    no_store(Json(resource_metadata(&resource, &issuer)))
}

#[derive(Debug, Deserialize)]
struct AuthorizeParams {
    redirect_uri: Option<String>,
    state: Option<String>,
}

/// Redirects straight back with a throwaway code. There is no consent step:
/// the code is never checked, the token endpoint only looks at the secret.
async fn authorize(Query(params): Query<AuthorizeParams>) -> Response {
    let Some(mut redirect) = params
        .redirect_uri
        .as_deref()
        .and_then(|uri| Url::parse(uri).ok())
    else {
        return OAuthError::invalid_request("redirect_uri must be an absolute URL").into_response();
    };

    {
        let mut query = redirect.query_pairs_mut();
        query.append_pair("code", &random_hex(16));
        if let Some(state) = &params.state {
            query.append_pair("state", state);
        }
    }

    no_store((StatusCode::FOUND, [(header::LOCATION, redirect.to_string())]))
}

async fn register(method: Method, body: Bytes) -> Response {
    if method != Method::POST {
        return OAuthError::method_not_allowed(method.as_str()).into_response();
    }

    let value: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(_) => {
            return OAuthError::invalid_request("request body must be JSON").into_response();
        }
    };

    let request: RegistrationRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(err) => {
            return OAuthError::new(OAuthErrorCode::InvalidClientMetadata, err.to_string())
                .into_response();
        }
    };

    match register_client(request) {
        Ok(client) => {
            tracing::info!(client_id = %client.client_id, "registered OAuth client");
            no_store((StatusCode::CREATED, Json(client)))
        }
        Err(err) => err.into_response(),
    }
}

async fn token(
    State(state): State<OAuthState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if method != Method::POST {
        return OAuthError::method_not_allowed(method.as_str()).into_response();
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    let result = decode_token_request(content_type, &body).and_then(|request| {
        let grant_type = request.grant_type.clone().unwrap_or_default();
        state.exchange.exchange(request).inspect(|_| {
            tracing::info!(grant_type = %grant_type, "exchanged token");
        })
    });

    match result {
        Ok(response) => no_store(Json(response)),
        Err(err) => {
            tracing::debug!(error = %err, "token request rejected");
            err.into_response()
        }
    }
}

//! Per-call credential resolution.
//!
//! A [`Credential`] is an opaque GitHub token. It is never parsed or
//! validated here; GitHub decides whether it is any good.

use std::fmt;

use axum::http::{HeaderMap, header};

/// Opaque bearer credential forwarded to GitHub.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a token, treating blank input as no credential at all.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(4).collect();
        write!(f, "Credential({prefix}…)")
    }
}

/// Chooses the credential for an inbound call.
///
/// A well-formed `Authorization: Bearer <token>` header wins; otherwise the
/// fallback configured at startup is used, which may itself be absent
/// (anonymous GitHub access).
#[derive(Clone, Debug, Default)]
pub struct CredentialResolver {
    fallback: Option<Credential>,
}

impl CredentialResolver {
    pub fn new(fallback: Option<Credential>) -> Self {
        Self { fallback }
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// `headers` is `None` for transports without HTTP framing (stdio).
    pub fn resolve(&self, headers: Option<&HeaderMap>) -> Option<Credential> {
        headers
            .and_then(bearer_token)
            .or_else(|| self.fallback.clone())
    }
}

/// Extracts the token from `Authorization: Bearer <token>`, if present.
pub fn bearer_token(headers: &HeaderMap) -> Option<Credential> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Credential::new(token.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(auth: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(auth).unwrap());
        headers
    }

    #[test]
    fn bearer_header_is_returned_verbatim() {
        let resolver = CredentialResolver::new(Credential::new("operator"));
        let headers = headers_with("Bearer ghp_not-a-real-token");

        let credential = resolver.resolve(Some(&headers)).unwrap();
        assert_eq!(credential.expose(), "ghp_not-a-real-token");
    }

    #[test]
    fn scheme_is_case_insensitive() {
        let headers = headers_with("bearer abc");
        assert_eq!(bearer_token(&headers).unwrap().expose(), "abc");
    }

    #[test]
    fn missing_header_falls_back_to_default() {
        let resolver = CredentialResolver::new(Credential::new("operator"));
        let credential = resolver.resolve(Some(&HeaderMap::new())).unwrap();
        assert_eq!(credential.expose(), "operator");
    }

    #[test]
    fn no_header_and_no_default_is_anonymous() {
        let resolver = CredentialResolver::default();
        assert!(resolver.resolve(Some(&HeaderMap::new())).is_none());
        assert!(resolver.resolve(None).is_none());
    }

    #[test]
    fn non_bearer_schemes_are_ignored() {
        let resolver = CredentialResolver::new(Credential::new("operator"));
        let headers = headers_with("Basic dXNlcjpwYXNz");

        let credential = resolver.resolve(Some(&headers)).unwrap();
        assert_eq!(credential.expose(), "operator");
    }

    #[test]
    fn empty_bearer_token_falls_back() {
        let resolver = CredentialResolver::default();
        let headers = headers_with("Bearer   ");
        assert!(resolver.resolve(Some(&headers)).is_none());
    }

    #[test]
    fn debug_output_is_redacted() {
        let credential = Credential::new("ghp_secretvalue").unwrap();
        assert_eq!(format!("{credential:?}"), "Credential(ghp_…)");
    }
}

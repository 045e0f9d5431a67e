pub mod types;

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::{credential::Credential, error::GithubError};

/// Upper bound for any `per_page` value sent upstream.
pub const MAX_PER_PAGE: u32 = 30;

const ACCEPT_JSON: &str = "application/vnd.github+json";
const ACCEPT_RAW: &str = "application/vnd.github.raw+json";

/// A GitHub API path plus query string, built from caller-supplied pieces.
///
/// Segments are percent-encoded when the URL is assembled, so a segment can
/// never introduce extra path components or a query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Endpoint {
    segments: Vec<String>,
    query: Vec<(&'static str, String)>,
}

impl Endpoint {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
            query: Vec::new(),
        }
    }

    /// Appends `segment` as one path segment, even if it contains `/`.
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Appends each non-empty `/`-separated piece of `path` as its own segment.
    pub fn path(mut self, path: &str) -> Self {
        self.segments.extend(
            path.split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        );
        self
    }

    pub fn query(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    pub fn query_opt(self, key: &'static str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    pub fn per_page(self, per_page: u32) -> Self {
        self.query("per_page", clamp_per_page(per_page))
    }
}

pub fn clamp_per_page(per_page: u32) -> u32 {
    per_page.min(MAX_PER_PAGE)
}

#[derive(Clone)]
pub struct GithubClient {
    http: Client,
    base_url: Url,
}

impl GithubClient {
    pub fn new(api_base: &str) -> Result<Self, GithubError> {
        let base_url = Url::parse(api_base.trim_end_matches('/'))
            .map_err(|err| GithubError::BaseUrl(err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(GithubError::BaseUrl(api_base.to_string()));
        }

        let http = Client::builder()
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self { http, base_url })
    }

    /// GETs `endpoint` and decodes the JSON body.
    pub async fn call_json<T>(
        &self,
        endpoint: &Endpoint,
        credential: Option<&Credential>,
    ) -> Result<T, GithubError>
    where
        T: DeserializeOwned,
    {
        let response = self.send(endpoint, credential, ACCEPT_JSON).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|err| GithubError::Decode(err.to_string()))
    }

    /// GETs `endpoint` with raw-content negotiation and returns the body text.
    pub async fn call_raw(
        &self,
        endpoint: &Endpoint,
        credential: Option<&Credential>,
    ) -> Result<String, GithubError> {
        let response = self.send(endpoint, credential, ACCEPT_RAW).await?;
        Ok(response.text().await?)
    }

    pub fn build_url(&self, endpoint: &Endpoint) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut parts) = url.path_segments_mut() {
            parts.pop_if_empty();
            parts.extend(&endpoint.segments);
        }
        if !endpoint.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(endpoint.query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        url
    }

    async fn send(
        &self,
        endpoint: &Endpoint,
        credential: Option<&Credential>,
        accept: &'static str,
    ) -> Result<reqwest::Response, GithubError> {
        let url = self.build_url(endpoint);
        tracing::debug!(path = url.path(), authenticated = credential.is_some(), "GitHub request");

        let mut builder = self
            .http
            .get(url)
            .header("Accept", accept)
            .header("X-GitHub-Api-Version", "2022-11-28");

        if let Some(credential) = credential {
            builder = builder.bearer_auth(credential.expose());
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GithubError::from_response(status, response).await);
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GithubClient {
        GithubClient::new("https://api.example.com/").unwrap()
    }

    #[test]
    fn builds_url_from_segments_and_query() {
        let endpoint = Endpoint::new(["repos", "octo", "hello"])
            .query("state", "open")
            .per_page(5);

        let url = client().build_url(&endpoint);

        assert_eq!(
            url.as_str(),
            "https://api.example.com/repos/octo/hello?state=open&per_page=5"
        );
    }

    #[test]
    fn clamps_per_page() {
        let endpoint = Endpoint::new(["search", "code"]).per_page(100);
        let url = client().build_url(&endpoint);

        assert_eq!(url.query(), Some("per_page=30"));
        assert_eq!(clamp_per_page(31), 30);
        assert_eq!(clamp_per_page(30), 30);
        assert_eq!(clamp_per_page(7), 7);
    }

    #[test]
    fn encodes_segments_and_query_values() {
        let endpoint = Endpoint::new(["repos", "octo", "hello", "contents"])
            .path("docs/a b?.md")
            .query("ref", "feature/x&y");

        let url = client().build_url(&endpoint);

        assert_eq!(url.path(), "/repos/octo/hello/contents/docs/a%20b%3F.md");
        assert_eq!(url.query(), Some("ref=feature%2Fx%26y"));
    }

    #[test]
    fn keeps_base_path_prefix() {
        let client = GithubClient::new("https://ghe.example.com/api/v3").unwrap();
        let url = client.build_url(&Endpoint::new(["repos", "a", "b"]));

        assert_eq!(url.as_str(), "https://ghe.example.com/api/v3/repos/a/b");
    }

    #[test]
    fn skips_empty_path_pieces() {
        let url = client().build_url(&Endpoint::new(["contents"]).path("/src//lib.rs/"));
        assert_eq!(url.path(), "/contents/src/lib.rs");
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(matches!(
            GithubClient::new("not a url"),
            Err(GithubError::BaseUrl(_))
        ));
    }
}

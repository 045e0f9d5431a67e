pub mod cli;
pub mod client;
pub mod credential;
pub mod error;
pub mod models;
pub mod oauth;
pub mod server;
pub mod tools;
pub mod transport;

use std::net::SocketAddr;

use cli::{Args, Transport};
use client::GithubClient;
use credential::CredentialResolver;
use oauth::OAuthState;
use server::GithubServer;
use tools::ToolRegistry;

pub async fn run(args: Args) -> anyhow::Result<()> {
    let resolver = CredentialResolver::new(args.resolve_token());
    let client = GithubClient::new(&args.api_base)?;
    let server = GithubServer::new(ToolRegistry::new(client), resolver.clone());

    tracing::info!(
        transport = args.transport.as_str(),
        api_base = %args.api_base,
        default_credential = resolver.has_fallback(),
        "starting github-explorer-mcp"
    );
    if !resolver.has_fallback() {
        tracing::warn!("no default GitHub token; calls without a bearer token are anonymous and rate limited");
    }

    let addr = SocketAddr::new(args.bind, args.port);
    match args.transport {
        Transport::Stdio => transport::serve_stdio(server).await,
        Transport::Http => transport::serve_http(transport::http_router(server), addr).await,
        Transport::Edge => {
            let oauth = OAuthState::new(args.public_url.clone());
            transport::serve_http(transport::edge_router(server, oauth), addr).await
        }
    }
}

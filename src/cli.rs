use std::{env, net::IpAddr};

use clap::{Parser, ValueEnum};

use crate::credential::Credential;

/// Command-line arguments for configuring the MCP server.
#[derive(Parser, Debug)]
#[command(
    name = "github-explorer-mcp",
    version,
    about = "Read-only MCP server for exploring public GitHub repositories"
)]
pub struct Args {
    /// How the server is exposed.
    #[arg(long, value_enum, default_value_t = Transport::Http)]
    pub transport: Transport,

    /// Address to bind the HTTP listener to.
    #[arg(long, default_value = "127.0.0.1")]
    pub bind: IpAddr,

    /// Port for the HTTP listener.
    #[arg(long, default_value_t = 3000)]
    pub port: u16,

    /// GitHub API base URL, defaults to the public API.
    #[arg(long, default_value = "https://api.github.com")]
    pub api_base: String,

    /// Personal access token used when a request brings none of its own.
    #[arg(long)]
    pub token: Option<String>,

    /// Environment variable name to read the GitHub token from when --token is not provided.
    #[arg(long, default_value = "GITHUB_TOKEN")]
    pub token_env: String,

    /// Public base URL advertised as the OAuth issuer (edge transport only).
    /// Derived from the Host header when omitted.
    #[arg(long)]
    pub public_url: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum Transport {
    /// One persistent session over stdin/stdout.
    Stdio,
    /// Streamable HTTP at `/mcp`, one server instance per request.
    Http,
    /// Streamable HTTP plus the pass-through OAuth endpoints, for hosted connectors.
    Edge,
}

impl Transport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Stdio => "stdio",
            Transport::Http => "http",
            Transport::Edge => "edge",
        }
    }
}

impl Args {
    pub fn resolve_token(&self) -> Option<Credential> {
        self.token
            .clone()
            .and_then(Credential::new)
            .or_else(|| {
                if self.token_env.is_empty() {
                    None
                } else {
                    env::var(&self.token_env).ok().and_then(Credential::new)
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_anonymous_http() {
        let args = Args::parse_from(["github-explorer-mcp", "--token-env", ""]);

        assert_eq!(args.transport, Transport::Http);
        assert_eq!(args.port, 3000);
        assert_eq!(args.api_base, "https://api.github.com");
        assert!(args.resolve_token().is_none());
    }

    #[test]
    fn explicit_token_wins() {
        let args = Args::parse_from([
            "github-explorer-mcp",
            "--transport",
            "stdio",
            "--token",
            "ghp_flag",
        ]);

        assert_eq!(args.transport, Transport::Stdio);
        assert_eq!(args.resolve_token().unwrap().expose(), "ghp_flag");
    }

    #[test]
    fn blank_token_counts_as_absent() {
        let args = Args::parse_from(["github-explorer-mcp", "--token", " ", "--token-env", ""]);
        assert!(args.resolve_token().is_none());
    }

    #[test]
    fn parses_edge_transport() {
        let args = Args::parse_from([
            "github-explorer-mcp",
            "--transport",
            "edge",
            "--bind",
            "0.0.0.0",
            "--port",
            "8787",
            "--public-url",
            "https://mcp.example.com",
        ]);

        assert_eq!(args.transport, Transport::Edge);
        assert_eq!(args.port, 8787);
        assert_eq!(args.public_url.as_deref(), Some("https://mcp.example.com"));
    }
}

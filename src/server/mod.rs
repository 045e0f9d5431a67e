use axum::http::request::Parts;
use rmcp::{
    RoleServer, ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{Implementation, ServerCapabilities, ServerInfo},
    service::RequestContext,
    tool, tool_handler, tool_router,
};

use crate::{
    credential::{Credential, CredentialResolver},
    error::ToolError,
    models::{
        FileArgs, IssueArgs, IssueCommentsArgs, ListCommitsArgs, ListDirectoryArgs,
        ListIssuesArgs, ListPullsArgs, PullArgs, PullFilesArgs, ReadmeArgs, RepoArgs, SearchArgs,
        TreeArgs,
    },
    tools::ToolRegistry,
};

/// Binds the tool registry to the tool-calling protocol.
///
/// Over HTTP a fresh instance serves each request; the credential for every
/// call is resolved from that request's headers, falling back to the
/// resolver's configured default.
#[derive(Clone)]
pub struct GithubServer {
    tools: ToolRegistry,
    resolver: CredentialResolver,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl GithubServer {
    pub fn new(tools: ToolRegistry, resolver: CredentialResolver) -> Self {
        Self {
            tools,
            resolver,
            tool_router: Self::tool_router(),
        }
    }

    fn credential(&self, context: &RequestContext<RoleServer>) -> Option<Credential> {
        let headers = context.extensions.get::<Parts>().map(|parts| &parts.headers);
        self.resolver.resolve(headers)
    }

    #[tool(
        name = "search_repositories",
        description = "Search public GitHub repositories. Supports qualifiers such as language:, user:, org:, stars:>N, topic:."
    )]
    async fn search_repositories(
        &self,
        Parameters(args): Parameters<SearchArgs>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, ToolError> {
        let credential = self.credential(&context);
        self.tools
            .search_repositories(args, credential.as_ref())
            .await
    }

    #[tool(
        name = "search_code",
        description = "Search code across GitHub. Qualifiers: repo:<owner/repo>, language:<lang>, path:<dir>, filename:<name>, extension:<ext>."
    )]
    async fn search_code(
        &self,
        Parameters(args): Parameters<SearchArgs>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, ToolError> {
        let credential = self.credential(&context);
        self.tools.search_code(args, credential.as_ref()).await
    }

    #[tool(
        name = "get_repo",
        description = "Get repository details: description, stars, forks, language, default branch, topics, license."
    )]
    async fn get_repo(
        &self,
        Parameters(args): Parameters<RepoArgs>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, ToolError> {
        let credential = self.credential(&context);
        self.tools.get_repo(args, credential.as_ref()).await
    }

    #[tool(
        name = "list_directory",
        description = "List files and folders at a path in a repository."
    )]
    async fn list_directory(
        &self,
        Parameters(args): Parameters<ListDirectoryArgs>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, ToolError> {
        let credential = self.credential(&context);
        self.tools.list_directory(args, credential.as_ref()).await
    }

    #[tool(
        name = "get_file_contents",
        description = "Read the raw contents of a file in a repository."
    )]
    async fn get_file_contents(
        &self,
        Parameters(args): Parameters<FileArgs>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, ToolError> {
        let credential = self.credential(&context);
        self.tools.get_file_contents(args, credential.as_ref()).await
    }

    #[tool(name = "get_readme", description = "Read a repository's README as raw text.")]
    async fn get_readme(
        &self,
        Parameters(args): Parameters<ReadmeArgs>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, ToolError> {
        let credential = self.credential(&context);
        self.tools.get_readme(args, credential.as_ref()).await
    }

    #[tool(
        name = "list_commits",
        description = "List recent commits, optionally from a branch or limited to a path."
    )]
    async fn list_commits(
        &self,
        Parameters(args): Parameters<ListCommitsArgs>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, ToolError> {
        let credential = self.credential(&context);
        self.tools.list_commits(args, credential.as_ref()).await
    }

    #[tool(
        name = "list_issues",
        description = "List issues (pull requests excluded), filtered by state and labels."
    )]
    async fn list_issues(
        &self,
        Parameters(args): Parameters<ListIssuesArgs>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, ToolError> {
        let credential = self.credential(&context);
        self.tools.list_issues(args, credential.as_ref()).await
    }

    #[tool(name = "get_issue", description = "Get a single issue including its body.")]
    async fn get_issue(
        &self,
        Parameters(args): Parameters<IssueArgs>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, ToolError> {
        let credential = self.credential(&context);
        self.tools.get_issue(args, credential.as_ref()).await
    }

    #[tool(
        name = "list_issue_comments",
        description = "List comments on an issue or pull request."
    )]
    async fn list_issue_comments(
        &self,
        Parameters(args): Parameters<IssueCommentsArgs>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, ToolError> {
        let credential = self.credential(&context);
        self.tools
            .list_issue_comments(args, credential.as_ref())
            .await
    }

    #[tool(
        name = "list_pull_requests",
        description = "List pull requests filtered by state."
    )]
    async fn list_pull_requests(
        &self,
        Parameters(args): Parameters<ListPullsArgs>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, ToolError> {
        let credential = self.credential(&context);
        self.tools.list_pull_requests(args, credential.as_ref()).await
    }

    #[tool(
        name = "get_pull_request",
        description = "Get a pull request including body, merge state and diff stats."
    )]
    async fn get_pull_request(
        &self,
        Parameters(args): Parameters<PullArgs>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, ToolError> {
        let credential = self.credential(&context);
        self.tools.get_pull_request(args, credential.as_ref()).await
    }

    #[tool(
        name = "list_pull_request_files",
        description = "List files changed by a pull request."
    )]
    async fn list_pull_request_files(
        &self,
        Parameters(args): Parameters<PullFilesArgs>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, ToolError> {
        let credential = self.credential(&context);
        self.tools
            .list_pull_request_files(args, credential.as_ref())
            .await
    }

    #[tool(
        name = "get_tree",
        description = "List every file path in a repository at a branch, one per line."
    )]
    async fn get_tree(
        &self,
        Parameters(args): Parameters<TreeArgs>,
        context: RequestContext<RoleServer>,
    ) -> Result<String, ToolError> {
        let credential = self.credential(&context);
        self.tools.get_tree(args, credential.as_ref()).await
    }
}

#[tool_handler]
impl ServerHandler for GithubServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Read-only GitHub explorer: search repositories and code, browse files, \
                 and read commits, issues, and pull requests of public repositories."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            ..ServerInfo::default()
        }
    }
}

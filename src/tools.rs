//! The fourteen read-only GitHub tools.
//!
//! Every handler validates its arguments, makes exactly one upstream call with
//! the credential it was handed, and reshapes the response. Nothing is cached
//! between calls.

use serde::Serialize;

use crate::{
    client::{
        Endpoint, GithubClient,
        types::{
            GithubCodeItem, GithubComment, GithubCommit, GithubContents, GithubIssue, GithubPull,
            GithubPullFile, GithubRepo, GithubSearch, GithubTree,
        },
    },
    credential::Credential,
    error::ToolError,
    models::{
        ChangedFile, CodeSearchItem, CommentSummary, CommitSummary, DirectoryEntry, FileArgs,
        IssueArgs, IssueCommentsArgs, IssueDetail, IssueSummary, ListCommitsArgs,
        ListDirectoryArgs, ListIssuesArgs, ListPullsArgs, PullArgs, PullDetail, PullFilesArgs,
        PullSummary, ReadmeArgs, RepoArgs, RepoSearchItem, RepoSummary, SearchArgs,
        SearchResults, TreeArgs,
    },
};

const MAX_NAME_LEN: usize = 100;

#[derive(Clone)]
pub struct ToolRegistry {
    client: GithubClient,
}

impl ToolRegistry {
    pub fn new(client: GithubClient) -> Self {
        Self { client }
    }

    pub async fn search_repositories(
        &self,
        args: SearchArgs,
        credential: Option<&Credential>,
    ) -> Result<String, ToolError> {
        let endpoint = search_endpoint("repositories", &args)?;
        let search: GithubSearch<GithubRepo> =
            self.client.call_json(&endpoint, credential).await?;

        to_json(&SearchResults::<RepoSearchItem>::from(search))
    }

    pub async fn search_code(
        &self,
        args: SearchArgs,
        credential: Option<&Credential>,
    ) -> Result<String, ToolError> {
        let endpoint = search_endpoint("code", &args)?;
        let search: GithubSearch<GithubCodeItem> =
            self.client.call_json(&endpoint, credential).await?;

        to_json(&SearchResults::<CodeSearchItem>::from(search))
    }

    pub async fn get_repo(
        &self,
        args: RepoArgs,
        credential: Option<&Credential>,
    ) -> Result<String, ToolError> {
        let endpoint = repo_endpoint(&args.owner, &args.repo)?;
        let repo: GithubRepo = self.client.call_json(&endpoint, credential).await?;

        to_json(&RepoSummary::from(repo))
    }

    pub async fn list_directory(
        &self,
        args: ListDirectoryArgs,
        credential: Option<&Credential>,
    ) -> Result<String, ToolError> {
        let path = args.path.as_deref().unwrap_or_default();
        check_path(path, "path")?;

        let endpoint = repo_endpoint(&args.owner, &args.repo)?
            .path("contents")
            .path(path)
            .query_opt("ref", nonempty(args.r#ref.as_deref()));
        let contents: GithubContents = self.client.call_json(&endpoint, credential).await?;

        to_json(&Vec::<DirectoryEntry>::from(contents))
    }

    pub async fn get_file_contents(
        &self,
        args: FileArgs,
        credential: Option<&Credential>,
    ) -> Result<String, ToolError> {
        if args.path.trim_matches('/').is_empty() {
            return Err(ToolError::invalid("path", "must name a file"));
        }
        check_path(&args.path, "path")?;

        let endpoint = repo_endpoint(&args.owner, &args.repo)?
            .path("contents")
            .path(&args.path)
            .query_opt("ref", nonempty(args.r#ref.as_deref()));

        Ok(self.client.call_raw(&endpoint, credential).await?)
    }

    pub async fn get_readme(
        &self,
        args: ReadmeArgs,
        credential: Option<&Credential>,
    ) -> Result<String, ToolError> {
        let endpoint = repo_endpoint(&args.owner, &args.repo)?
            .path("readme")
            .query_opt("ref", nonempty(args.r#ref.as_deref()));

        Ok(self.client.call_raw(&endpoint, credential).await?)
    }

    pub async fn list_commits(
        &self,
        args: ListCommitsArgs,
        credential: Option<&Credential>,
    ) -> Result<String, ToolError> {
        let endpoint = repo_endpoint(&args.owner, &args.repo)?
            .path("commits")
            .query_opt("sha", nonempty(args.sha.as_deref()))
            .query_opt("path", nonempty(args.path.as_deref()))
            .per_page(args.per_page)
            .query_opt("page", args.page);
        let commits: Vec<GithubCommit> = self.client.call_json(&endpoint, credential).await?;

        to_json(&project::<_, CommitSummary>(commits))
    }

    pub async fn list_issues(
        &self,
        args: ListIssuesArgs,
        credential: Option<&Credential>,
    ) -> Result<String, ToolError> {
        let endpoint = repo_endpoint(&args.owner, &args.repo)?
            .path("issues")
            .query("state", args.state)
            .query_opt("labels", nonempty(args.labels.as_deref()))
            .per_page(args.per_page)
            .query_opt("page", args.page);
        let issues: Vec<GithubIssue> = self.client.call_json(&endpoint, credential).await?;

        let issues: Vec<IssueSummary> = issues
            .into_iter()
            .filter(|issue| !issue.is_pull_request())
            .map(Into::into)
            .collect();

        to_json(&issues)
    }

    pub async fn get_issue(
        &self,
        args: IssueArgs,
        credential: Option<&Credential>,
    ) -> Result<String, ToolError> {
        let endpoint = repo_endpoint(&args.owner, &args.repo)?
            .path("issues")
            .segment(args.issue_number.to_string());
        let issue: GithubIssue = self.client.call_json(&endpoint, credential).await?;

        to_json(&IssueDetail::from(issue))
    }

    pub async fn list_issue_comments(
        &self,
        args: IssueCommentsArgs,
        credential: Option<&Credential>,
    ) -> Result<String, ToolError> {
        let endpoint = repo_endpoint(&args.owner, &args.repo)?
            .path("issues")
            .segment(args.issue_number.to_string())
            .path("comments")
            .per_page(args.per_page)
            .query_opt("page", args.page);
        let comments: Vec<GithubComment> = self.client.call_json(&endpoint, credential).await?;

        to_json(&project::<_, CommentSummary>(comments))
    }

    pub async fn list_pull_requests(
        &self,
        args: ListPullsArgs,
        credential: Option<&Credential>,
    ) -> Result<String, ToolError> {
        let endpoint = repo_endpoint(&args.owner, &args.repo)?
            .path("pulls")
            .query("state", args.state)
            .per_page(args.per_page)
            .query_opt("page", args.page);
        let pulls: Vec<GithubPull> = self.client.call_json(&endpoint, credential).await?;

        to_json(&project::<_, PullSummary>(pulls))
    }

    pub async fn get_pull_request(
        &self,
        args: PullArgs,
        credential: Option<&Credential>,
    ) -> Result<String, ToolError> {
        let endpoint = repo_endpoint(&args.owner, &args.repo)?
            .path("pulls")
            .segment(args.pull_number.to_string());
        let pull: GithubPull = self.client.call_json(&endpoint, credential).await?;

        to_json(&PullDetail::from(pull))
    }

    pub async fn list_pull_request_files(
        &self,
        args: PullFilesArgs,
        credential: Option<&Credential>,
    ) -> Result<String, ToolError> {
        let endpoint = repo_endpoint(&args.owner, &args.repo)?
            .path("pulls")
            .segment(args.pull_number.to_string())
            .path("files")
            .per_page(args.per_page)
            .query_opt("page", args.page);
        let files: Vec<GithubPullFile> = self.client.call_json(&endpoint, credential).await?;

        to_json(&project::<_, ChangedFile>(files))
    }

    pub async fn get_tree(
        &self,
        args: TreeArgs,
        credential: Option<&Credential>,
    ) -> Result<String, ToolError> {
        let branch = nonempty(args.branch.as_deref()).unwrap_or("HEAD");
        check_segment(branch, "branch")?;

        // A branch like `feature/x` stays one (percent-encoded) segment here.
        let endpoint = repo_endpoint(&args.owner, &args.repo)?
            .path("git/trees")
            .segment(branch)
            .query("recursive", 1);
        let tree: GithubTree = self.client.call_json(&endpoint, credential).await?;

        Ok(tree.blob_listing())
    }
}

fn search_endpoint(kind: &str, args: &SearchArgs) -> Result<Endpoint, ToolError> {
    if args.query.trim().is_empty() {
        return Err(ToolError::invalid("query", "must not be empty"));
    }

    Ok(Endpoint::new(["search", kind])
        .query("q", &args.query)
        .per_page(args.per_page)
        .query_opt("page", args.page))
}

fn repo_endpoint(owner: &str, repo: &str) -> Result<Endpoint, ToolError> {
    check_name(owner, "owner")?;
    check_name(repo, "repo")?;
    Ok(Endpoint::new(["repos", owner, repo]))
}

/// Owner and repository names are restricted to what GitHub itself allows.
fn check_name(value: &str, field: &'static str) -> Result<(), ToolError> {
    if value.is_empty() {
        return Err(ToolError::invalid(field, "must not be empty"));
    }
    if value.len() > MAX_NAME_LEN {
        return Err(ToolError::invalid(
            field,
            format!("must be at most {MAX_NAME_LEN} characters"),
        ));
    }
    if value == "." || value == ".." {
        return Err(ToolError::invalid(field, "must not be a relative path"));
    }
    if let Some(ch) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(ToolError::invalid(
            field,
            format!("contains invalid character {ch:?}"),
        ));
    }
    Ok(())
}

fn check_path(path: &str, field: &'static str) -> Result<(), ToolError> {
    if path.split('/').any(|s| s == "." || s == "..") {
        return Err(ToolError::invalid(field, "must not contain `.` or `..` segments"));
    }
    if path.contains(['\0', '\n', '\r']) {
        return Err(ToolError::invalid(field, "contains control characters"));
    }
    Ok(())
}

fn check_segment(value: &str, field: &'static str) -> Result<(), ToolError> {
    if value == "." || value == ".." {
        return Err(ToolError::invalid(field, "must not be a relative path"));
    }
    check_path(value, field)
}

fn nonempty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn project<T, U>(items: Vec<T>) -> Vec<U>
where
    T: Into<U>,
{
    items.into_iter().map(Into::into).collect()
}

fn to_json<T: Serialize>(value: &T) -> Result<String, ToolError> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_github_style_names() {
        assert!(check_name("anthropics", "owner").is_ok());
        assert!(check_name("my-org_2", "owner").is_ok());
        assert!(check_name("repo.name", "repo").is_ok());
    }

    #[test]
    fn rejects_names_outside_allow_list() {
        for bad in ["", ".", "..", "owner/repo", "a b", "x?y=1", "frag#x", "%2e"] {
            let err = check_name(bad, "owner").unwrap_err();
            assert!(
                matches!(err, ToolError::InvalidArgument { field: "owner", .. }),
                "{bad:?} should be rejected"
            );
        }
        assert!(check_name(&"a".repeat(101), "repo").is_err());
    }

    #[test]
    fn rejects_traversal_in_paths() {
        assert!(check_path("src/lib.rs", "path").is_ok());
        assert!(check_path("", "path").is_ok());
        assert!(check_path("../secrets", "path").is_err());
        assert!(check_path("docs/./a.md", "path").is_err());
        assert!(check_segment("..", "branch").is_err());
    }

    #[test]
    fn search_requires_query() {
        let args = SearchArgs {
            query: "  ".to_string(),
            per_page: 10,
            page: None,
        };
        let err = search_endpoint("code", &args).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument { field: "query", .. }));
    }

    #[test]
    fn search_endpoint_clamps_per_page() {
        let args = SearchArgs {
            query: "language:rust".to_string(),
            per_page: 500,
            page: Some(2),
        };
        let client = GithubClient::new("https://api.example.com").unwrap();
        let url = client.build_url(&search_endpoint("repositories", &args).unwrap());

        assert_eq!(
            url.as_str(),
            "https://api.example.com/search/repositories?q=language%3Arust&per_page=30&page=2"
        );
    }

    #[test]
    fn blank_optional_values_are_dropped() {
        assert_eq!(nonempty(Some("  ")), None);
        assert_eq!(nonempty(Some(" main ")), Some("main"));
        assert_eq!(nonempty(None), None);
    }
}

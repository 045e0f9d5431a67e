//! Raw GitHub REST response shapes and their compact projections.

use serde::Deserialize;

use crate::models::{
    ChangedFile, CodeSearchItem, CommentSummary, CommitSummary, DirectoryEntry, EntryType,
    IssueDetail, IssueSummary, PullDetail, PullSummary, RepoSearchItem, RepoSummary,
    SearchResults,
};

#[derive(Debug, Deserialize)]
pub struct GithubSearch<T> {
    pub total_count: u64,
    pub items: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct GithubUser {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub struct GithubLicense {
    pub spdx_id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GithubRepo {
    pub full_name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub open_issues_count: u64,
    pub language: Option<String>,
    pub default_branch: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    pub license: Option<GithubLicense>,
    pub html_url: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GithubCodeItem {
    pub name: String,
    pub path: String,
    pub html_url: String,
    pub repository: GithubCodeRepo,
}

#[derive(Debug, Deserialize)]
pub struct GithubCodeRepo {
    pub full_name: String,
}

#[derive(Debug, Deserialize)]
pub struct GithubContentEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub r#type: EntryType,
    pub size: Option<u64>,
}

/// The contents endpoint answers with an array for directories and a
/// single object for anything else.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum GithubContents {
    Directory(Vec<GithubContentEntry>),
    Single(GithubContentEntry),
}

#[derive(Debug, Deserialize)]
pub struct GithubCommit {
    pub sha: String,
    pub html_url: String,
    pub commit: GithubCommitDetail,
    pub author: Option<GithubUser>,
}

#[derive(Debug, Deserialize)]
pub struct GithubCommitDetail {
    pub message: String,
    pub author: Option<GithubCommitAuthor>,
}

#[derive(Debug, Deserialize)]
pub struct GithubCommitAuthor {
    pub name: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GithubLabel {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct GithubIssue {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub user: Option<GithubUser>,
    #[serde(default)]
    pub labels: Vec<GithubLabel>,
    #[serde(default)]
    pub comments: u64,
    pub created_at: String,
    pub closed_at: Option<String>,
    pub html_url: String,
    pub body: Option<String>,
    /// Present when the issues endpoint returns a pull request.
    pub pull_request: Option<serde_json::Value>,
}

impl GithubIssue {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

#[derive(Debug, Deserialize)]
pub struct GithubComment {
    pub user: Option<GithubUser>,
    pub body: Option<String>,
    pub created_at: String,
    pub html_url: String,
}

#[derive(Debug, Deserialize)]
pub struct GithubBranchRef {
    pub label: Option<String>,
    #[serde(rename = "ref")]
    pub r#ref: String,
}

impl GithubBranchRef {
    fn display(self) -> String {
        self.label.unwrap_or(self.r#ref)
    }
}

#[derive(Debug, Deserialize)]
pub struct GithubPull {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub user: Option<GithubUser>,
    #[serde(default)]
    pub draft: bool,
    pub head: GithubBranchRef,
    pub base: GithubBranchRef,
    pub created_at: String,
    pub html_url: String,
    pub body: Option<String>,
    #[serde(default)]
    pub merged: bool,
    pub merged_at: Option<String>,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    #[serde(default)]
    pub changed_files: u64,
    #[serde(default)]
    pub commits: u64,
}

#[derive(Debug, Deserialize)]
pub struct GithubPullFile {
    pub filename: String,
    pub status: String,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    #[serde(default)]
    pub changes: u64,
}

#[derive(Debug, Deserialize)]
pub struct GithubTree {
    pub tree: Vec<GithubTreeEntry>,
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Deserialize)]
pub struct GithubTreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub r#type: String,
}

fn login(user: Option<GithubUser>) -> String {
    user.map(|u| u.login).unwrap_or_else(|| "ghost".to_string())
}

fn first_line(message: &str) -> String {
    message.lines().next().unwrap_or_default().to_string()
}

impl<T, U> From<GithubSearch<T>> for SearchResults<U>
where
    T: Into<U>,
{
    fn from(search: GithubSearch<T>) -> Self {
        SearchResults {
            total_count: search.total_count,
            items: search.items.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<GithubRepo> for RepoSearchItem {
    fn from(repo: GithubRepo) -> Self {
        RepoSearchItem {
            name: repo.full_name,
            description: repo.description,
            stars: repo.stargazers_count,
            language: repo.language,
            url: repo.html_url,
        }
    }
}

impl From<GithubRepo> for RepoSummary {
    fn from(repo: GithubRepo) -> Self {
        RepoSummary {
            name: repo.full_name,
            description: repo.description,
            stars: repo.stargazers_count,
            forks: repo.forks_count,
            open_issues: repo.open_issues_count,
            language: repo.language,
            default_branch: repo.default_branch,
            topics: repo.topics,
            license: repo.license.and_then(|l| l.spdx_id.or(l.name)),
            url: repo.html_url,
            updated_at: repo.updated_at,
        }
    }
}

impl From<GithubCodeItem> for CodeSearchItem {
    fn from(item: GithubCodeItem) -> Self {
        CodeSearchItem {
            name: item.name,
            path: item.path,
            repository: item.repository.full_name,
            url: item.html_url,
        }
    }
}

impl From<GithubContentEntry> for DirectoryEntry {
    fn from(entry: GithubContentEntry) -> Self {
        DirectoryEntry {
            name: entry.name,
            path: entry.path,
            size: match entry.r#type {
                EntryType::Dir | EntryType::Submodule => None,
                _ => entry.size,
            },
            r#type: entry.r#type,
        }
    }
}

impl From<GithubContents> for Vec<DirectoryEntry> {
    fn from(contents: GithubContents) -> Self {
        match contents {
            GithubContents::Directory(entries) => entries.into_iter().map(Into::into).collect(),
            GithubContents::Single(entry) => vec![entry.into()],
        }
    }
}

impl From<GithubCommit> for CommitSummary {
    fn from(commit: GithubCommit) -> Self {
        let (name, date) = match commit.commit.author {
            Some(author) => (author.name, author.date),
            None => (None, None),
        };

        CommitSummary {
            sha: commit.sha.chars().take(7).collect(),
            message: first_line(&commit.commit.message),
            author: name.or(commit.author.map(|u| u.login)),
            date,
            url: commit.html_url,
        }
    }
}

impl From<GithubIssue> for IssueSummary {
    fn from(issue: GithubIssue) -> Self {
        IssueSummary {
            number: issue.number,
            title: issue.title,
            state: issue.state,
            author: login(issue.user),
            labels: issue.labels.into_iter().map(|l| l.name).collect(),
            comments: issue.comments,
            created_at: issue.created_at,
            url: issue.html_url,
        }
    }
}

impl From<GithubIssue> for IssueDetail {
    fn from(mut issue: GithubIssue) -> Self {
        let body = issue.body.take();
        let closed_at = issue.closed_at.take();

        IssueDetail {
            summary: issue.into(),
            body,
            closed_at,
        }
    }
}

impl From<GithubComment> for CommentSummary {
    fn from(comment: GithubComment) -> Self {
        CommentSummary {
            author: login(comment.user),
            body: comment.body,
            created_at: comment.created_at,
            url: comment.html_url,
        }
    }
}

impl From<GithubPull> for PullSummary {
    fn from(pull: GithubPull) -> Self {
        PullSummary {
            number: pull.number,
            title: pull.title,
            state: pull.state,
            author: login(pull.user),
            draft: pull.draft,
            head: pull.head.display(),
            base: pull.base.display(),
            created_at: pull.created_at,
            url: pull.html_url,
        }
    }
}

impl From<GithubPull> for PullDetail {
    fn from(mut pull: GithubPull) -> Self {
        let body = pull.body.take();
        let merged_at = pull.merged_at.take();
        let (merged, additions, deletions, changed_files, commits) = (
            pull.merged,
            pull.additions,
            pull.deletions,
            pull.changed_files,
            pull.commits,
        );

        PullDetail {
            summary: pull.into(),
            body,
            merged,
            additions,
            deletions,
            changed_files,
            commits,
            merged_at,
        }
    }
}

impl From<GithubPullFile> for ChangedFile {
    fn from(file: GithubPullFile) -> Self {
        ChangedFile {
            filename: file.filename,
            status: file.status,
            additions: file.additions,
            deletions: file.deletions,
            changes: file.changes,
        }
    }
}

impl GithubTree {
    /// Blob paths one per line, noting when GitHub cut the listing short.
    pub fn blob_listing(self) -> String {
        let mut listing = self
            .tree
            .into_iter()
            .filter(|entry| entry.r#type == "blob")
            .map(|entry| entry.path)
            .collect::<Vec<_>>()
            .join("\n");

        if self.truncated {
            if !listing.is_empty() {
                listing.push('\n');
            }
            listing.push_str("… (truncated)");
        }

        listing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_repo_summary() {
        let repo: GithubRepo = serde_json::from_value(json!({
            "full_name": "anthropics/courses",
            "description": "Courses",
            "stargazers_count": 42,
            "forks_count": 3,
            "open_issues_count": 1,
            "language": "Jupyter Notebook",
            "default_branch": "master",
            "license": { "spdx_id": "MIT", "name": "MIT License" },
            "html_url": "https://github.com/anthropics/courses",
            "updated_at": "2024-05-01T00:00:00Z"
        }))
        .unwrap();

        let summary: RepoSummary = repo.into();

        assert_eq!(summary.name, "anthropics/courses");
        assert_eq!(summary.stars, 42);
        assert_eq!(summary.license.as_deref(), Some("MIT"));
        assert!(summary.topics.is_empty());
    }

    #[test]
    fn single_file_contents_become_one_entry() {
        let contents: GithubContents = serde_json::from_value(json!({
            "name": "lib.rs",
            "path": "src/lib.rs",
            "type": "file",
            "size": 120,
            "content": "Ly8gbGli"
        }))
        .unwrap();

        let entries: Vec<DirectoryEntry> = contents.into();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "src/lib.rs");
        assert_eq!(entries[0].size, Some(120));
    }

    #[test]
    fn directory_entries_drop_size_for_dirs() {
        let contents: GithubContents = serde_json::from_value(json!([
            { "name": "src", "path": "src", "type": "dir", "size": 0 },
            { "name": "README.md", "path": "README.md", "type": "file", "size": 10 }
        ]))
        .unwrap();

        let entries: Vec<DirectoryEntry> = contents.into();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].r#type, EntryType::Dir);
        assert!(entries[0].size.is_none());
        assert_eq!(entries[1].size, Some(10));
    }

    #[test]
    fn commit_summary_shortens_sha_and_message() {
        let commit: GithubCommit = serde_json::from_value(json!({
            "sha": "0123456789abcdef",
            "html_url": "https://github.com/o/r/commit/0123456",
            "commit": {
                "message": "Fix parser\n\nLonger explanation.",
                "author": { "name": "Octo Cat", "date": "2024-01-02T03:04:05Z" }
            },
            "author": { "login": "octocat" }
        }))
        .unwrap();

        let summary: CommitSummary = commit.into();

        assert_eq!(summary.sha, "0123456");
        assert_eq!(summary.message, "Fix parser");
        assert_eq!(summary.author.as_deref(), Some("Octo Cat"));
    }

    #[test]
    fn pull_detail_keeps_summary_fields() {
        let pull: GithubPull = serde_json::from_value(json!({
            "number": 7,
            "title": "Add feature",
            "state": "closed",
            "user": null,
            "head": { "label": "octo:feature", "ref": "feature" },
            "base": { "ref": "main" },
            "created_at": "2024-01-01T00:00:00Z",
            "html_url": "https://github.com/o/r/pull/7",
            "body": "Body",
            "merged": true,
            "merged_at": "2024-01-03T00:00:00Z",
            "additions": 10,
            "deletions": 2,
            "changed_files": 3,
            "commits": 1
        }))
        .unwrap();

        let detail: PullDetail = pull.into();

        assert_eq!(detail.summary.author, "ghost");
        assert_eq!(detail.summary.head, "octo:feature");
        assert_eq!(detail.summary.base, "main");
        assert!(detail.merged);
        assert_eq!(detail.changed_files, 3);
    }

    #[test]
    fn tree_listing_keeps_only_blobs() {
        let tree = GithubTree {
            tree: vec![
                GithubTreeEntry {
                    path: "src".to_string(),
                    r#type: "tree".to_string(),
                },
                GithubTreeEntry {
                    path: "src/main.rs".to_string(),
                    r#type: "blob".to_string(),
                },
                GithubTreeEntry {
                    path: "Cargo.toml".to_string(),
                    r#type: "blob".to_string(),
                },
            ],
            truncated: true,
        };

        assert_eq!(
            tree.blob_listing(),
            "src/main.rs\nCargo.toml\n… (truncated)"
        );
    }
}

use std::{borrow::Cow, fmt};

use schemars::{JsonSchema, Schema, SchemaGenerator, json_schema};
use serde::{Deserialize, Serialize};

// -- Tool arguments --

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchArgs {
    #[schemars(description = "Search query using GitHub search syntax")]
    pub query: String,
    #[schemars(description = "Results per page (default 10, max 30)")]
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default)]
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RepoArgs {
    #[schemars(description = "Repository owner (user or organization)")]
    pub owner: String,
    #[schemars(description = "Repository name")]
    pub repo: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListDirectoryArgs {
    pub owner: String,
    pub repo: String,
    #[schemars(description = "Directory path, defaults to the repository root")]
    #[serde(default)]
    pub path: Option<String>,
    #[schemars(description = "Branch, tag, or commit SHA")]
    #[serde(default)]
    pub r#ref: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FileArgs {
    pub owner: String,
    pub repo: String,
    #[schemars(description = "File path within the repository")]
    pub path: String,
    #[schemars(description = "Branch, tag, or commit SHA")]
    #[serde(default)]
    pub r#ref: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadmeArgs {
    pub owner: String,
    pub repo: String,
    #[serde(default)]
    pub r#ref: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListCommitsArgs {
    pub owner: String,
    pub repo: String,
    #[schemars(description = "Branch name or commit SHA to start listing from")]
    #[serde(default)]
    pub sha: Option<String>,
    #[schemars(description = "Only commits touching this path")]
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default)]
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListIssuesArgs {
    pub owner: String,
    pub repo: String,
    #[serde(default)]
    pub state: StateFilter,
    #[schemars(description = "Comma-separated label names")]
    #[serde(default)]
    pub labels: Option<String>,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default)]
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct IssueArgs {
    pub owner: String,
    pub repo: String,
    pub issue_number: u64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct IssueCommentsArgs {
    pub owner: String,
    pub repo: String,
    pub issue_number: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default)]
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListPullsArgs {
    pub owner: String,
    pub repo: String,
    #[serde(default)]
    pub state: StateFilter,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default)]
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PullArgs {
    pub owner: String,
    pub repo: String,
    pub pull_number: u64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PullFilesArgs {
    pub owner: String,
    pub repo: String,
    pub pull_number: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default)]
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TreeArgs {
    pub owner: String,
    pub repo: String,
    #[schemars(description = "Branch, tag, or tree SHA (default HEAD)")]
    #[serde(default)]
    pub branch: Option<String>,
}

pub fn default_per_page() -> u32 {
    10
}

/// Issue and pull request state filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum StateFilter {
    #[default]
    Open,
    Closed,
    All,
}

impl StateFilter {
    pub const ALLOWED: [&'static str; 3] = ["open", "closed", "all"];

    pub fn as_str(&self) -> &'static str {
        match self {
            StateFilter::Open => "open",
            StateFilter::Closed => "closed",
            StateFilter::All => "all",
        }
    }
}

impl TryFrom<String> for StateFilter {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "open" => Ok(StateFilter::Open),
            "closed" => Ok(StateFilter::Closed),
            "all" => Ok(StateFilter::All),
            other => Err(format!(
                "state must be one of {}, got `{other}`",
                Self::ALLOWED.join(", ")
            )),
        }
    }
}

impl fmt::Display for StateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl JsonSchema for StateFilter {
    fn schema_name() -> Cow<'static, str> {
        Cow::from("StateFilter")
    }

    fn json_schema(_: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "type": "string",
            "enum": ["open", "closed", "all"],
            "default": "open",
            "description": "Filter by state: open, closed, or all.",
        })
    }
}

// -- Projections returned to the caller --

#[derive(Debug, Serialize)]
pub struct SearchResults<T> {
    pub total_count: u64,
    pub items: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct RepoSearchItem {
    pub name: String,
    pub description: Option<String>,
    pub stars: u64,
    pub language: Option<String>,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct CodeSearchItem {
    pub name: String,
    pub path: String,
    pub repository: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct RepoSummary {
    /// `owner/name`.
    pub name: String,
    pub description: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub open_issues: u64,
    pub language: Option<String>,
    pub default_branch: Option<String>,
    pub topics: Vec<String>,
    pub license: Option<String>,
    pub url: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Dir,
    Symlink,
    Submodule,
}

#[derive(Debug, Serialize)]
pub struct DirectoryEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub r#type: EntryType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct CommitSummary {
    /// Abbreviated to seven characters.
    pub sha: String,
    /// First line of the commit message.
    pub message: String,
    pub author: Option<String>,
    pub date: Option<String>,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct IssueSummary {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub author: String,
    pub labels: Vec<String>,
    pub comments: u64,
    pub created_at: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct IssueDetail {
    #[serde(flatten)]
    pub summary: IssueSummary,
    pub body: Option<String>,
    pub closed_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CommentSummary {
    pub author: String,
    pub body: Option<String>,
    pub created_at: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct PullSummary {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub author: String,
    pub draft: bool,
    /// Head branch label, e.g. `octo:feature`.
    pub head: String,
    pub base: String,
    pub created_at: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct PullDetail {
    #[serde(flatten)]
    pub summary: PullSummary,
    pub body: Option<String>,
    pub merged: bool,
    pub additions: u64,
    pub deletions: u64,
    pub changed_files: u64,
    pub commits: u64,
    pub merged_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChangedFile {
    pub filename: String,
    pub status: String,
    pub additions: u64,
    pub deletions: u64,
    pub changes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn state_defaults_to_open() {
        let args: ListIssuesArgs =
            serde_json::from_value(json!({ "owner": "octo", "repo": "hello" })).unwrap();

        assert_eq!(args.state, StateFilter::Open);
        assert_eq!(args.per_page, 10);
        assert!(args.page.is_none());
    }

    #[test]
    fn rejects_unknown_state_naming_the_field() {
        let err = serde_json::from_value::<ListPullsArgs>(
            json!({ "owner": "octo", "repo": "hello", "state": "merged" }),
        )
        .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("state must be one of open, closed, all"));
        assert!(message.contains("merged"));
    }

    #[test]
    fn state_schema_lists_allowed_values() {
        let schema = schemars::schema_for!(StateFilter);
        let value = schema.as_value();

        assert_eq!(value["enum"], json!(StateFilter::ALLOWED));
        assert_eq!(value["default"], "open");
    }

    #[test]
    fn missing_required_field_is_named() {
        let err = serde_json::from_value::<IssueArgs>(json!({ "owner": "octo", "repo": "hello" }))
            .unwrap_err();

        assert!(err.to_string().contains("issue_number"));
    }

    #[test]
    fn ref_field_uses_plain_name() {
        let args: FileArgs = serde_json::from_value(
            json!({ "owner": "o", "repo": "r", "path": "README.md", "ref": "main" }),
        )
        .unwrap();

        assert_eq!(args.r#ref.as_deref(), Some("main"));
    }

    #[test]
    fn detail_flattens_summary() {
        let detail = IssueDetail {
            summary: IssueSummary {
                number: 1,
                title: "Bug".to_string(),
                state: "open".to_string(),
                author: "octo".to_string(),
                labels: vec![],
                comments: 0,
                created_at: "2024-01-01T00:00:00Z".to_string(),
                url: "https://github.com/o/r/issues/1".to_string(),
            },
            body: Some("details".to_string()),
            closed_at: None,
        };

        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["number"], 1);
        assert_eq!(value["body"], "details");
    }
}

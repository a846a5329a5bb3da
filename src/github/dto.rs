use serde::{Deserialize, Serialize};

use crate::extract::{Problems, Validate};

/// Owner block of a repository as GitHub reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryOwner {
    pub login: Option<String>,
    pub id: Option<u64>,
    pub avatar_url: Option<String>,
    pub html_url: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// The subset of a GitHub repository object the API forwards. Deserializing
/// a full search item into this drops everything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositorySummary {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub full_name: Option<String>,
    pub description: Option<String>,
    pub private: Option<bool>,
    pub html_url: Option<String>,
    pub clone_url: Option<String>,
    pub ssh_url: Option<String>,
    pub git_url: Option<String>,
    pub language: Option<String>,
    pub size: Option<u64>,
    pub stargazers_count: Option<u64>,
    pub watchers_count: Option<u64>,
    pub forks_count: Option<u64>,
    pub open_issues_count: Option<u64>,
    pub default_branch: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    pub visibility: Option<String>,
    pub archived: Option<bool>,
    pub disabled: Option<bool>,
    pub fork: Option<bool>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub pushed_at: Option<String>,
    pub score: Option<f64>,
    pub owner: Option<RepositoryOwner>,
}

/// Body of `GET /search/repositories`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub items: Vec<RepositorySummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BranchCommit {
    pub sha: String,
}

/// One item of `GET /repos/{owner}/{repo}/branches`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawBranch {
    pub name: String,
    pub commit: BranchCommit,
    #[serde(default)]
    pub protected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Branch {
    pub name: String,
    pub commit_sha: String,
    pub protected: bool,
}

impl From<RawBranch> for Branch {
    fn from(raw: RawBranch) -> Self {
        Self {
            name: raw.name,
            commit_sha: raw.commit.sha,
            protected: raw.protected,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RepositoriesQuery {
    pub repo_name: Option<String>,
    pub access_token: Option<String>,
}

impl Validate for RepositoriesQuery {
    fn validate(&self) -> Vec<String> {
        let mut p = Problems::default();
        if let Some(name) = &self.repo_name {
            p.check(!name.trim().is_empty(), "repo_name", "must not be blank");
        }
        p.into_vec()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AccessTokenQuery {
    pub access_token: Option<String>,
}

impl Validate for AccessTokenQuery {
    fn validate(&self) -> Vec<String> {
        Vec::new()
    }
}

#[derive(Debug, Serialize)]
pub struct RepositoryList {
    pub repositories: Vec<RepositorySummary>,
    pub total_count: u64,
    pub returned_count: usize,
    pub github_username: String,
}

#[derive(Debug, Serialize)]
pub struct BranchList {
    pub repository: String,
    pub branches: Vec<Branch>,
}

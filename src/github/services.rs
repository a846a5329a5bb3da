use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::{error::AppError, extract::is_valid_github_username, state::AppState};

use super::{
    client::{GithubClient, RepoSearch},
    dto::{Branch, BranchList, RepositoryList},
};

/// Outcome of checking that a GitHub login exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsernameCheck {
    Exists,
    Missing,
    /// GitHub could not be reached; only the format was checked.
    FormatOnly,
}

pub struct GithubService {
    client: Arc<dyn GithubClient>,
    per_page: u32,
}

impl GithubService {
    pub fn new(state: &AppState) -> Self {
        Self {
            client: state.github.clone(),
            per_page: state.config.github.per_page,
        }
    }

    /// Asks GitHub whether `username` exists. When GitHub is unreachable the
    /// name is accepted on format alone.
    #[instrument(skip(self))]
    pub async fn check_username(&self, username: &str) -> Result<UsernameCheck, AppError> {
        match self.client.user_exists(username).await {
            Ok(true) => Ok(UsernameCheck::Exists),
            Ok(false) => Ok(UsernameCheck::Missing),
            Err(err) if err.is_unreachable() => {
                warn!(error = %err, "GitHub unavailable, checking username format only");
                if is_valid_github_username(username) {
                    Ok(UsernameCheck::FormatOnly)
                } else {
                    Err(AppError::BadRequest("Invalid GitHub username format".into()))
                }
            }
            Err(err) => {
                warn!(error = %err, "GitHub username lookup failed");
                Err(AppError::Upstream {
                    status: axum::http::StatusCode::BAD_GATEWAY,
                    message: "Error validating GitHub username".into(),
                })
            }
        }
    }

    #[instrument(skip(self, access_token))]
    pub async fn list_repositories(
        &self,
        github_username: &str,
        repo_name: Option<&str>,
        access_token: Option<&str>,
    ) -> Result<(RepositoryList, String), AppError> {
        let results = self
            .client
            .search_repositories(RepoSearch {
                username: github_username,
                repo_name,
                access_token,
                per_page: self.per_page,
            })
            .await?;

        let returned_count = results.items.len();
        let message = format!(
            "Successfully fetched {returned_count} repositories out of {} total",
            results.total_count
        );
        info!(returned_count, total = results.total_count, "repositories fetched");
        Ok((
            RepositoryList {
                repositories: results.items,
                total_count: results.total_count,
                returned_count,
                github_username: github_username.to_string(),
            },
            message,
        ))
    }

    #[instrument(skip(self, access_token))]
    pub async fn repository(
        &self,
        owner: &str,
        repo: &str,
        access_token: Option<&str>,
    ) -> Result<serde_json::Value, AppError> {
        let details = self.client.repository(owner, repo, access_token).await?;
        info!("repository details fetched");
        Ok(details)
    }

    #[instrument(skip(self, access_token))]
    pub async fn branches(&self, owner: &str, repo: &str, access_token: Option<&str>) -> Result<BranchList, AppError> {
        let branches: Vec<Branch> = self
            .client
            .branches(owner, repo, access_token)
            .await?
            .into_iter()
            .map(Branch::from)
            .collect();
        info!(count = branches.len(), "branches fetched");
        Ok(BranchList {
            repository: format!("{owner}/{repo}"),
            branches,
        })
    }
}

/// Blank path segments never reach GitHub.
pub fn require_segment(value: &str, field: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(vec![format!("{field}: must not be blank")]));
    }
    Ok(value.to_string())
}

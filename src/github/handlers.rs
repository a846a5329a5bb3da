use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::CurrentUser,
    controller::Controller,
    error::AppError,
    extract::ValidQuery,
    response::ApiResponse,
    state::AppState,
};

use super::{
    dto::{AccessTokenQuery, BranchList, RepositoriesQuery, RepositoryList},
    services::{require_segment, GithubService},
};

pub struct GithubController;

impl Controller for GithubController {
    const NAME: &'static str = "github";
    const PREFIX: &'static str = "/api/github";

    fn routes() -> Router<AppState> {
        Router::new()
            .route("/repositories", get(list_repositories))
            .route("/repository/:name", get(repository))
            .route("/repository/:name/branches", get(branches))
            .route("/repos/:owner/:repo", get(repository_of))
    }
}

/// Repositories owned by the caller's GitHub account.
#[instrument(skip(state, user, query), fields(user_id = %user.id))]
pub async fn list_repositories(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidQuery(query): ValidQuery<RepositoriesQuery>,
) -> Result<ApiResponse<RepositoryList>, AppError> {
    let (list, message) = GithubService::new(&state)
        .list_repositories(
            &user.github_username,
            query.repo_name.as_deref(),
            query.access_token.as_deref(),
        )
        .await?;
    Ok(ApiResponse::ok(list, message))
}

#[instrument(skip(state, user, query), fields(user_id = %user.id))]
pub async fn repository(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(name): Path<String>,
    ValidQuery(query): ValidQuery<AccessTokenQuery>,
) -> Result<ApiResponse<serde_json::Value>, AppError> {
    let name = require_segment(&name, "name")?;
    let details = GithubService::new(&state)
        .repository(&user.github_username, &name, query.access_token.as_deref())
        .await?;
    Ok(ApiResponse::ok(
        details,
        format!("Successfully fetched repository details for {}/{name}", user.github_username),
    ))
}

#[instrument(skip(state, user, query), fields(user_id = %user.id))]
pub async fn branches(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(name): Path<String>,
    ValidQuery(query): ValidQuery<AccessTokenQuery>,
) -> Result<ApiResponse<BranchList>, AppError> {
    let name = require_segment(&name, "name")?;
    let list = GithubService::new(&state)
        .branches(&user.github_username, &name, query.access_token.as_deref())
        .await?;
    let message = format!("Successfully fetched {} branches", list.branches.len());
    Ok(ApiResponse::ok(list, message))
}

/// Repository details for an arbitrary owner.
#[instrument(skip(state, _user, query))]
pub async fn repository_of(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path((owner, repo)): Path<(String, String)>,
    ValidQuery(query): ValidQuery<AccessTokenQuery>,
) -> Result<ApiResponse<serde_json::Value>, AppError> {
    let owner = require_segment(&owner, "owner")?;
    let repo = require_segment(&repo, "repo_name")?;
    let details = GithubService::new(&state)
        .repository(&owner, &repo, query.access_token.as_deref())
        .await?;
    Ok(ApiResponse::ok(
        details,
        format!("Successfully fetched repository details for {owner}/{repo}"),
    ))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::{
        testing::{bearer, call, seed_user, test_app, test_state, test_state_with_github, FakeGithub},
        users::model::Role,
    };

    #[tokio::test]
    async fn lists_repositories_for_callers_github_account() {
        let state = test_state();
        let user = seed_user(&state, "a@x.com", "octocat", Role::User).await;
        let token = bearer(&state, user.id);
        let app = test_app(state);

        let (status, body) = call(&app, "GET", "/api/github/repositories", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["github_username"], "octocat");
        assert_eq!(body["data"]["returned_count"], 2);
        assert_eq!(body["data"]["total_count"], 2);
        assert_eq!(body["data"]["repositories"][0]["full_name"], "octocat/Hello-World");

        let (status, body) = call(
            &app,
            "GET",
            "/api/github/repositories?repo_name=spoon",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["returned_count"], 1);
    }

    #[tokio::test]
    async fn blank_repo_name_is_rejected() {
        let state = test_state();
        let user = seed_user(&state, "a@x.com", "octocat", Role::User).await;
        let token = bearer(&state, user.id);
        let app = test_app(state);

        let (status, body) = call(&app, "GET", "/api/github/repositories?repo_name=", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn requires_access_token() {
        let app = test_app(test_state());
        let (status, _) = call(&app, "GET", "/api/github/repositories", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn repository_detail_and_branches() {
        let state = test_state();
        let user = seed_user(&state, "a@x.com", "octocat", Role::User).await;
        let token = bearer(&state, user.id);
        let app = test_app(state);

        let (status, body) = call(&app, "GET", "/api/github/repository/Hello-World", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["full_name"], "octocat/Hello-World");

        let (status, body) = call(
            &app,
            "GET",
            "/api/github/repository/Hello-World/branches",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["branches"][0]["name"], "main");
        assert_eq!(body["data"]["branches"][0]["commit_sha"], "7fd1a60b01f91b314f59955a4e4d4e80d8edf11d");

        let (status, body) = call(&app, "GET", "/api/github/repos/octocat/missing", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn unreachable_github_is_service_unavailable() {
        let state = test_state_with_github(FakeGithub::unreachable());
        let user = seed_user(&state, "a@x.com", "octocat", Role::User).await;
        let token = bearer(&state, user.id);
        let app = test_app(state);

        let (status, body) = call(&app, "GET", "/api/github/repositories", Some(&token), None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["message"], "Connection error while contacting GitHub API");
    }
}

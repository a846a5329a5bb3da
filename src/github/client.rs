use anyhow::Context;
use async_trait::async_trait;
use axum::http::StatusCode;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT},
    Client, RequestBuilder, Response, Url,
};
use thiserror::Error;
use tracing::{debug, error};

use crate::{config::GithubConfig, error::AppError};

use super::dto::{RawBranch, SearchResults};

pub const USER_AGENT: &str = "doc-generator-app";
const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";
const RATE_LIMIT_HEADER: &str = "x-ratelimit-remaining";

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("{0}")]
    NotFound(String),
    #[error("GitHub API rate limit exceeded. Please try again later.")]
    RateLimited,
    #[error("Access forbidden. Authentication may be required.")]
    Forbidden,
    #[error("{0}")]
    InvalidQuery(String),
    #[error("Request timeout while contacting GitHub")]
    Timeout,
    #[error("Connection error while contacting GitHub API")]
    Connection,
    #[error("GitHub API error: {0}")]
    Upstream(String),
}

impl GithubError {
    /// Timeouts and refused connections, as opposed to an answer from GitHub.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Timeout | Self::Connection)
    }
}

impl From<GithubError> for AppError {
    fn from(err: GithubError) -> Self {
        let status = match &err {
            GithubError::NotFound(message) => return AppError::NotFound(message.clone()),
            GithubError::InvalidQuery(message) => return AppError::BadRequest(message.clone()),
            GithubError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            GithubError::Forbidden => StatusCode::FORBIDDEN,
            GithubError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            GithubError::Connection => StatusCode::SERVICE_UNAVAILABLE,
            GithubError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };
        AppError::Upstream {
            status,
            message: err.to_string(),
        }
    }
}

/// Maps a non-success GitHub status to an error. `missing` names the thing a
/// 404 refers to.
pub fn status_error(status: StatusCode, headers: &HeaderMap, missing: &str) -> GithubError {
    match status {
        StatusCode::NOT_FOUND => GithubError::NotFound(format!("{missing} not found")),
        StatusCode::UNPROCESSABLE_ENTITY => GithubError::InvalidQuery(format!("Invalid search query for {missing}")),
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS if headers.contains_key(RATE_LIMIT_HEADER) => {
            GithubError::RateLimited
        }
        StatusCode::FORBIDDEN => GithubError::Forbidden,
        other => GithubError::Upstream(format!("unexpected status {other}")),
    }
}

fn transport_error(err: reqwest::Error) -> GithubError {
    if err.is_timeout() {
        GithubError::Timeout
    } else if err.is_connect() {
        GithubError::Connection
    } else {
        GithubError::Upstream(err.to_string())
    }
}

/// Parameters of a repository search.
#[derive(Debug, Clone, Copy)]
pub struct RepoSearch<'a> {
    pub username: &'a str,
    pub repo_name: Option<&'a str>,
    pub access_token: Option<&'a str>,
    pub per_page: u32,
}

impl RepoSearch<'_> {
    /// GitHub search syntax for this request.
    pub fn query(&self) -> String {
        match self.repo_name {
            Some(name) => format!("{} user:{} in:name", name.trim(), self.username),
            None => format!("user:{}", self.username),
        }
    }
}

/// The GitHub REST calls the service needs.
#[async_trait]
pub trait GithubClient: Send + Sync {
    async fn user_exists(&self, username: &str) -> Result<bool, GithubError>;
    async fn search_repositories(&self, search: RepoSearch<'_>) -> Result<SearchResults, GithubError>;
    /// Raw repository object, forwarded unchanged.
    async fn repository(&self, owner: &str, repo: &str, access_token: Option<&str>)
        -> Result<serde_json::Value, GithubError>;
    async fn branches(&self, owner: &str, repo: &str, access_token: Option<&str>)
        -> Result<Vec<RawBranch>, GithubError>;
}

pub struct HttpGithubClient {
    client: Client,
    base_url: Url,
}

impl HttpGithubClient {
    pub fn new(cfg: &GithubConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(cfg.timeout())
            .build()
            .context("build GitHub HTTP client")?;
        let base_url = Url::parse(&cfg.api_url).with_context(|| format!("parse GITHUB_API_URL {}", cfg.api_url))?;
        anyhow::ensure!(!base_url.cannot_be_a_base(), "GITHUB_API_URL must be an http(s) URL");
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, GithubError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GithubError::Upstream("invalid GitHub API URL".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get(&self, url: Url, access_token: Option<&str>) -> RequestBuilder {
        let request = self.client.get(url);
        match access_token.map(str::trim).filter(|t| !t.is_empty()) {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, GithubError> {
        request.send().await.map_err(|e| {
            error!(error = %e, "GitHub request failed");
            transport_error(e)
        })
    }

    async fn json<T: serde::de::DeserializeOwned>(response: Response, missing: &str) -> Result<T, GithubError> {
        let status = response.status();
        if !status.is_success() {
            let err = status_error(status, response.headers(), missing);
            error!(%status, error = %err, "GitHub returned an error");
            return Err(err);
        }
        response.json::<T>().await.map_err(|e| {
            error!(error = %e, "GitHub response could not be decoded");
            GithubError::Upstream(format!("invalid response body: {e}"))
        })
    }
}

#[async_trait]
impl GithubClient for HttpGithubClient {
    async fn user_exists(&self, username: &str) -> Result<bool, GithubError> {
        let url = self.endpoint(&["users", username])?;
        let response = self.send(self.get(url, None)).await?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(status_error(status, response.headers(), &format!("GitHub user \"{username}\""))),
        }
    }

    async fn search_repositories(&self, search: RepoSearch<'_>) -> Result<SearchResults, GithubError> {
        let url = self.endpoint(&["search", "repositories"])?;
        let query = search.query();
        let per_page = search.per_page.to_string();
        debug!(%query, "searching GitHub repositories");
        let request = self.get(url, search.access_token).query(&[
            ("q", query.as_str()),
            ("sort", "updated"),
            ("order", "desc"),
            ("per_page", per_page.as_str()),
        ]);
        let response = self.send(request).await?;
        Self::json(response, &format!("user \"{}\"", search.username)).await
    }

    async fn repository(
        &self,
        owner: &str,
        repo: &str,
        access_token: Option<&str>,
    ) -> Result<serde_json::Value, GithubError> {
        let url = self.endpoint(&["repos", owner, repo])?;
        let response = self.send(self.get(url, access_token)).await?;
        Self::json(response, &format!("Repository \"{owner}/{repo}\"")).await
    }

    async fn branches(
        &self,
        owner: &str,
        repo: &str,
        access_token: Option<&str>,
    ) -> Result<Vec<RawBranch>, GithubError> {
        let url = self.endpoint(&["repos", owner, repo, "branches"])?;
        let response = self.send(self.get(url, access_token)).await?;
        Self::json(response, &format!("Repository \"{owner}/{repo}\"")).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::{
        extract::{Path, Query},
        http::HeaderMap as AxumHeaders,
        response::IntoResponse,
        routing::get,
        Json, Router,
    };
    use serde_json::json;

    use super::*;

    async fn spawn_fake_github() -> String {
        async fn search(headers: AxumHeaders, Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
            assert_eq!(headers.get("user-agent").unwrap(), USER_AGENT);
            assert_eq!(headers.get("accept").unwrap(), GITHUB_ACCEPT);
            match params.get("q").map(String::as_str) {
                Some("user:limited") => (
                    StatusCode::FORBIDDEN,
                    [("x-ratelimit-remaining", "0")],
                    Json(json!({ "message": "API rate limit exceeded" })),
                )
                    .into_response(),
                Some("user:octocat") | Some("hello user:octocat in:name") => {
                    assert_eq!(params["sort"], "updated");
                    assert_eq!(params["order"], "desc");
                    assert_eq!(params["per_page"], "50");
                    Json(json!({
                        "total_count": 7,
                        "items": [{ "id": 1, "name": "hello", "full_name": "octocat/hello", "extra": true }]
                    }))
                    .into_response()
                }
                _ => (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "message": "Validation Failed" }))).into_response(),
            }
        }

        async fn user(Path(login): Path<String>) -> impl IntoResponse {
            if login == "octocat" {
                (StatusCode::OK, Json(json!({ "login": "octocat" })))
            } else {
                (StatusCode::NOT_FOUND, Json(json!({ "message": "Not Found" })))
            }
        }

        let app = Router::new()
            .route("/search/repositories", get(search))
            .route("/users/:login", get(user))
            .route("/repos/forbidden/:repo", get(|| async { StatusCode::FORBIDDEN }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client_for(api_url: String) -> HttpGithubClient {
        HttpGithubClient::new(&GithubConfig {
            api_url,
            timeout_secs: 5,
            per_page: 50,
        })
        .expect("client builds")
    }

    fn search<'a>(username: &'a str, repo_name: Option<&'static str>) -> RepoSearch<'a> {
        RepoSearch {
            username,
            repo_name,
            access_token: None,
            per_page: 50,
        }
    }

    #[test]
    fn search_query_syntax() {
        assert_eq!(search("octocat", None).query(), "user:octocat");
        assert_eq!(search("octocat", Some(" docs ")).query(), "docs user:octocat in:name");
    }

    #[test]
    fn status_classification() {
        let none = HeaderMap::new();
        let mut limited = HeaderMap::new();
        limited.insert(RATE_LIMIT_HEADER, HeaderValue::from_static("0"));

        assert!(matches!(status_error(StatusCode::NOT_FOUND, &none, "x"), GithubError::NotFound(_)));
        assert!(matches!(status_error(StatusCode::FORBIDDEN, &limited, "x"), GithubError::RateLimited));
        assert!(matches!(status_error(StatusCode::FORBIDDEN, &none, "x"), GithubError::Forbidden));
        assert!(matches!(
            status_error(StatusCode::UNPROCESSABLE_ENTITY, &none, "x"),
            GithubError::InvalidQuery(_)
        ));
        assert!(matches!(
            status_error(StatusCode::INTERNAL_SERVER_ERROR, &none, "x"),
            GithubError::Upstream(_)
        ));
    }

    #[test]
    fn errors_map_to_http_statuses() {
        let cases = [
            (GithubError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (GithubError::InvalidQuery("x".into()), StatusCode::BAD_REQUEST),
            (GithubError::RateLimited, StatusCode::TOO_MANY_REQUESTS),
            (GithubError::Forbidden, StatusCode::FORBIDDEN),
            (GithubError::Timeout, StatusCode::GATEWAY_TIMEOUT),
            (GithubError::Connection, StatusCode::SERVICE_UNAVAILABLE),
            (GithubError::Upstream("x".into()), StatusCode::BAD_GATEWAY),
        ];
        for (err, expected) in cases {
            assert_eq!(AppError::from(err).status(), expected);
        }
    }

    #[tokio::test]
    async fn search_sends_expected_request_and_decodes() {
        let client = client_for(spawn_fake_github().await);

        let results = client.search_repositories(search("octocat", None)).await.unwrap();
        assert_eq!(results.total_count, 7);
        assert_eq!(results.items.len(), 1);
        assert_eq!(results.items[0].full_name.as_deref(), Some("octocat/hello"));

        let named = client.search_repositories(search("octocat", Some("hello"))).await.unwrap();
        assert_eq!(named.items.len(), 1);
    }

    #[tokio::test]
    async fn search_maps_upstream_failures() {
        let client = client_for(spawn_fake_github().await);
        assert!(matches!(
            client.search_repositories(search("limited", None)).await,
            Err(GithubError::RateLimited)
        ));
        assert!(matches!(
            client.search_repositories(search("nobody", None)).await,
            Err(GithubError::InvalidQuery(_))
        ));
        assert!(matches!(
            client.repository("forbidden", "thing", None).await,
            Err(GithubError::Forbidden)
        ));
        assert!(matches!(
            client.repository("missing", "thing", None).await,
            Err(GithubError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn user_existence() {
        let client = client_for(spawn_fake_github().await);
        assert!(client.user_exists("octocat").await.unwrap());
        assert!(!client.user_exists("no-such-user-here").await.unwrap());
    }

    #[tokio::test]
    async fn refused_connection_is_unreachable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client_for(format!("http://{addr}")).user_exists("octocat").await.unwrap_err();
        assert!(err.is_unreachable(), "got {err:?}");
    }
}

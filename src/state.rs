use std::sync::Arc;

use crate::{
    config::AppConfig,
    db,
    github::{GithubClient, HttpGithubClient},
    openai::{CompletionClient, OpenAiClient},
    users::repo::{PgUserStore, UserStore},
};

/// Everything a handler needs, built once at startup and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub github: Arc<dyn GithubClient>,
    pub completions: Arc<dyn CompletionClient>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let pool = db::connect(&config.database_url).await?;
        db::run_migrations(&pool).await;

        let users = Arc::new(PgUserStore::new(pool)) as Arc<dyn UserStore>;
        let github = Arc::new(HttpGithubClient::new(&config.github)?) as Arc<dyn GithubClient>;
        let completions = Arc::new(OpenAiClient::new(&config.openai)?) as Arc<dyn CompletionClient>;

        Ok(Self::from_parts(Arc::new(config), users, github, completions))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        github: Arc<dyn GithubClient>,
        completions: Arc<dyn CompletionClient>,
    ) -> Self {
        Self {
            config,
            users,
            github,
            completions,
        }
    }

    /// In-memory store and canned GitHub / completion clients. No network, no
    /// database.
    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::testing::{test_config, FakeCompletions, FakeGithub, MemoryUserStore};

        Self::from_parts(
            Arc::new(test_config()),
            Arc::new(MemoryUserStore::default()),
            Arc::new(FakeGithub::default()),
            Arc::new(FakeCompletions::default()),
        )
    }
}

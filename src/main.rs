use docgen_api::{
    app::{build_app, serve},
    config::{AppConfig, Environment},
    state::AppState,
    users::services::UserService,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    init_tracing(config.environment);

    let addr = config.bind_addr();
    let seed = config.admin_seed.clone();
    let state = AppState::init(config).await?;

    if let Some(seed) = seed {
        if let Err(e) = UserService::new(&state).ensure_admin_account(&seed).await {
            warn!(error = %e, email = %seed.email, "could not seed admin account");
        }
    }

    info!(environment = ?state.config.environment, "starting docgen-api");
    serve(build_app(state), &addr).await
}

fn init_tracing(environment: Environment) {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| environment.default_log_filter().to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(environment == Environment::Production);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

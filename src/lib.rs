pub mod analyzer;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod github;
pub mod metrics;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use config::AppConfig;
use github::GitHubSearch;
use metrics::PeriodComparison;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

/// Query parameters of the stats endpoint.
#[derive(Debug, Deserialize)]
pub struct StatsParams {
    pub username: Option<String>,
    pub token: Option<String>,
}

/// Shared application state accessible to all request handlers.
pub struct AppState {
    /// Application configuration loaded from environment variables.
    pub config: AppConfig,
}

impl AppState {
    /// Validates the configuration and wraps it for the handlers.
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Runs a two-period analysis for `username`, authenticating with the caller's token.
    pub async fn analyze(&self, username: &str, token: &str) -> error::Result<PeriodComparison> {
        let search = GitHubSearch::new(&self.config, token)?;
        analyzer::analyze_user(
            &search,
            username,
            self.config.analysis_windows(),
            self.config.fetch_options(),
        )
        .await
    }
}

pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/github/stats", get(get_github_stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "prstats-backend",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn required(value: Option<String>, message: &str) -> Result<String, (StatusCode, String)> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| (StatusCode::BAD_REQUEST, message.to_string()))
}

/// GitHub logins are ASCII alphanumerics and hyphens; apps add a `[bot]` suffix.
/// Anything else could smuggle extra qualifiers into the search query.
fn is_valid_login(username: &str) -> bool {
    let login = username.strip_suffix("[bot]").unwrap_or(username);
    !login.is_empty() && login.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

pub async fn get_github_stats(
    Query(params): Query<StatsParams>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<PeriodComparison>, (StatusCode, String)> {
    let username = required(params.username, "Username is required")?;
    if !is_valid_login(&username) {
        return Err((StatusCode::BAD_REQUEST, "Invalid username".to_string()));
    }
    let token = required(params.token, "GitHub token is required")?;

    match state.analyze(&username, &token).await {
        Ok(comparison) => {
            tracing::debug!(username = %username, "Returning pull request stats");
            Ok(Json(comparison))
        }
        Err(e) => {
            tracing::error!(username = %username, "Failed to fetch GitHub stats: {}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

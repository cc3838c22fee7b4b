use crate::config::AppConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use octocrab::service::middleware::retry::RetryConfig;
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrState {
    Open,
    Closed,
}

/// Where a pull request ended up. Every record falls into exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Merged,
    ClosedUnmerged,
    Open,
}

/// A pull request as returned by the issue search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PullRequestRecord {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub state: PrState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
    pub author: String,
}

impl PullRequestRecord {
    /// A merge timestamp wins over the lifecycle state.
    pub fn outcome(&self) -> Outcome {
        if self.merged_at.is_some() {
            return Outcome::Merged;
        }
        match self.state {
            PrState::Closed => Outcome::ClosedUnmerged,
            PrState::Open => Outcome::Open,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: u64,
    number: u64,
    title: String,
    state: PrState,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    merged_at: Option<DateTime<Utc>>,
    user: SearchUser,
    pull_request: Option<PullRequestLinks>,
}

#[derive(Debug, Deserialize)]
struct SearchUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct PullRequestLinks {
    merged_at: Option<DateTime<Utc>>,
}

impl From<SearchItem> for PullRequestRecord {
    fn from(item: SearchItem) -> Self {
        // Search results nest the merge time under `pull_request`.
        let merged_at = item
            .merged_at
            .or_else(|| item.pull_request.and_then(|links| links.merged_at));

        Self {
            id: item.id,
            number: item.number,
            title: item.title,
            state: item.state,
            created_at: item.created_at,
            updated_at: item.updated_at,
            closed_at: item.closed_at,
            merged_at,
            author: item.user.login,
        }
    }
}

/// Parses one page of search results into records, preserving their order.
pub fn parse_search_page(body: &str) -> Result<Vec<PullRequestRecord>> {
    let page: SearchResponse = serde_json::from_str(body)?;
    Ok(page.items.into_iter().map(PullRequestRecord::from).collect())
}

/// Filters for a pull request search scoped to a single author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub author: String,
    /// Inclusive lower bound on the creation date.
    pub since: Option<NaiveDate>,
    /// Inclusive upper bound on the creation date.
    pub until: Option<NaiveDate>,
}

impl SearchQuery {
    pub fn new(author: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            since: None,
            until: None,
        }
    }

    pub fn created_between(mut self, since: Option<NaiveDate>, until: Option<NaiveDate>) -> Self {
        self.since = since;
        self.until = until;
        self
    }

    /// Renders the `q` parameter, e.g. `author:octocat type:pr created:>=2024-01-01`.
    pub fn to_query_string(&self) -> String {
        let mut query = format!("author:{} type:pr", self.author);
        if let Some(since) = self.since {
            query.push_str(&format!(" created:>={}", since.format("%Y-%m-%d")));
        }
        if let Some(until) = self.until {
            query.push_str(&format!(" created:<={}", until.format("%Y-%m-%d")));
        }
        query
    }
}

/// Anything that can return one page of search results.
///
/// Pages are 1-based and sorted by creation date, newest first.
#[async_trait]
pub trait SearchPageSource: Send + Sync {
    async fn fetch_page(
        &self,
        query: &SearchQuery,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<PullRequestRecord>>;
}

/// Issue search backed by the GitHub REST API.
pub struct GitHubSearch {
    octocrab: Octocrab,
}

impl GitHubSearch {
    /// Builds a client authenticated with `token`. Failed requests are never retried.
    ///
    /// Requests identify themselves with octocrab's own `User-Agent`.
    pub fn new(config: &AppConfig, token: &str) -> Result<Self> {
        let mut builder = Octocrab::builder()
            .personal_token(token.to_string())
            .add_retry_config(RetryConfig::None);

        if let Some(base_uri) = &config.github_api_url {
            builder = builder
                .base_uri(base_uri.as_str())
                .map_err(|e| Error::Client(e.to_string()))?;
        }

        let octocrab = builder.build().map_err(|e| Error::Client(e.to_string()))?;
        Ok(Self { octocrab })
    }

    fn search_uri(query: &SearchQuery, page: u32, per_page: u32) -> String {
        let params = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("q", &query.to_query_string())
            .append_pair("sort", "created")
            .append_pair("order", "desc")
            .append_pair("per_page", &per_page.to_string())
            .append_pair("page", &page.to_string())
            .finish();
        format!("/search/issues?{params}")
    }
}

#[async_trait]
impl SearchPageSource for GitHubSearch {
    async fn fetch_page(
        &self,
        query: &SearchQuery,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<PullRequestRecord>> {
        let response = self
            .octocrab
            ._get(Self::search_uri(query, page, per_page))
            .await?;

        let status = response.status();
        let body = self.octocrab.body_to_string(response).await?;

        if !status.is_success() {
            return Err(Error::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        parse_search_page(&body)
    }
}

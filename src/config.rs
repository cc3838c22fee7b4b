//! Application configuration and environment variable parsing.
//!
//! This module handles loading configuration settings from the environment (e.g., .env file).
//! It defines the `AppConfig` struct which governs the search pagination policy, the
//! month approximation used for throughput, and the length of the compared periods.

use crate::analyzer::AnalysisWindows;
use crate::fetcher::FetchOptions;
use anyhow::ensure;
use serde::Deserialize;

/// Largest accepted month approximation, in days.
const MAX_DAYS_PER_MONTH: i64 = 366;

/// Application configuration loaded from environment variables.
#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    /// Port the HTTP server listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Base URI of the GitHub API. Defaults to `https://api.github.com` when unset.
    pub github_api_url: Option<String>,

    /// Hard limit on the number of search pages requested per window.
    ///
    /// Hitting this limit truncates the result silently; only a warning is logged.
    #[serde(default = "default_max_search_pages")]
    pub max_search_pages: u32,

    /// Number of results requested per search page.
    #[serde(default = "default_search_page_size")]
    pub search_page_size: u32,

    /// Length of the month approximation used for throughput, in days.
    #[serde(default = "default_days_per_month")]
    pub days_per_month: i64,

    /// Length of each compared period, in calendar months.
    #[serde(default = "default_period_months")]
    pub period_months: u32,
}

fn default_port() -> u16 {
    3000
}

fn default_max_search_pages() -> u32 {
    FetchOptions::DEFAULT_MAX_PAGES
}

fn default_search_page_size() -> u32 {
    FetchOptions::DEFAULT_PAGE_SIZE
}

fn default_days_per_month() -> i64 {
    AnalysisWindows::DEFAULT_DAYS_PER_MONTH
}

fn default_period_months() -> u32 {
    AnalysisWindows::DEFAULT_PERIOD_MONTHS
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            github_api_url: None,
            max_search_pages: default_max_search_pages(),
            search_page_size: default_search_page_size(),
            days_per_month: default_days_per_month(),
            period_months: default_period_months(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// Rejects values that would make pagination or the rate math meaningless.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.max_search_pages > 0, "MAX_SEARCH_PAGES must be at least 1");
        ensure!(
            (1..=100).contains(&self.search_page_size),
            "SEARCH_PAGE_SIZE must be between 1 and 100"
        );
        ensure!(
            (1..=MAX_DAYS_PER_MONTH).contains(&self.days_per_month),
            "DAYS_PER_MONTH must be between 1 and {}",
            MAX_DAYS_PER_MONTH
        );
        ensure!(self.period_months > 0, "PERIOD_MONTHS must be at least 1");
        Ok(())
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            page_size: self.search_page_size,
            max_pages: self.max_search_pages,
        }
    }

    pub fn analysis_windows(&self) -> AnalysisWindows {
        AnalysisWindows {
            period_months: self.period_months,
            days_per_month: self.days_per_month,
        }
    }
}

//! Two-period pull request analysis for a single author.
//!
//! `analyze_user` splits the last year into two adjacent windows (by default the
//! last 6 months and the 6 months before that), fetches both concurrently, and
//! compares their throughput. Nothing is cached between calls.

use crate::error::Result;
use crate::fetcher::{self, FetchOptions};
use crate::github::SearchPageSource;
use crate::metrics::{self, PeriodComparison};
use chrono::{DateTime, Months, Utc};

/// A `[start, end)` time window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Shape of the compared periods and the month approximation used for throughput.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnalysisWindows {
    /// Length of each period in calendar months.
    pub period_months: u32,
    /// Days per month when converting a window length into months.
    pub days_per_month: i64,
}

impl AnalysisWindows {
    pub const DEFAULT_PERIOD_MONTHS: u32 = 6;
    pub const DEFAULT_DAYS_PER_MONTH: i64 = 30;

    /// Returns the `(current, previous)` windows ending at `now`.
    ///
    /// The previous window ends exactly where the current one starts. Both starts are
    /// counted back from `now` and clamped to the last day of a shorter month, so
    /// Aug 31 minus 6 months is Feb 29 (or 28), not the day-overflowed Mar 2 that
    /// plain day-of-month arithmetic would give.
    pub fn split(&self, now: DateTime<Utc>) -> (Window, Window) {
        let current_start = now
            .checked_sub_months(Months::new(self.period_months))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let previous_start = now
            .checked_sub_months(Months::new(self.period_months.saturating_mul(2)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        (
            Window {
                start: current_start,
                end: now,
            },
            Window {
                start: previous_start,
                end: current_start,
            },
        )
    }
}

impl Default for AnalysisWindows {
    fn default() -> Self {
        Self {
            period_months: Self::DEFAULT_PERIOD_MONTHS,
            days_per_month: Self::DEFAULT_DAYS_PER_MONTH,
        }
    }
}

/// Compares `author`'s pull request throughput over the two periods ending now.
pub async fn analyze_user<S>(
    source: &S,
    author: &str,
    windows: AnalysisWindows,
    options: FetchOptions,
) -> Result<PeriodComparison>
where
    S: SearchPageSource + ?Sized,
{
    analyze_user_at(source, author, windows, options, Utc::now()).await
}

/// Same as [`analyze_user`] with an explicit reference time.
pub async fn analyze_user_at<S>(
    source: &S,
    author: &str,
    windows: AnalysisWindows,
    options: FetchOptions,
    now: DateTime<Utc>,
) -> Result<PeriodComparison>
where
    S: SearchPageSource + ?Sized,
{
    let (current, previous) = windows.split(now);

    let (current_prs, previous_prs) = tokio::try_join!(
        fetcher::fetch_records(source, author, Some(current.start), Some(current.end), options),
        fetcher::fetch_records(source, author, Some(previous.start), Some(previous.end), options),
    )?;

    tracing::info!(
        author,
        current = current_prs.len(),
        previous = previous_prs.len(),
        "Fetched pull requests for both periods"
    );

    let current_stats = metrics::compute_stats(
        &current_prs,
        current.start,
        current.end,
        windows.days_per_month,
    );
    let previous_stats = metrics::compute_stats(
        &previous_prs,
        previous.start,
        previous.end,
        windows.days_per_month,
    );

    Ok(metrics::compare_stats(current_stats, previous_stats))
}

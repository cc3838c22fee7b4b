use crate::github::{Outcome, PullRequestRecord};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

/// Aggregate pull request statistics over a `[start_date, end_date)` window.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct StatsSnapshot {
    #[serde(rename = "totalPRs")]
    pub total: usize,
    #[serde(rename = "mergedPRs")]
    pub merged: usize,
    /// Closed without being merged.
    #[serde(rename = "closedPRs")]
    pub closed: usize,
    #[serde(rename = "openPRs")]
    pub open: usize,
    /// Percentage of merged pull requests, one decimal.
    #[serde(rename = "mergeRate")]
    pub merge_rate: f64,
    /// Pull requests per month, one decimal.
    #[serde(rename = "prsPerMonth")]
    pub prs_per_month: f64,
    #[serde(rename = "startDate")]
    pub start_date: NaiveDate,
    #[serde(rename = "endDate")]
    pub end_date: NaiveDate,
}

/// Throughput of the current period measured against the previous one.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PeriodComparison {
    pub current: StatsSnapshot,
    pub previous: StatsSnapshot,
    #[serde(rename = "rateChange")]
    pub rate_change: f64,
    #[serde(rename = "rateChangePercent")]
    pub rate_change_percent: f64,
}

/// Rounds to one decimal place, halves away from zero.
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

const MS_PER_DAY: f64 = 86_400_000.0;

/// Number of `days_per_month`-day months between `start` and `end`, never less than one.
pub fn months_between(start: DateTime<Utc>, end: DateTime<Utc>, days_per_month: i64) -> f64 {
    let month_ms = days_per_month as f64 * MS_PER_DAY;
    let elapsed_ms = (end - start).num_milliseconds() as f64;
    let months = elapsed_ms / month_ms;
    // NaN and negative results from a non-positive month length fall back to one month.
    if months.is_finite() && months > 1.0 {
        months
    } else {
        1.0
    }
}

/// Calculates merge rate and throughput for the records of one window.
///
/// # Arguments
/// * `prs` - The records created within the window.
/// * `start` / `end` - The window bounds; only their dates appear in the result.
/// * `days_per_month` - Length of the month approximation used for throughput.
pub fn compute_stats(
    prs: &[PullRequestRecord],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    days_per_month: i64,
) -> StatsSnapshot {
    let (mut merged, mut closed, mut open) = (0, 0, 0);
    for pr in prs {
        match pr.outcome() {
            Outcome::Merged => merged += 1,
            Outcome::ClosedUnmerged => closed += 1,
            Outcome::Open => open += 1,
        }
    }

    let total = prs.len();
    let merge_rate = if total > 0 {
        merged as f64 / total as f64 * 100.0
    } else {
        0.0
    };
    let prs_per_month = total as f64 / months_between(start, end, days_per_month);

    StatsSnapshot {
        total,
        merged,
        closed,
        open,
        merge_rate: round_one_decimal(merge_rate),
        prs_per_month: round_one_decimal(prs_per_month),
        start_date: start.date_naive(),
        end_date: end.date_naive(),
    }
}

/// Compares throughput between two periods.
///
/// The percentage change is 0 when the previous period had no throughput.
pub fn compare_stats(current: StatsSnapshot, previous: StatsSnapshot) -> PeriodComparison {
    let rate_change = current.prs_per_month - previous.prs_per_month;
    let rate_change_percent = if previous.prs_per_month > 0.0 {
        rate_change / previous.prs_per_month * 100.0
    } else {
        0.0
    };

    PeriodComparison {
        current,
        previous,
        rate_change: round_one_decimal(rate_change),
        rate_change_percent: round_one_decimal(rate_change_percent),
    }
}

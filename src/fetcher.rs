use crate::error::Result;
use crate::github::{PullRequestRecord, SearchPageSource, SearchQuery};
use chrono::{DateTime, Utc};

/// Pagination policy for a single search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchOptions {
    /// Results requested per page. A shorter page marks the end of the results.
    pub page_size: u32,
    /// Hard cap on the number of pages requested.
    ///
    /// Reaching the cap stops pagination without an error, so a result of exactly
    /// `page_size * max_pages` records may be truncated.
    pub max_pages: u32,
}

impl FetchOptions {
    pub const DEFAULT_PAGE_SIZE: u32 = 100;
    pub const DEFAULT_MAX_PAGES: u32 = 10;
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            page_size: Self::DEFAULT_PAGE_SIZE,
            max_pages: Self::DEFAULT_MAX_PAGES,
        }
    }
}

/// Fetches every pull request `author` created within the optional date range.
///
/// Pages are requested one after another and concatenated in the order received
/// (newest first). Any failed page aborts the whole fetch and the records
/// collected so far are dropped.
pub async fn fetch_records<S>(
    source: &S,
    author: &str,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
    options: FetchOptions,
) -> Result<Vec<PullRequestRecord>>
where
    S: SearchPageSource + ?Sized,
{
    let query = SearchQuery::new(author)
        .created_between(since.map(|d| d.date_naive()), until.map(|d| d.date_naive()));

    let mut records = Vec::new();
    let mut page = 1;

    loop {
        let items = source.fetch_page(&query, page, options.page_size).await?;
        let received = items.len();
        tracing::debug!(author, page, received, "Fetched search page");

        if received == 0 {
            break;
        }

        records.extend(items);

        if received < options.page_size as usize {
            break;
        }

        if page >= options.max_pages {
            tracing::warn!(
                author,
                max_pages = options.max_pages,
                "Hit search page limit before the last page. Data may be incomplete."
            );
            break;
        }

        page += 1;
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::github::PrState;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Serves pages of a fixed size and records every request it sees.
    struct FakeSource {
        page_sizes: Vec<usize>,
        fail_on_page: Option<u32>,
        calls: AtomicU32,
        queries: Mutex<Vec<(String, u32, u32)>>,
    }

    impl FakeSource {
        fn new(page_sizes: Vec<usize>) -> Self {
            Self {
                page_sizes,
                fail_on_page: None,
                calls: AtomicU32::new(0),
                queries: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn record(id: u64) -> PullRequestRecord {
        let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        PullRequestRecord {
            id,
            number: id,
            title: format!("PR {id}"),
            state: PrState::Open,
            created_at,
            updated_at: created_at,
            closed_at: None,
            merged_at: None,
            author: "octocat".to_string(),
        }
    }

    #[async_trait]
    impl SearchPageSource for FakeSource {
        async fn fetch_page(
            &self,
            query: &SearchQuery,
            page: u32,
            per_page: u32,
        ) -> Result<Vec<PullRequestRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.queries
                .lock()
                .unwrap()
                .push((query.to_query_string(), page, per_page));

            if self.fail_on_page == Some(page) {
                return Err(Error::Upstream {
                    status: 403,
                    body: "rate limit exceeded".to_string(),
                });
            }

            let size = self
                .page_sizes
                .get(page as usize - 1)
                .copied()
                .unwrap_or(0);
            let offset = u64::from(page - 1) * u64::from(per_page);
            Ok((0..size as u64).map(|i| record(offset + i)).collect())
        }
    }

    #[tokio::test]
    async fn test_stops_at_page_limit() {
        let source = FakeSource::new(vec![100; 11]);

        let records = fetch_records(&source, "octocat", None, None, FetchOptions::default())
            .await
            .unwrap();

        assert_eq!(records.len(), 1000);
        assert_eq!(source.calls(), 10);
    }

    #[tokio::test]
    async fn test_short_page_ends_pagination() {
        let source = FakeSource::new(vec![37, 100]);

        let records = fetch_records(&source, "octocat", None, None, FetchOptions::default())
            .await
            .unwrap();

        assert_eq!(records.len(), 37);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_page_ends_pagination() {
        let source = FakeSource::new(vec![100, 100, 0]);

        let records = fetch_records(&source, "octocat", None, None, FetchOptions::default())
            .await
            .unwrap();

        assert_eq!(records.len(), 200);
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn test_records_keep_page_order() {
        let source = FakeSource::new(vec![100, 5]);

        let records = fetch_records(&source, "octocat", None, None, FetchOptions::default())
            .await
            .unwrap();

        let ids: Vec<u64> = records.iter().map(|r| r.id).collect();
        let expected: Vec<u64> = (0..105).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn test_error_discards_partial_results() {
        let mut source = FakeSource::new(vec![100, 100, 100]);
        source.fail_on_page = Some(2);

        let result = fetch_records(&source, "octocat", None, None, FetchOptions::default()).await;

        match result {
            Err(Error::Upstream { status, body }) => {
                assert_eq!(status, 403);
                assert_eq!(body, "rate limit exceeded");
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_query_uses_date_range_and_page_size() {
        let source = FakeSource::new(vec![3]);
        let since = Utc.with_ymd_and_hms(2024, 1, 15, 18, 30, 0).unwrap();
        let until = Utc.with_ymd_and_hms(2024, 7, 15, 6, 0, 0).unwrap();
        let options = FetchOptions {
            page_size: 50,
            max_pages: 2,
        };

        fetch_records(&source, "octocat", Some(since), Some(until), options)
            .await
            .unwrap();

        let queries = source.queries.lock().unwrap();
        assert_eq!(
            queries.as_slice(),
            &[(
                "author:octocat type:pr created:>=2024-01-15 created:<=2024-07-15".to_string(),
                1,
                50
            )]
        );
    }

    #[tokio::test]
    async fn test_custom_page_limit() {
        let source = FakeSource::new(vec![10; 5]);
        let options = FetchOptions {
            page_size: 10,
            max_pages: 3,
        };

        let records = fetch_records(&source, "octocat", None, None, options)
            .await
            .unwrap();

        assert_eq!(records.len(), 30);
        assert_eq!(source.calls(), 3);
    }
}

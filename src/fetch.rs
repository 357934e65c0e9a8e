use std::future::Future;
use std::sync::Arc;

use reqwest_middleware::ClientWithMiddleware;
use tokio::task::JoinSet;
use tracing::{debug, error, info, info_span, warn, Instrument};
use url::Url;

use crate::entry::Entry;
use crate::error::FetchError;

/// Something that turns a feed URL into its entries.
pub trait FeedSource: Send + Sync + 'static {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<Vec<Entry>, FetchError>> + Send;
}

/// Retrieves feeds over HTTP and parses them as RSS, Atom or JSON Feed.
#[derive(Clone)]
pub struct HttpFeedSource {
    http_client: ClientWithMiddleware,
}

impl HttpFeedSource {
    pub fn new(http_client: ClientWithMiddleware) -> Self {
        Self { http_client }
    }
}

impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &Url) -> Result<Vec<Entry>, FetchError> {
        let response = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();

        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.clone(),
                status,
            });
        }

        let body = response.bytes().await.map_err(|source| FetchError::Body {
            url: url.clone(),
            source,
        })?;
        debug!("Received {} bytes", body.len());

        let feed = feed_rs::parser::parse(&body[..]).map_err(|source| FetchError::Parse {
            url: url.clone(),
            source,
        })?;

        Ok(feed
            .entries
            .into_iter()
            .map(|entry| Entry::from_parsed(url, entry))
            .collect())
    }
}

/// The union of everything the sources returned.
#[derive(Debug, Default)]
pub struct Fetched {
    /// Grouped by source in the order the sources were given, each group in feed order.
    pub entries: Vec<Entry>,
    pub failed_sources: usize,
}

/// Fetches every feed concurrently and waits for all of them.
///
/// A source that fails contributes no entries; the others are unaffected.
pub async fn fetch_all<S: FeedSource>(source: Arc<S>, feed_urls: &[Url]) -> Fetched {
    let mut tasks = JoinSet::new();

    for (idx, url) in feed_urls.iter().enumerate() {
        let source = source.clone();
        let url = url.clone();
        let span = info_span!("source", feed = %url);

        tasks.spawn(
            async move {
                let result = source.fetch(&url).await;

                (idx, result)
            }
            .instrument(span),
        );
    }

    let mut results = Vec::with_capacity(feed_urls.len());
    results.resize_with(feed_urls.len(), || None);
    let mut fetched = Fetched::default();

    while let Some(task_result) = tasks.join_next().await {
        match task_result {
            Ok((idx, Ok(entries))) => {
                info!(feed = %feed_urls[idx], "Retrieved {} entries", entries.len());
                results[idx] = Some(entries);
            }

            Ok((idx, Err(e))) => {
                warn!(feed = %feed_urls[idx], "{:#}", anyhow::Error::new(e));
                fetched.failed_sources += 1;
            }

            Err(e) => {
                error!("A fetch task did not complete: {e}");
                fetched.failed_sources += 1;
            }
        }
    }

    fetched.entries = results.into_iter().flatten().flatten().collect();

    fetched
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use time::macros::datetime;

    use super::*;
    use crate::testing::{entry, feed_url, titles, FakeSource};

    fn entries(feed: &Url, titles: &[&str]) -> Vec<Entry> {
        titles
            .iter()
            .map(|title| entry(feed, title, Some(datetime!(2024-01-01 00:00 UTC))))
            .collect()
    }

    #[tokio::test]
    async fn collects_every_source() {
        let (a, b, c) = (feed_url("a"), feed_url("b"), feed_url("c"));
        let source = FakeSource::default()
            .with(&a, 30, Some(entries(&a, &["a1", "a2"])))
            .with(&b, 0, Some(entries(&b, &["b1"])))
            .with(&c, 10, Some(vec![]));

        let fetched = fetch_all(Arc::new(source), &[a, b, c]).await;

        assert_eq!(fetched.failed_sources, 0);
        // source order, regardless of which one finished first
        assert_eq!(titles(&fetched.entries), ["a1", "a2", "b1"]);
    }

    #[tokio::test]
    async fn failing_source_is_isolated() {
        let (a, b, c) = (feed_url("a"), feed_url("b"), feed_url("c"));
        let source = Arc::new(
            FakeSource::default()
                .with(&a, 20, Some(entries(&a, &["a1"])))
                .with(&b, 0, None)
                .with(&c, 5, Some(entries(&c, &["c1", "c2"]))),
        );

        let fetched = fetch_all(source.clone(), &[a.clone(), b.clone(), c.clone()]).await;

        assert_eq!(fetched.failed_sources, 1);
        let mut expected = entries(&a, &["a1"]);
        expected.extend(entries(&c, &["c1", "c2"]));
        assert_eq!(fetched.entries, expected);

        let mut requested = source.requested.lock().unwrap().clone();
        requested.sort();
        let mut all = vec![a, b, c];
        all.sort();
        assert_eq!(requested, all);
    }

    #[tokio::test]
    async fn panicking_source_counts_as_failed() {
        let (a, b, c) = (feed_url("a"), feed_url("b"), feed_url("c"));
        let source = Arc::new(
            FakeSource::default()
                .with(&a, 10, Some(entries(&a, &["a1", "a2"])))
                .panicking(&b)
                .with(&c, 0, Some(entries(&c, &["c1"]))),
        );

        let fetched = fetch_all(source.clone(), &[a.clone(), b.clone(), c.clone()]).await;

        assert_eq!(fetched.failed_sources, 1);
        let mut expected = entries(&a, &["a1", "a2"]);
        expected.extend(entries(&c, &["c1"]));
        assert_eq!(fetched.entries, expected);
        assert!(source.requested.lock().unwrap().contains(&b));
    }

    #[tokio::test]
    async fn every_source_failing_is_not_an_error() {
        let (a, b) = (feed_url("a"), feed_url("b"));
        let source = FakeSource::default().with(&a, 0, None).with(&b, 0, None);

        let fetched = fetch_all(Arc::new(source), &[a, b]).await;

        assert_eq!(fetched.failed_sources, 2);
        assert!(fetched.entries.is_empty());
    }

    #[tokio::test]
    async fn no_sources() {
        let fetched = fetch_all(Arc::new(FakeSource::default()), &[]).await;

        assert_eq!(fetched.failed_sources, 0);
        assert!(fetched.entries.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn sources_are_fetched_concurrently() {
        let urls: Vec<_> = (0..5).map(|i| feed_url(&format!("s{i}"))).collect();
        let source = urls.iter().fold(FakeSource::default(), |source, url| {
            source.with(url, 1_000, Some(entries(url, &["x"])))
        });

        let started = tokio::time::Instant::now();
        let fetched = fetch_all(Arc::new(source), &urls).await;

        assert_eq!(fetched.entries.len(), 5);
        assert!(started.elapsed() < Duration::from_millis(1_500));
    }
}

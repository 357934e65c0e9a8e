use std::sync::Arc;

use tracing::{debug, info, info_span, Instrument};
use url::Url;

use crate::error::RunError;
use crate::fetch::{fetch_all, FeedSource};
use crate::notify::{Delivery, Notifier, Sink};
use crate::order::{newer_than, sort_newest_first};
use crate::watermark::{Watermark, WatermarkStore};

/// The outcome of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Entries retrieved from all sources, before filtering.
    pub fetched: usize,
    pub failed_sources: usize,

    /// Entries newer than the watermark.
    pub new: usize,
    pub delivery: Delivery,

    /// The watermark persisted at the end of the run, if it moved.
    pub watermark: Option<Watermark>,
}

/// Fetch, merge, filter, notify, persist.
pub struct Pipeline<F, S, W> {
    source: Arc<F>,
    notifier: Notifier<S>,
    store: W,
}

impl<F, S, W> Pipeline<F, S, W>
where
    F: FeedSource,
    S: Sink,
    W: WatermarkStore,
{
    pub fn new(source: Arc<F>, notifier: Notifier<S>, store: W) -> Self {
        Self {
            source,
            notifier,
            store,
        }
    }

    pub fn notifier(&self) -> &Notifier<S> {
        &self.notifier
    }

    pub fn store(&self) -> &W {
        &self.store
    }

    /// Runs a single pass over `feed_urls`.
    ///
    /// A malformed watermark fails the run before any request is made. Sources and notifications
    /// that fail are logged and skipped. If the new watermark cannot be persisted, the
    /// notifications already sent stay sent, and the next run will repeat them.
    pub async fn run(&mut self, feed_urls: &[Url]) -> Result<RunReport, RunError> {
        let watermark = self.store.load()?;
        info!(%watermark, "Looking for entries across {} feeds", feed_urls.len());

        let fetched = fetch_all(self.source.clone(), feed_urls)
            .instrument(info_span!("fetch"))
            .await;
        let mut entries = fetched.entries;
        let fetched_count = entries.len();

        info_span!("merge").in_scope(|| sort_newest_first(&mut entries));

        let entries = info_span!("filter", %watermark).in_scope(|| {
            let entries = newer_than(entries, watermark);
            info!("{} of {fetched_count} entries are newer", entries.len());

            entries
        });

        let delivery = async {
            let delivery = self.notifier.notify_all(&entries).await;

            if delivery.attempted > 0 {
                info!(
                    "Delivered {} of {} notifications",
                    delivery.delivered, delivery.attempted
                );
            }

            delivery
        }
        .instrument(info_span!("notify"))
        .await;

        // entries are sorted, so the first one carries the newest timestamp
        let new_watermark = match entries.first().and_then(|entry| entry.published_at) {
            Some(newest) => {
                let new_watermark = Watermark::from(newest);

                info_span!("persist", watermark = %new_watermark)
                    .in_scope(|| self.store.save(new_watermark))?;

                Some(new_watermark)
            }

            None => {
                debug!("Nothing new; keeping the watermark");

                None
            }
        };

        Ok(RunReport {
            fetched: fetched_count,
            failed_sources: fetched.failed_sources,
            new: entries.len(),
            delivery,
            watermark: new_watermark,
        })
    }
}

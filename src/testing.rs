//! In-memory stand-ins for the pipeline's collaborators.

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::Mutex;
use std::time::Duration;

use reqwest::StatusCode;
use time::OffsetDateTime;
use url::Url;

use crate::entry::Entry;
use crate::error::{ConfigError, DeliveryError, FetchError, StorageError};
use crate::fetch::FeedSource;
use crate::notify::{Notification, Sink};
use crate::watermark::{Watermark, WatermarkStore};

pub fn feed_url(name: &str) -> Url {
    format!("https://{name}.example.com/feed").parse().unwrap()
}

pub fn entry(feed: &Url, title: &str, published_at: Option<OffsetDateTime>) -> Entry {
    Entry {
        title: title.into(),
        link: format!("{feed}#{title}"),
        published_at,
        feed: feed.clone(),
    }
}

pub fn titles(entries: &[Entry]) -> Vec<&str> {
    entries.iter().map(|entry| entry.title.as_str()).collect()
}

/// Serves canned results, optionally after a delay, and remembers what was asked for.
/// A feed registered with `None` fails; one registered with `panicking` takes its task down.
#[derive(Default)]
pub struct FakeSource {
    feeds: HashMap<Url, (Duration, Option<Vec<Entry>>)>,
    panics: HashSet<Url>,
    pub requested: Mutex<Vec<Url>>,
}

impl FakeSource {
    pub fn with(mut self, url: &Url, delay_ms: u64, entries: Option<Vec<Entry>>) -> Self {
        self.feeds
            .insert(url.clone(), (Duration::from_millis(delay_ms), entries));
        self
    }

    pub fn panicking(mut self, url: &Url) -> Self {
        self.panics.insert(url.clone());
        self
    }
}

impl FeedSource for FakeSource {
    async fn fetch(&self, url: &Url) -> Result<Vec<Entry>, FetchError> {
        self.requested.lock().unwrap().push(url.clone());

        if self.panics.contains(url) {
            panic!("parser blew up on {url}");
        }

        let (delay, entries) = self.feeds[url].clone();
        tokio::time::sleep(delay).await;

        entries.ok_or_else(|| FetchError::Status {
            url: url.clone(),
            status: StatusCode::BAD_GATEWAY,
        })
    }
}

/// Records every post; rejects the ones whose content contains `fail`.
#[derive(Default)]
pub struct RecordingSink {
    pub posted: Mutex<Vec<(Url, Notification)>>,
}

impl RecordingSink {
    pub fn first_lines(&self) -> Vec<String> {
        self.posted
            .lock()
            .unwrap()
            .iter()
            .map(|(_, n)| n.content.lines().next().unwrap_or_default().to_owned())
            .collect()
    }
}

impl Sink for RecordingSink {
    async fn post(&self, target: &Url, notification: &Notification) -> Result<(), DeliveryError> {
        self.posted
            .lock()
            .unwrap()
            .push((target.clone(), notification.clone()));

        if notification.content.contains("fail") {
            Err(DeliveryError::Status(StatusCode::INTERNAL_SERVER_ERROR))
        } else {
            Ok(())
        }
    }
}

/// Keeps the watermark in memory.
pub struct MemoryStore {
    pub date_since: String,
    pub saved: Vec<Watermark>,
    pub fail_saves: bool,
}

impl MemoryStore {
    pub fn new(date_since: &str) -> Self {
        Self {
            date_since: date_since.into(),
            saved: vec![],
            fail_saves: false,
        }
    }
}

impl WatermarkStore for MemoryStore {
    fn load(&self) -> Result<Watermark, ConfigError> {
        Watermark::parse(&self.date_since)
    }

    fn save(&mut self, watermark: Watermark) -> Result<(), StorageError> {
        if self.fail_saves {
            return Err(StorageError::Write {
                path: "memory".into(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
            });
        }

        self.date_since = watermark.to_rfc3339()?;
        self.saved.push(watermark);

        Ok(())
    }
}

use std::future::Future;

use reqwest::header::CONTENT_TYPE;
use reqwest_middleware::ClientWithMiddleware;
use serde::Serialize;
use tracing::{debug, info_span, warn, Instrument};
use url::Url;

use crate::entry::Entry;
use crate::error::DeliveryError;

/// The webhook payload: `{"content": "<title>\n<link>"}`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub content: String,
}

impl Notification {
    pub fn for_entry(entry: &Entry) -> Self {
        Self {
            content: format!("{}\n{}", entry.title, entry.link),
        }
    }
}

/// Where notifications end up.
pub trait Sink {
    fn post(
        &self,
        target: &Url,
        notification: &Notification,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

/// Posts notifications as JSON to a webhook, once, without retrying.
#[derive(Clone)]
pub struct WebhookSink {
    http_client: ClientWithMiddleware,
}

impl WebhookSink {
    pub fn new(http_client: ClientWithMiddleware) -> Self {
        Self { http_client }
    }
}

impl Sink for WebhookSink {
    async fn post(&self, target: &Url, notification: &Notification) -> Result<(), DeliveryError> {
        let body = serde_json::to_vec(notification)?;
        let response = self
            .http_client
            .post(target.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            return Err(DeliveryError::Status(status));
        }

        Ok(())
    }
}

/// What happened to a batch of notifications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
}

pub struct Notifier<S> {
    sink: S,
    target: Url,
}

impl<S: Sink> Notifier<S> {
    pub fn new(sink: S, target: Url) -> Self {
        Self { sink, target }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Sends one notification per entry, in order. A failed delivery is logged and skipped.
    pub async fn notify_all(&self, entries: &[Entry]) -> Delivery {
        let mut delivery = Delivery::default();

        for (idx, entry) in entries.iter().enumerate() {
            let notification = Notification::for_entry(entry);
            delivery.attempted += 1;

            let result = self
                .sink
                .post(&self.target, &notification)
                .instrument(info_span!("entry", %idx, link = %entry.link))
                .await;

            match result {
                Ok(()) => {
                    debug!(title = %entry.title, "Delivered a notification");
                    delivery.delivered += 1;
                }

                Err(e) => {
                    warn!(
                        title = %entry.title, link = %entry.link,
                        "Could not deliver a notification: {:#}",
                        anyhow::Error::new(e),
                    );
                    delivery.failed += 1;
                }
            }
        }

        delivery
    }
}

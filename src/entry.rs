use time::OffsetDateTime;
use url::Url;

/// One syndication item, as seen by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub title: String,
    pub link: String,

    /// The entry's publication date, or its last update when it has none (common in Atom).
    /// `None` when the feed gave neither or they could not be parsed.
    pub published_at: Option<OffsetDateTime>,

    /// The source this entry was retrieved from.
    pub feed: Url,
}

impl Entry {
    pub fn from_parsed(feed: &Url, entry: feed_rs::model::Entry) -> Self {
        let title = entry.title.map(|text| text.content).unwrap_or_default();
        let link = entry
            .links
            .into_iter()
            .next()
            .map(|link| link.href)
            .unwrap_or_default();
        let published_at = entry.published.or(entry.updated).and_then(|published| {
            let nanos = i128::from(published.timestamp()) * 1_000_000_000
                + i128::from(published.timestamp_subsec_nanos());

            OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()
        });

        Self {
            title,
            link,
            published_at,
            feed: feed.clone(),
        }
    }
}

use std::io;
use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

/// A problem with the configuration. Always fatal, and always raised before any
/// request leaves the process.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no config file found (tried {})", display_paths(.tried))]
    NotFound { tried: Vec<PathBuf> },

    #[error("could not read the config file `{}`", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not parse the config file `{}`", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("`date_since` value `{value}` is not an RFC 3339 timestamp")]
    Watermark {
        value: String,
        #[source]
        source: time::error::Parse,
    },
}

/// A failure to retrieve one feed source. Only ever affects that source.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("could not fetch `{url}`")]
    Request {
        url: Url,
        #[source]
        source: reqwest_middleware::Error,
    },

    #[error("`{url}` responded with {status}")]
    Status { url: Url, status: StatusCode },

    #[error("could not read the response from `{url}`")]
    Body {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not parse the feed at `{url}`")]
    Parse {
        url: Url,
        #[source]
        source: feed_rs::parser::ParseFeedError,
    },
}

/// A failure to deliver one notification. Only ever affects that entry.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("could not encode the notification payload")]
    Encode(#[from] serde_json::Error),

    #[error("could not reach the webhook")]
    Request(#[from] reqwest_middleware::Error),

    #[error("the webhook responded with {0}")]
    Status(StatusCode),
}

/// A failure to write the advanced watermark back.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("could not read `{}` for write-back", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("`{}` is no longer a valid TOML document", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("could not format the watermark")]
    Format(#[from] time::error::Format),

    #[error("could not serialize the updated config")]
    Serialize(#[from] toml::ser::Error),

    #[error("could not write `{}`", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Errors that end a run early or leave it incomplete.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("notifications were sent but the watermark was not persisted")]
    Storage(#[from] StorageError),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| format!("`{}`", path.display()))
        .collect::<Vec<_>>()
        .join(", ")
}

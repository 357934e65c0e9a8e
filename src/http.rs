use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use http_cache_reqwest::{CACacheManager, Cache, HttpCache};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use tracing::debug;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds an HTTP client whose requests give up after `timeout` in total.
///
/// With a `cache_dir`, responses are cached on disk and revalidated on the next run.
pub fn client(timeout: Duration, cache_dir: Option<PathBuf>) -> Result<ClientWithMiddleware> {
    let builder = ClientBuilder::new(
        reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(READ_TIMEOUT)
            .timeout(timeout)
            .build()
            .context("could not create an HTTP client")?,
    );

    let builder = if let Some(path) = cache_dir {
        debug!("Using a file cache at {}", path.display());
        builder.with(Cache(HttpCache {
            mode: Default::default(),
            manager: CACacheManager { path },
            options: Default::default(),
        }))
    } else {
        builder
    };

    Ok(builder.build())
}

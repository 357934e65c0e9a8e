use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use feedhook::cli::Args;
use feedhook::config;
use feedhook::fetch::HttpFeedSource;
use feedhook::http;
use feedhook::notify::{Notifier, WebhookSink};
use feedhook::pipeline::{Pipeline, RunReport};
use feedhook::watermark::ConfigFileStore;
use tracing::{error, info, Level};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

fn set_up_logging() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_regex(false)
                .with_default_directive(Level::INFO.into())
                .with_env_var("FEEDHOOK_LOG")
                .from_env_lossy(),
        )
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    set_up_logging();

    match run().await {
        Ok(report) => {
            info!(
                fetched = report.fetched,
                failed_sources = report.failed_sources,
                new = report.new,
                delivered = report.delivery.delivered,
                failed_deliveries = report.delivery.failed,
                watermark = report.watermark.map(|w| w.to_string()),
                "Done"
            );

            ExitCode::SUCCESS
        }

        Err(e) => {
            error!("{e:#}");

            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<RunReport> {
    let mut args = Args::parse();
    let config_paths = config::search_paths(args.config_path.take());
    let mut cfg = config::load(&config_paths)?;
    cfg.update(args);

    let timeout = cfg.fetch_timeout.into();
    let source = HttpFeedSource::new(http::client(timeout, cfg.cache_dir.clone())?);
    let sink = WebhookSink::new(http::client(timeout, None)?);
    let store = ConfigFileStore::from_config(&cfg);

    let mut pipeline = Pipeline::new(
        Arc::new(source),
        Notifier::new(sink, cfg.webhook_url.clone()),
        store,
    );

    Ok(pipeline.run(&cfg.feed_urls).await?)
}

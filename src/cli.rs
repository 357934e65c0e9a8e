use clap::ValueHint;

use std::path::PathBuf;

use url::Url;

#[derive(clap::Parser, Debug, Clone)]
#[command(version, about)]
pub struct Args {
    /// Path to the config file.
    ///
    /// If not given (or missing), feedhook looks for the following files (in order):
    ///
    /// - `./config.toml`
    /// - `./feedhook.toml`
    /// - `/etc/feedhook.toml`
    ///
    /// The `date_since` key of the file that gets loaded is rewritten after every run that finds
    /// new entries.
    #[arg(
        short,
        long = "config",
        env = "FEEDHOOK_CONFIG",
        value_hint(ValueHint::FilePath)
    )]
    pub config_path: Option<PathBuf>,

    /// Webhook to post notifications to. Overrides `webhook_url` from the config file.
    #[arg(long, env = "FEEDHOOK_WEBHOOK_URL", value_hint(ValueHint::Url))]
    pub webhook_url: Option<Url>,
}

impl Args {
    pub fn parse() -> Self {
        clap::Parser::parse()
    }
}

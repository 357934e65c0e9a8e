mod types;

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::cli::Args;
use crate::error::ConfigError;

pub use self::types::*;

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(60)
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// The file this config was read from; the watermark is written back here.
    #[serde(skip)]
    pub path: PathBuf,

    pub webhook_url: Url,
    pub feed_urls: Vec<Url>,

    /// Kept verbatim: a malformed value is reported when the watermark is loaded.
    pub date_since: String,

    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout: Duration,

    pub cache_dir: Option<PathBuf>,
}

impl Config {
    pub fn update(&mut self, args: Args) {
        fn set_if_some<T>(dst: &mut T, v: Option<T>) {
            if let Some(v) = v {
                *dst = v;
            }
        }

        set_if_some(&mut self.webhook_url, args.webhook_url);
    }

    pub fn resolve_relative_paths(&mut self, config_dir: impl AsRef<Path>) {
        let config_dir = config_dir.as_ref();

        if let Some(cache_dir) = &mut self.cache_dir {
            *cache_dir = config_dir.join(&*cache_dir);
        }
    }
}

/// The default config locations, tried after the one given on the command line.
pub fn search_paths(explicit: Option<PathBuf>) -> Vec<PathBuf> {
    explicit
        .into_iter()
        .chain([
            "./config.toml".into(),
            "./feedhook.toml".into(),
            "/etc/feedhook.toml".into(),
        ])
        .collect()
}

pub fn load(search_paths: &[PathBuf]) -> Result<Config, ConfigError> {
    for path in search_paths {
        debug!("Trying to load {}", path.display());
        let mut contents = String::new();

        {
            let mut f = match File::open(path) {
                Ok(f) => f,

                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!(file = %path.display(), "File not found, skipping");
                    continue;
                }

                Err(source) => {
                    return Err(ConfigError::Read {
                        path: path.clone(),
                        source,
                    });
                }
            };

            f.read_to_string(&mut contents)
                .map_err(|source| ConfigError::Read {
                    path: path.clone(),
                    source,
                })?;
        }

        let mut cfg: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        cfg.path = path.clone();

        if let Some(parent) = path.parent() {
            cfg.resolve_relative_paths(parent);
        }

        info!("Loaded a config file `{}`", path.display());

        return Ok(cfg);
    }

    Err(ConfigError::NotFound {
        tried: search_paths.to_vec(),
    })
}

use std::fmt::{self, Display};
use std::fs;
use std::path::PathBuf;

use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{ConfigError, StorageError};

/// The instant up to which entries have already been processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Watermark(OffsetDateTime);

impl Watermark {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        OffsetDateTime::parse(value.trim(), &Rfc3339)
            .map(Self)
            .map_err(|source| ConfigError::Watermark {
                value: value.into(),
                source,
            })
    }

    /// Whether `instant` lies strictly after the watermark.
    pub fn is_before(&self, instant: OffsetDateTime) -> bool {
        instant > self.0
    }

    pub fn to_rfc3339(&self) -> Result<String, time::error::Format> {
        self.0.to_offset(UtcOffset::UTC).format(&Rfc3339)
    }
}

impl From<OffsetDateTime> for Watermark {
    fn from(instant: OffsetDateTime) -> Self {
        Self(instant)
    }
}

impl Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_rfc3339() {
            Ok(s) => s.fmt(f),
            Err(_) => self.0.fmt(f),
        }
    }
}

/// Where the watermark lives between runs.
pub trait WatermarkStore {
    fn load(&self) -> Result<Watermark, ConfigError>;

    fn save(&mut self, watermark: Watermark) -> Result<(), StorageError>;
}

const WATERMARK_KEY: &str = "date_since";

/// Keeps the watermark as the `date_since` key of the config file it was loaded from.
#[derive(Debug, Clone)]
pub struct ConfigFileStore {
    path: PathBuf,
    date_since: String,
}

impl ConfigFileStore {
    pub fn new(path: impl Into<PathBuf>, date_since: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            date_since: date_since.into(),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(&cfg.path, &cfg.date_since)
    }
}

impl WatermarkStore for ConfigFileStore {
    fn load(&self) -> Result<Watermark, ConfigError> {
        Watermark::parse(&self.date_since)
    }

    fn save(&mut self, watermark: Watermark) -> Result<(), StorageError> {
        let path = &self.path;
        let contents = fs::read_to_string(path).map_err(|source| StorageError::Read {
            path: path.clone(),
            source,
        })?;
        let mut table: toml::Table =
            toml::from_str(&contents).map_err(|source| StorageError::Parse {
                path: path.clone(),
                source,
            })?;

        let date_since = watermark.to_rfc3339()?;
        table.insert(WATERMARK_KEY.into(), date_since.clone().into());
        let contents = toml::to_string(&table)?;

        // write to a sibling first so an interrupted write never truncates the config.
        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);

        debug!(tmp = %tmp_path.display(), "Writing the updated config");
        fs::write(&tmp_path, contents)
            .and_then(|()| fs::rename(&tmp_path, path))
            .map_err(|source| StorageError::Write {
                path: path.clone(),
                source,
            })?;

        info!(%date_since, "Saved the watermark to `{}`", path.display());
        self.date_since = date_since;

        Ok(())
    }
}

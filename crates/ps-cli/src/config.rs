use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_FILTERS: &[&str] = &[
    "https://raw.githubusercontent.com/AdguardTeam/AdguardFilters/master/TrackParamFilter/sections/specific.txt",
    "https://raw.githubusercontent.com/AdguardTeam/AdguardFilters/master/TrackParamFilter/sections/general_url.txt",
];

/// Runtime configuration, read from a JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Filter list sources: `http(s)://` URLs or local paths.
    pub filters: Vec<String>,
    /// Where downloaded lists are written.
    pub cache_dir: PathBuf,
    /// Hours between filter updates in `watch` mode.
    pub update_period_hours: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            filters: DEFAULT_FILTERS.iter().map(|s| s.to_string()).collect(),
            cache_dir: PathBuf::from("filters-cache"),
            update_period_hours: 6,
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config '{}'", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid config '{}'", path.display()))
    }

    /// Resolve the effective config from an optional file plus `--filter` flags.
    ///
    /// Flags given without a file replace the default sources; with a file
    /// they are appended to its list.
    pub fn resolve(path: Option<&Path>, extra_filters: &[String]) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if !extra_filters.is_empty() => Self {
                filters: Vec::new(),
                ..Self::default()
            },
            None => Self::default(),
        };
        config.filters.extend(extra_filters.iter().cloned());
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.filters.is_empty() {
            bail!("No filter sources configured");
        }
        if self.update_period_hours == 0 {
            bail!("update_period_hours must be at least 1");
        }
        Ok(())
    }

    pub fn update_period(&self) -> Duration {
        Duration::from_secs(self.update_period_hours * 3600)
    }
}

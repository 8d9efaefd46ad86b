use anyhow::{Context, Result, bail};
use drive::{DEFAULT_PAGE_SIZE, RetryConfig};
use quota::Marker;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ui;

// ============================================================================
// File Schema
// ============================================================================

/// Settings read from `config.toml`. Every key is optional here; the ones a
/// run needs are checked when they are resolved against the CLI flags.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Total quota of an account, as a human size ("15GB")
    pub capacity: Option<String>,

    /// Name prefix selecting files for purge
    pub marker: Option<String>,

    /// Records per listing page
    pub page_size: Option<u32>,

    /// Detach retry policy
    #[serde(default)]
    pub retry: RetrySettings,

    /// Where the settings came from, for error messages
    #[serde(skip)]
    source: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrySettings {
    pub max_attempts: Option<u32>,
    pub base_delay_ms: Option<u64>,
    pub backoff_factor: Option<f64>,
    pub max_delay_ms: Option<u64>,
}

/// Default config location: ~/.config/quotashift/config.toml
pub fn default_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("quotashift").join("config.toml"))
}

impl Settings {
    /// Load settings from `path`, or from the default location.
    ///
    /// A missing file at the default location yields empty settings; a
    /// missing file that was asked for explicitly is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (config_path, explicit) = match path {
            Some(p) => (expand(p), true),
            None => (default_path()?, false),
        };

        if !config_path.exists() {
            if explicit {
                bail!("Config file not found: {}", config_path.display());
            }
            log::debug!("No config file at {}", config_path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Could not read config file: {}", config_path.display()))?;

        let mut settings = Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", config_path.display()))?;
        settings.source = Some(config_path);
        Ok(settings)
    }

    /// Parse settings from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid TOML format in quotashift config")
    }

    fn hint(&self, key: &str, flag: &str) -> String {
        match &self.source {
            Some(path) => format!("set `{key}` in {} or pass {flag}", path.display()),
            None => format!("pass {flag} or set `{key}` in the config file"),
        }
    }

    /// Account capacity in bytes; the flag wins over the file.
    pub fn capacity(&self, flag: Option<&str>) -> Result<u64> {
        let Some(raw) = flag.or(self.capacity.as_deref()) else {
            bail!("Missing capacity: {}", self.hint("capacity", "--capacity"));
        };

        let bytes = ui::parse_size(raw).map_err(|e| anyhow::anyhow!("Invalid capacity: {e}"))?;
        if bytes == 0 {
            bail!("Invalid capacity: must be greater than zero");
        }
        Ok(bytes)
    }

    /// Purge marker; the flag wins over the file.
    pub fn marker(&self, flag: Option<&str>) -> Result<Marker> {
        let Some(raw) = flag.or(self.marker.as_deref()) else {
            bail!("Missing marker: {}", self.hint("marker", "--marker"));
        };
        Ok(Marker::new(raw)?)
    }

    /// Listing page size; the flag wins over the file.
    pub fn page_size(&self, flag: Option<u32>) -> Result<u32> {
        let size = flag.or(self.page_size).unwrap_or(DEFAULT_PAGE_SIZE);
        if !(1..=DEFAULT_PAGE_SIZE).contains(&size) {
            bail!("Invalid page size {size}: must be between 1 and {DEFAULT_PAGE_SIZE}");
        }
        Ok(size)
    }

    /// Detach retry policy, falling back to the defaults key by key.
    pub fn retry(&self) -> Result<RetryConfig> {
        let defaults = RetryConfig::default();
        let r = &self.retry;

        let config = RetryConfig {
            max_attempts: r.max_attempts.unwrap_or(defaults.max_attempts),
            base_delay: r
                .base_delay_ms
                .map_or(defaults.base_delay, Duration::from_millis),
            backoff_factor: r.backoff_factor.unwrap_or(defaults.backoff_factor),
            max_delay: r
                .max_delay_ms
                .map_or(defaults.max_delay, Duration::from_millis),
        };

        if config.max_attempts == 0 {
            bail!("Invalid retry.max_attempts: must be at least 1");
        }
        if !config.backoff_factor.is_finite() || config.backoff_factor < 1.0 {
            bail!(
                "Invalid retry.backoff_factor {}: must be at least 1.0",
                config.backoff_factor
            );
        }
        Ok(config)
    }
}

fn expand(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&raw).as_ref())
}

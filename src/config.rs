// src/config.rs

//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Portal endpoint settings
    #[serde(default)]
    pub portal: PortalConfig,

    /// HTTP client behavior
    #[serde(default)]
    pub http: HttpConfig,

    /// Local cache behavior
    #[serde(default)]
    pub cache: CacheConfig,

    /// Directory crawl behavior
    #[serde(default)]
    pub crawl: CrawlConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.portal.base_url.trim().is_empty() {
            return Err(AppError::validation("portal.base_url is empty"));
        }
        if self.portal.school_id == 0 {
            return Err(AppError::validation("portal.school_id must be set"));
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.crawl.stage_delay_ms == 0 {
            return Err(AppError::validation("crawl.stage_delay_ms must be > 0"));
        }
        if self.cache.sweep_interval_hours == 0 {
            return Err(AppError::validation("cache.sweep_interval_hours must be > 0"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            portal: PortalConfig::default(),
            http: HttpConfig::default(),
            cache: CacheConfig::default(),
            crawl: CrawlConfig::default(),
        }
    }
}

/// Portal endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Portal origin, without the school path segment
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Numeric school id used in every portal path
    #[serde(default = "defaults::school_id")]
    pub school_id: u32,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            school_id: defaults::school_id(),
        }
    }
}

/// HTTP client behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header. The portal serves reduced markup to unknown
    /// agents, so this mimics a desktop browser.
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Local cache behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Minimum interval between expiry sweeps, in hours
    #[serde(default = "defaults::sweep_interval_hours")]
    pub sweep_interval_hours: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            sweep_interval_hours: defaults::sweep_interval_hours(),
        }
    }
}

/// Directory crawl behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Delay between crawl stages in milliseconds. Keeps the request
    /// rate below the portal's block threshold.
    #[serde(default = "defaults::stage_delay")]
    pub stage_delay_ms: u64,

    /// Days before a completed directory crawl is considered stale
    #[serde(default = "defaults::cooldown_days")]
    pub cooldown_days: u64,
}

impl CrawlConfig {
    pub fn stage_delay(&self) -> Duration {
        Duration::from_millis(self.stage_delay_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_days * 24 * 60 * 60)
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            stage_delay_ms: defaults::stage_delay(),
            cooldown_days: defaults::cooldown_days(),
        }
    }
}

mod defaults {
    pub fn base_url() -> String {
        "https://www.lectio.dk".into()
    }
    pub fn school_id() -> u32 {
        0
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
            .into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn sweep_interval_hours() -> u64 {
        12
    }
    pub fn stage_delay() -> u64 {
        4_000
    }
    pub fn cooldown_days() -> u64 {
        7
    }
}

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::feed::Feed;

pub const DEFAULT_BASE_URL: &str = "https://fakestoreapiserver.reactbd.org";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub start_feed: Option<Feed>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            start_feed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Default)]
pub struct FeedConfig {
    pub per_page: Option<u32>,
}

/// Per-feed overrides, `[feeds.cart]`, `[feeds.friends]`, ...
#[derive(Debug, Clone, Copy, Deserialize, Default)]
#[serde(default)]
pub struct FeedsConfig {
    pub cart: FeedConfig,
    pub favourites: FeedConfig,
    pub friends: FeedConfig,
    pub payments: FeedConfig,
    pub promotions: FeedConfig,
}

impl FeedsConfig {
    fn get(&self, feed: Feed) -> &FeedConfig {
        match feed {
            Feed::Cart => &self.cart,
            Feed::Favourites => &self.favourites,
            Feed::Friends => &self.friends,
            Feed::Payments => &self.payments,
            Feed::Promotions => &self.promotions,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub feeds: FeedsConfig,
}

pub fn config_path() -> Option<PathBuf> {
    let config_dir = dirs::config_dir()?;
    Some(config_dir.join("storefront").join("config.toml"))
}

impl Config {
    /// Load from `path`, or the default location. A missing or broken file
    /// falls back to defaults.
    pub fn load(path: Option<&Path>) -> Self {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match config_path() {
                Some(p) => p,
                None => return Config::default(),
            },
        };

        let Ok(content) = std::fs::read_to_string(&path) else {
            return Config::default();
        };

        match toml::from_str::<Config>(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("ignoring {}: {}", path.display(), e);
                Config::default()
            }
        }
    }

    pub fn per_page(&self, feed: Feed) -> u32 {
        self.feeds
            .get(feed)
            .per_page
            .filter(|n| *n > 0)
            .unwrap_or_else(|| feed.default_per_page())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.general.timeout_secs.max(1))
    }
}

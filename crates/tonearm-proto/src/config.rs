use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::platform;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub mpd: MpdConfig,
    #[serde(default)]
    pub lyrics: LyricsConfig,
    #[serde(default)]
    pub ui: UiConfig,
    /// Key overrides: action name → key name (`"f1"`, `"left"`, `"x"`, …).
    #[serde(default)]
    pub keys: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MpdConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Connect / reply timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Where lyrics come from and where they are cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LyricsConfig {
    #[serde(default = "default_lyrics_dir")]
    pub dir: PathBuf,
    /// Query the remote lyrics service when the cache misses.
    #[serde(default = "default_true")]
    pub remote: bool,
    #[serde(default = "default_lyrics_url")]
    pub url: String,
    /// Write remotely fetched lyrics into `dir`.
    #[serde(default = "default_true")]
    pub cache_fetched: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Show and edit song ratings (stored as `rating` stickers).
    #[serde(default = "default_true")]
    pub rate_songs: bool,
    /// Multiplexed wait timeout; doubles as the refresh tick.
    #[serde(default = "default_poll_ms")]
    pub poll_ms: u64,
}

impl Default for MpdConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for LyricsConfig {
    fn default() -> Self {
        Self {
            dir: default_lyrics_dir(),
            remote: true,
            url: default_lyrics_url(),
            cache_fetched: true,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            rate_songs: true,
            poll_ms: default_poll_ms(),
        }
    }
}

fn default_host() -> String {
    platform::DEFAULT_MPD_HOST.to_string()
}

fn default_port() -> u16 {
    platform::DEFAULT_MPD_PORT
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_lyrics_dir() -> PathBuf {
    platform::lyrics_dir()
}

fn default_lyrics_url() -> String {
    "https://lrclib.net".to_string()
}

fn default_poll_ms() -> u64 {
    200
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load the user config, then the system one; write defaults to the user
    /// path when neither exists.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            return Self::load_from(&config_path);
        }

        let system_path = platform::system_config_path();
        if system_path.exists() {
            return Self::load_from(&system_path);
        }

        let config = Self::default();
        config.save()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.lyrics.dir = platform::expand_home(&config.lyrics.dir);
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mpd: MpdConfig::default(),
            lyrics: LyricsConfig::default(),
            ui: UiConfig::default(),
            keys: BTreeMap::new(),
        }
    }
}

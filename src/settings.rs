use anyhow::{Context, Result};
use config::Config;
use serde::{Deserialize, Deserializer};
use tracing::warn;

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Runtime settings read from the environment (and `.env` when present).
///
/// Both API credentials are optional. Without them the extractors fall back to
/// page scraping.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub youtube_api_key: Option<String>,
    #[serde(default)]
    pub twitter_bearer_token: Option<String>,
    /// Keep the fetched page HTML in each result. Only `true` turns it on.
    #[serde(default, deserialize_with = "flag")]
    pub save_raw_html: bool,
    #[serde(default = "default_timeout")]
    pub http_timeout_secs: u64,
}

fn default_timeout() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

/// Reads a switch the way the environment spells it. Anything but `true`
/// (any case) is off; values that are not `false` either get a warning.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Ok(parse_flag(&raw))
}

fn parse_flag(raw: &str) -> bool {
    let value = raw.trim();
    if value.eq_ignore_ascii_case("true") {
        true
    } else {
        if !value.is_empty() && !value.eq_ignore_ascii_case("false") {
            warn!(value, "Unrecognised SAVE_RAW_HTML value, treating as false");
        }
        false
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            youtube_api_key: None,
            twitter_bearer_token: None,
            save_raw_html: false,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config = Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("Failed to read settings from environment")?;
        Self::from_config(config)
    }

    fn from_config(config: Config) -> Result<Self> {
        let settings: Settings = config
            .try_deserialize()
            .context("Invalid settings in environment")?;
        Ok(settings.normalized())
    }

    /// Blank credentials count as absent.
    fn normalized(mut self) -> Self {
        self.youtube_api_key = self.youtube_api_key.filter(|k| !k.trim().is_empty());
        self.twitter_bearer_token = self.twitter_bearer_token.filter(|k| !k.trim().is_empty());
        self
    }
}

pub mod aws;
pub mod error;
pub mod github;
pub mod instagram;
pub mod linkedin;
pub mod page;
pub mod x;
pub mod youtube;

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::fetch::{Fetch, FetchError};
use crate::platform::{self, Platform};
use crate::settings::Settings;
pub use error::{ApiError, ExtractionError};

/// Normalized metadata for one URL.
///
/// `platform` is always set; failed extractions carry `Platform::Error` and a
/// diagnostic in `content`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionResult {
    pub platform: Platform,
    pub url: String,
    pub title: String,
    pub author: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tweet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blog_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<serde_json::Value>,
    /// Platform the URL was classified as, kept on error results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempted_platform: Option<Platform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_html: Option<String>,
}

impl ExtractionResult {
    pub fn new(platform: Platform, url: &str) -> Self {
        Self {
            platform,
            url: url.to_string(),
            title: String::new(),
            author: String::new(),
            content: String::new(),
            content_type: None,
            video_id: None,
            tweet_id: None,
            repo_info: None,
            published_date: None,
            blog_category: None,
            author_name: None,
            created_at: None,
            published_at: None,
            tags: Vec::new(),
            category_id: None,
            statistics: None,
            metrics: None,
            attempted_platform: None,
            raw_html: None,
        }
    }

    fn unsupported(url: &str, host: &str) -> Self {
        Self {
            content: format!("Unsupported platform: {}", host),
            ..Self::new(Platform::Unknown, url)
        }
    }

    fn failed(url: &str, platform: Platform, err: &ExtractionError) -> Self {
        Self {
            content: err.to_string(),
            attempted_platform: Some(platform),
            ..Self::new(Platform::Error, url)
        }
    }

    pub fn is_error(&self) -> bool {
        self.platform == Platform::Error
    }
}

/// Extraction facade: classifies a URL, runs the matching platform extractor
/// and turns every failure into an error-tagged [`ExtractionResult`].
pub struct Extractor {
    fetcher: Arc<dyn Fetch>,
    settings: Settings,
}

impl Extractor {
    pub fn new(fetcher: Arc<dyn Fetch>, settings: Settings) -> Self {
        Self { fetcher, settings }
    }

    pub async fn extract(&self, url: &str) -> ExtractionResult {
        let url = url.trim();
        let platform = platform::classify(url);
        info!(url, %platform, "Processing URL");

        let outcome = match platform {
            Platform::Linkedin => linkedin::extract(self, url).await,
            Platform::X => x::extract(self, url).await,
            Platform::Instagram => instagram::extract(self, url).await,
            Platform::Youtube => youtube::extract(self, url).await,
            Platform::Aws => aws::extract(self, url).await,
            Platform::Github => github::extract(self, url).await,
            Platform::Unknown | Platform::Error => {
                let host = platform::host_of(url);
                warn!(url, host = %host, "Unsupported platform");
                return ExtractionResult::unsupported(url, &host);
            }
        };

        match outcome {
            Ok(result) => result,
            Err(e) => {
                error!(url, %platform, error = %e, "Extraction failed");
                ExtractionResult::failed(url, platform, &e)
            }
        }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.settings
    }

    pub(crate) fn fetcher(&self) -> &dyn Fetch {
        self.fetcher.as_ref()
    }

    pub(crate) async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        self.fetcher.page(url).await
    }

    /// The page source, when raw HTML capture is enabled.
    pub(crate) fn raw_html(&self, html: &str) -> Option<String> {
        self.settings.save_raw_html.then(|| html.to_string())
    }
}

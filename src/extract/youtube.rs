use serde::Deserialize;
use tracing::info;
use url::Url;

use super::page::{non_empty, Page};
use super::{ApiError, ExtractionError, ExtractionResult, Extractor};
use crate::platform::Platform;

const VIDEOS_API_URL: &str = "https://www.googleapis.com/youtube/v3/videos";

#[derive(Debug, Deserialize)]
struct VideoList {
    #[serde(default)]
    items: Vec<Video>,
}

#[derive(Debug, Deserialize)]
struct Video {
    snippet: Snippet,
    statistics: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: String,
    #[serde(default)]
    description: String,
    channel_title: String,
    published_at: String,
    #[serde(default)]
    tags: Vec<String>,
    category_id: String,
}

/// Community posts are scraped; videos go through the Data API when a key is
/// configured and are scraped from the watch page otherwise.
pub async fn extract(ex: &Extractor, url: &str) -> Result<ExtractionResult, ExtractionError> {
    info!("Extracting YouTube content");
    if url.contains("/post/") {
        extract_post(ex, url).await
    } else {
        extract_video(ex, url).await
    }
}

/// Video id from `youtu.be/<id>`, `/watch?v=<id>`, `/embed/<id>` or `/v/<id>`.
pub fn video_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    let segments: Vec<&str> = parsed.path_segments().map(|s| s.collect()).unwrap_or_default();

    match host.as_str() {
        "youtu.be" | "www.youtu.be" => segments.first().and_then(|id| non_empty(id)),
        "youtube.com" | "www.youtube.com" => match segments.as_slice() {
            ["watch"] => parsed
                .query_pairs()
                .find(|(k, _)| k == "v")
                .and_then(|(_, v)| non_empty(&v)),
            ["embed", id, ..] | ["v", id, ..] => non_empty(id),
            _ => None,
        },
        _ => None,
    }
}

async fn extract_post(ex: &Extractor, url: &str) -> Result<ExtractionResult, ExtractionError> {
    info!("Extracting YouTube community post");
    let html = ex.fetch_page(url).await?;
    let page = scrape(&html);
    Ok(ExtractionResult {
        title: page.title.unwrap_or_else(|| "YouTube Community Post".into()),
        author: page.channel.unwrap_or_default(),
        content: page.description.unwrap_or_default(),
        content_type: Some("community_post".into()),
        raw_html: ex.raw_html(&html),
        ..ExtractionResult::new(Platform::Youtube, url)
    })
}

async fn extract_video(ex: &Extractor, url: &str) -> Result<ExtractionResult, ExtractionError> {
    info!("Extracting YouTube video");
    let id = video_id(url).ok_or_else(|| ExtractionError::MissingVideoId(url.to_string()))?;

    if let Some(key) = ex.settings().youtube_api_key.as_deref() {
        return Ok(lookup(ex, &id, key).await?);
    }

    let watch_url = watch_url(&id);
    let html = ex.fetch_page(&watch_url).await?;
    let page = scrape(&html);
    Ok(ExtractionResult {
        title: page.title.unwrap_or_else(|| "YouTube Video".into()),
        author: page.channel.unwrap_or_default(),
        content: page.description.unwrap_or_default(),
        content_type: Some("video".into()),
        video_id: Some(id),
        raw_html: ex.raw_html(&html),
        ..ExtractionResult::new(Platform::Youtube, url)
    })
}

async fn lookup(ex: &Extractor, id: &str, key: &str) -> Result<ExtractionResult, ApiError> {
    info!(video_id = id, "Using YouTube API");
    let query = [
        ("part", "snippet,contentDetails,statistics"),
        ("id", id),
        ("key", key),
    ];
    let value = ex.fetcher().json(VIDEOS_API_URL, &query, None).await?;
    from_video_list(id, serde_json::from_value(value)?)
}

fn from_video_list(id: &str, list: VideoList) -> Result<ExtractionResult, ApiError> {
    let video = list.items.into_iter().next().ok_or(ApiError::NotFound("video"))?;
    let snippet = video.snippet;
    Ok(ExtractionResult {
        title: snippet.title,
        author: snippet.channel_title,
        content: snippet.description,
        content_type: Some("video".into()),
        video_id: Some(id.to_string()),
        published_at: Some(snippet.published_at),
        tags: snippet.tags,
        category_id: Some(snippet.category_id),
        statistics: video.statistics,
        ..ExtractionResult::new(Platform::Youtube, &watch_url(id))
    })
}

fn watch_url(id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", id)
}

struct Scraped {
    title: Option<String>,
    description: Option<String>,
    channel: Option<String>,
}

fn scrape(html: &str) -> Scraped {
    let page = Page::parse(html);
    Scraped {
        title: page.meta_property("og:title"),
        description: page.meta_property("og:description"),
        channel: page.link_itemprop("name"),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::extract::testing::{extractor, extractor_with};
    use crate::fetch::fixtures::FixtureFetcher;
    use crate::settings::Settings;

    #[test]
    fn video_id_shapes() {
        let cases = [
            ("https://youtu.be/abc123", Some("abc123")),
            ("https://youtu.be/abc123?t=42", Some("abc123")),
            ("https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=PL1", Some("dQw4w9WgXcQ")),
            ("https://youtube.com/embed/xyz789", Some("xyz789")),
            ("https://www.youtube.com/v/old456", Some("old456")),
            ("https://www.youtube.com/watch", None),
            ("https://www.youtube.com/@rustlang", None),
            ("https://youtu.be/", None),
        ];
        for (url, expected) in cases {
            assert_eq!(video_id(url).as_deref(), expected, "{url}");
        }
    }

    #[tokio::test]
    async fn short_link_scrapes_watch_page_without_key() {
        let html = std::fs::read_to_string("tests/fixtures/youtube_watch.html").unwrap();
        let fetcher =
            FixtureFetcher::new().with_page("https://www.youtube.com/watch?v=abc123", &html);
        let (ex, fetcher) = extractor(fetcher);

        let r = ex.extract("https://youtu.be/abc123").await;
        assert_eq!(r.platform, Platform::Youtube);
        assert_eq!(r.content_type.as_deref(), Some("video"));
        assert_eq!(r.video_id.as_deref(), Some("abc123"));
        assert_eq!(r.title, "Building a Web Server in Rust");
        assert_eq!(r.author, "Crab Academy");
        assert_eq!(r.url, "https://youtu.be/abc123");
        assert_eq!(fetcher.called(), vec!["https://www.youtube.com/watch?v=abc123".to_string()]);
    }

    #[tokio::test]
    async fn data_api_with_key() {
        let payload = json!({
            "items": [{
                "id": "abc123",
                "snippet": {
                    "title": "API Title",
                    "description": "API description",
                    "channelTitle": "Crab Academy",
                    "publishedAt": "2024-03-01T00:00:00Z",
                    "tags": ["rust", "web"],
                    "categoryId": "28"
                },
                "statistics": { "viewCount": "1000" }
            }]
        });
        let settings = Settings {
            youtube_api_key: Some("key".into()),
            ..Settings::default()
        };
        let fetcher = FixtureFetcher::new().with_json(VIDEOS_API_URL, payload);
        let (ex, _) = extractor_with(fetcher, settings);

        let r = ex.extract("https://youtu.be/abc123").await;
        assert_eq!(r.title, "API Title");
        assert_eq!(r.author, "Crab Academy");
        assert_eq!(r.tags, vec!["rust".to_string(), "web".to_string()]);
        assert_eq!(r.category_id.as_deref(), Some("28"));
        assert_eq!(r.published_at.as_deref(), Some("2024-03-01T00:00:00Z"));
        assert_eq!(r.url, "https://www.youtube.com/watch?v=abc123");
    }

    #[tokio::test]
    async fn empty_api_result_is_an_error() {
        let settings = Settings {
            youtube_api_key: Some("key".into()),
            ..Settings::default()
        };
        let fetcher = FixtureFetcher::new().with_json(VIDEOS_API_URL, json!({ "items": [] }));
        let (ex, _) = extractor_with(fetcher, settings);

        let r = ex.extract("https://www.youtube.com/watch?v=gone").await;
        assert!(r.is_error());
        assert_eq!(r.content, "video not found");
    }

    #[tokio::test]
    async fn missing_video_id_is_an_error() {
        let (ex, fetcher) = extractor(FixtureFetcher::new());
        let r = ex.extract("https://www.youtube.com/@rustlang").await;
        assert!(r.is_error());
        assert!(r.content.contains("video ID"), "{}", r.content);
        assert!(fetcher.called().is_empty());
    }

    #[tokio::test]
    async fn community_post() {
        let url = "https://www.youtube.com/post/UgkxAbC";
        let html = r#"<html><head>
            <meta property="og:description" content="New video on Friday!">
            <link itemprop="name" content="Crab Academy">
            </head></html>"#;
        let (ex, _) = extractor(FixtureFetcher::new().with_page(url, html));
        let r = ex.extract(url).await;
        assert_eq!(r.content_type.as_deref(), Some("community_post"));
        assert_eq!(r.title, "YouTube Community Post");
        assert_eq!(r.author, "Crab Academy");
        assert_eq!(r.content, "New video on Friday!");
    }
}

use serde::Deserialize;
use tracing::{info, warn};
use url::Url;

use super::page::{non_empty, Page};
use super::{ApiError, ExtractionError, ExtractionResult, Extractor};
use crate::platform::Platform;

const TWEET_LOOKUP_URL: &str = "https://api.twitter.com/2/tweets";
const UNAVAILABLE: &str = "Content unavailable (login required)";
const ON_X: &str = " on X:";

#[derive(Debug, Deserialize)]
struct TweetLookup {
    data: Option<Tweet>,
    #[serde(default)]
    includes: Includes,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    #[serde(default)]
    text: String,
    created_at: Option<String>,
    public_metrics: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct Includes {
    #[serde(default)]
    users: Vec<User>,
}

#[derive(Debug, Default, Deserialize)]
struct User {
    #[serde(default)]
    username: String,
    #[serde(default)]
    name: String,
}

/// Authenticated lookup when a bearer token is configured, page scraping
/// otherwise or when the lookup fails for any reason.
pub async fn extract(ex: &Extractor, url: &str) -> Result<ExtractionResult, ExtractionError> {
    info!("Extracting X (Twitter) content");

    if let Some(token) = ex.settings().twitter_bearer_token.as_deref() {
        match lookup(ex, url, token).await {
            Ok(result) => return Ok(result),
            Err(e) => warn!(error = %e, "X API extraction failed, falling back to scraping"),
        }
    }

    let html = ex.fetch_page(url).await?;
    Ok(ExtractionResult {
        raw_html: ex.raw_html(&html),
        ..scrape(url, &html)
    })
}

/// Path segment following `status`: `https://x.com/user/status/42` → `42`.
pub fn tweet_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let mut segments = parsed.path_segments()?;
    segments.find(|s| *s == "status")?;
    segments.next().and_then(non_empty)
}

async fn lookup(ex: &Extractor, url: &str, token: &str) -> Result<ExtractionResult, ApiError> {
    info!("Using X API for tweet extraction");
    let id = tweet_id(url).ok_or(ApiError::MissingId("tweet ID"))?;
    let endpoint = format!("{}/{}", TWEET_LOOKUP_URL, id);
    let query = [
        ("tweet.fields", "author_id,created_at,text,public_metrics"),
        ("expansions", "author_id"),
        ("user.fields", "username,name"),
    ];
    let value = ex.fetcher().json(&endpoint, &query, Some(token)).await?;
    from_lookup(url, id, serde_json::from_value(value)?)
}

fn from_lookup(url: &str, id: String, lookup: TweetLookup) -> Result<ExtractionResult, ApiError> {
    let tweet = lookup.data.ok_or(ApiError::NotFound("tweet"))?;
    let user = lookup.includes.users.into_iter().next().unwrap_or_default();
    let display = if user.name.is_empty() { "User" } else { user.name.as_str() };

    Ok(ExtractionResult {
        title: format!("{} on X", display),
        author: user.username.clone(),
        content: tweet.text,
        tweet_id: Some(id),
        author_name: Some(user.name),
        created_at: tweet.created_at,
        metrics: tweet.public_metrics,
        ..ExtractionResult::new(Platform::X, url)
    })
}

fn scrape(url: &str, html: &str) -> ExtractionResult {
    let page = Page::parse(html);

    let title = page
        .meta_name("twitter:title")
        .or_else(|| page.meta_property("og:title"));
    let content = page
        .meta_name("twitter:description")
        .or_else(|| page.meta_property("og:description"))
        .or_else(|| page.meta_name("description"));
    let author = page
        .meta_name("twitter:creator")
        .and_then(|c| non_empty(c.trim_start_matches('@')))
        .or_else(|| title.as_deref().and_then(author_from_title))
        .or_else(|| handle_from_url(url));
    let content = content.or_else(|| {
        title
            .as_deref()
            .and_then(|t| content_from_title(t, author.as_deref()))
    });

    ExtractionResult {
        title: title.unwrap_or_else(|| "X Post".into()),
        author: author.unwrap_or_default(),
        content: content.unwrap_or_else(|| UNAVAILABLE.into()),
        ..ExtractionResult::new(Platform::X, url)
    }
}

/// "Author on X: text" or "Author: text" with a short, bracket-free author.
fn author_from_title(title: &str) -> Option<String> {
    if let Some((who, _)) = title.split_once(ON_X) {
        return non_empty(who);
    }
    let (prefix, _) = title.split_once(':')?;
    let prefix = prefix.trim();
    if prefix.chars().count() < 30 && !prefix.contains(['(', ')', '[', ']']) {
        non_empty(prefix)
    } else {
        None
    }
}

/// Handle preceding `/status/` in the URL path.
fn handle_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segments: Vec<&str> = parsed.path_segments()?.collect();
    match segments.as_slice() {
        [handle, "status", ..] => non_empty(handle),
        _ => None,
    }
}

/// Long titles usually embed the tweet text.
fn content_from_title(title: &str, author: Option<&str>) -> Option<String> {
    if title.chars().count() <= 30 {
        return None;
    }
    if let Some((_, text)) = title.split_once(ON_X) {
        return non_empty(text);
    }
    let author = author.filter(|a| !a.is_empty())?;
    let rest = title.strip_prefix(author)?;
    non_empty(rest.trim_start().trim_start_matches(':'))
}

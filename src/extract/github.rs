use std::sync::LazyLock;

use regex::Regex;
use tracing::info;
use url::Url;

use super::page::{non_empty, truncate_chars, Page};
use super::{ExtractionError, ExtractionResult, Extractor};
use crate::platform::Platform;

const README_EXCERPT_CHARS: usize = 500;

static MARKDOWN_CLASS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"markdown").unwrap());

/// What the URL points at, derived from its host and path alone.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Target {
    content_type: &'static str,
    author: Option<String>,
    repo_info: Option<String>,
}

pub async fn extract(ex: &Extractor, url: &str) -> Result<ExtractionResult, ExtractionError> {
    info!("Extracting GitHub content");
    let target = target(url);
    let html = ex.fetch_page(url).await?;
    Ok(ExtractionResult {
        raw_html: ex.raw_html(&html),
        ..scrape(url, &html, target)
    })
}

fn target(url: &str) -> Target {
    let parsed = Url::parse(url).ok();
    let host = parsed
        .as_ref()
        .and_then(|u| u.host_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    if host.ends_with("github.io") {
        // <user>.github.io
        let author = host
            .strip_suffix("github.io")
            .map(|h| h.trim_end_matches('.'))
            .and_then(non_empty);
        return Target { content_type: "github_pages", author, repo_info: None };
    }

    let segments: Vec<&str> = parsed
        .as_ref()
        .and_then(|u| u.path_segments())
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    match segments.as_slice() {
        [owner, repo, rest @ ..] => {
            let content_type = match rest.first() {
                None => "github_repo",
                Some(&"issues") => "github_issue",
                Some(&"pull") => "github_pr",
                Some(&"discussions") => "github_discussion",
                Some(_) => "github",
            };
            Target {
                content_type,
                author: Some(owner.to_string()),
                repo_info: Some(format!("{}/{}", owner, repo)),
            }
        }
        _ => Target { content_type: "github", author: None, repo_info: None },
    }
}

fn scrape(url: &str, html: &str, target: Target) -> ExtractionResult {
    let page = Page::parse(html);

    let title = page
        .meta_property("og:title")
        .or_else(|| page.first_text("title"));
    let content = page
        .meta_property("og:description")
        .or_else(|| page.meta_name("description"))
        .or_else(|| {
            page.class_first_paragraph("article", &MARKDOWN_CLASS)
                .map(|p| truncate_chars(&p, README_EXCERPT_CHARS))
        });

    ExtractionResult {
        title: title.unwrap_or_else(|| "GitHub Content".into()),
        author: target.author.unwrap_or_default(),
        content: content.unwrap_or_default(),
        content_type: Some(target.content_type.to_string()),
        repo_info: target.repo_info,
        ..ExtractionResult::new(Platform::Github, url)
    }
}

use std::sync::LazyLock;

use regex::Regex;
use tracing::info;

use super::page::Page;
use super::{ExtractionError, ExtractionResult, Extractor};
use crate::platform::Platform;

static POST_BODY_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"feed-shared-update-v2__description").unwrap());

pub async fn extract(ex: &Extractor, url: &str) -> Result<ExtractionResult, ExtractionError> {
    info!("Extracting LinkedIn content");
    let html = ex.fetch_page(url).await?;
    Ok(ExtractionResult {
        raw_html: ex.raw_html(&html),
        ..scrape(url, &html)
    })
}

fn scrape(url: &str, html: &str) -> ExtractionResult {
    let page = Page::parse(html);

    let title = page.meta_property("og:title");
    let content = page
        .meta_property("og:description")
        .or_else(|| page.class_text("div", &POST_BODY_CLASS, "\n"));
    let author = page.meta_name("author");

    ExtractionResult {
        title: title.unwrap_or_else(|| "LinkedIn Post".into()),
        author: author.unwrap_or_default(),
        content: content.unwrap_or_default(),
        ..ExtractionResult::new(Platform::Linkedin, url)
    }
}

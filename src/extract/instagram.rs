use tracing::info;

use super::page::{non_empty, Page};
use super::{ExtractionError, ExtractionResult, Extractor};
use crate::platform::Platform;

const AUTHOR_PHRASE: &str = "on Instagram:";

pub async fn extract(ex: &Extractor, url: &str) -> Result<ExtractionResult, ExtractionError> {
    info!("Extracting Instagram content");
    let html = ex.fetch_page(url).await?;
    Ok(ExtractionResult {
        raw_html: ex.raw_html(&html),
        ..scrape(url, &html)
    })
}

fn scrape(url: &str, html: &str) -> ExtractionResult {
    let page = Page::parse(html);

    let title = page.meta_property("og:title");
    let content = page.meta_property("og:description");
    // Titles read "<author> on Instagram: <caption>"
    let author = title
        .as_deref()
        .and_then(|t| t.split_once(AUTHOR_PHRASE))
        .and_then(|(who, _)| non_empty(who));

    ExtractionResult {
        title: title.unwrap_or_else(|| "Instagram Post".into()),
        author: author.unwrap_or_default(),
        content: content.unwrap_or_default(),
        ..ExtractionResult::new(Platform::Instagram, url)
    }
}

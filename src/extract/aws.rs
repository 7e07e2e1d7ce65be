use std::sync::LazyLock;

use regex::Regex;
use tracing::info;

use super::page::{non_empty, Page};
use super::{ExtractionError, ExtractionResult, Extractor};
use crate::platform::Platform;

static AUTHOR_CLASS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"author").unwrap());

pub async fn extract(ex: &Extractor, url: &str) -> Result<ExtractionResult, ExtractionError> {
    info!("Extracting AWS blog content");
    let html = ex.fetch_page(url).await?;
    Ok(ExtractionResult {
        raw_html: ex.raw_html(&html),
        ..scrape(url, &html)
    })
}

fn scrape(url: &str, html: &str) -> ExtractionResult {
    let page = Page::parse(html);

    let title = page
        .meta_property("og:title")
        .or_else(|| page.first_text("h1"));
    let content = page
        .meta_property("og:description")
        .or_else(|| page.meta_name("description"));
    let author = page
        .meta_name("author")
        .or_else(|| page.class_text("a", &AUTHOR_CLASS, " "))
        .or_else(|| page.class_text("span", &AUTHOR_CLASS, " "));
    let published_date = page
        .meta_property("article:published_time")
        .or_else(|| page.meta_name("publish-date"))
        .or_else(|| page.first_attr("time", "datetime"))
        .or_else(|| page.first_text("time"));

    ExtractionResult {
        title: title.unwrap_or_else(|| "AWS Blog Post".into()),
        author: author.unwrap_or_default(),
        content: content.unwrap_or_default(),
        published_date,
        blog_category: blog_category(url),
        ..ExtractionResult::new(Platform::Aws, url)
    }
}

/// `https://aws.amazon.com/blogs/<category>/...` → `<category>`.
fn blog_category(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("/blogs/")?;
    rest.split(['/', '?', '#']).next().and_then(non_empty)
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://aws.amazon.com/blogs/compute/running-rust-on-lambda/";

    #[test]
    fn full_blog_page() {
        let html = std::fs::read_to_string("tests/fixtures/aws_blog.html").unwrap();
        let r = scrape(URL, &html);
        assert_eq!(r.title, "Running Rust on AWS Lambda");
        assert_eq!(r.author, "Pat Builder");
        assert_eq!(r.content, "How to deploy Rust functions with cargo-lambda.");
        assert_eq!(r.published_date.as_deref(), Some("2024-02-14T08:00:00-08:00"));
        assert_eq!(r.blog_category.as_deref(), Some("compute"));
    }

    #[test]
    fn structural_fallbacks() {
        let html = r#"<html><body>
            <h1>Heading Title</h1>
            <footer><span class="blog-author">Sam Writer</span></footer>
            <time datetime="2023-11-30">30 NOV 2023</time>
            </body></html>"#;
        let r = scrape(URL, html);
        assert_eq!(r.title, "Heading Title");
        assert_eq!(r.author, "Sam Writer");
        assert_eq!(r.content, "");
        assert_eq!(r.published_date.as_deref(), Some("2023-11-30"));
    }

    #[test]
    fn time_text_when_no_datetime_attribute() {
        let r = scrape(URL, "<html><body><time> 30 NOV 2023 </time></body></html>");
        assert_eq!(r.published_date.as_deref(), Some("30 NOV 2023"));
        assert_eq!(r.title, "AWS Blog Post");
    }

    #[test]
    fn publish_date_meta_beats_time_element() {
        let html = r#"<html><head><meta name="publish-date" content="2022-01-01"></head>
            <body><time datetime="2020-01-01"></time></body></html>"#;
        assert_eq!(scrape(URL, html).published_date.as_deref(), Some("2022-01-01"));
    }

    #[test]
    fn category_segment() {
        assert_eq!(blog_category(URL).as_deref(), Some("compute"));
        assert_eq!(
            blog_category("https://aws.amazon.com/blogs/machine-learning?x=1").as_deref(),
            Some("machine-learning")
        );
        assert_eq!(blog_category("https://aws.amazon.com/blogs/"), None);
    }
}

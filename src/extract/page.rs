use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

static META: LazyLock<Selector> = LazyLock::new(|| Selector::parse("meta").unwrap());
static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("link").unwrap());
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").unwrap());

/// Parsed HTML page with the lookups the extractors' fallback ladders need.
pub struct Page {
    doc: Html,
}

impl Page {
    pub fn parse(html: &str) -> Self {
        Self { doc: Html::parse_document(html) }
    }

    /// `<meta property="...">` content, e.g. OpenGraph tags.
    pub fn meta_property(&self, property: &str) -> Option<String> {
        self.meta_by("property", property)
    }

    /// `<meta name="...">` content, e.g. Twitter Card or `description`.
    pub fn meta_name(&self, name: &str) -> Option<String> {
        self.meta_by("name", name)
    }

    fn meta_by(&self, attr: &str, key: &str) -> Option<String> {
        self.doc
            .select(&META)
            .find(|el| el.value().attr(attr) == Some(key))
            .and_then(|el| el.value().attr("content"))
            .and_then(non_empty)
    }

    /// `content` attribute of the first `<link itemprop="...">`.
    pub fn link_itemprop(&self, itemprop: &str) -> Option<String> {
        self.doc
            .select(&LINK)
            .find(|el| el.value().attr("itemprop") == Some(itemprop))
            .and_then(|el| el.value().attr("content"))
            .and_then(non_empty)
    }

    /// Stripped text of the first element matching `css`.
    pub fn first_text(&self, css: &str) -> Option<String> {
        let sel = Selector::parse(css).ok()?;
        self.doc.select(&sel).next().and_then(|el| text_of(el, " "))
    }

    /// Value of `attr` on the first element matching `css`.
    pub fn first_attr(&self, css: &str, attr: &str) -> Option<String> {
        let sel = Selector::parse(css).ok()?;
        self.doc
            .select(&sel)
            .next()
            .and_then(|el| el.value().attr(attr))
            .and_then(non_empty)
    }

    /// First `tag` element carrying a class that matches `pattern`.
    pub fn by_class(&self, tag: &str, pattern: &Regex) -> Option<ElementRef<'_>> {
        let sel = Selector::parse(tag).ok()?;
        self.doc
            .select(&sel)
            .find(|el| el.value().classes().any(|c| pattern.is_match(c)))
    }

    /// Stripped text of the first `tag` whose class matches `pattern`, text
    /// nodes joined by `sep`.
    pub fn class_text(&self, tag: &str, pattern: &Regex, sep: &str) -> Option<String> {
        self.by_class(tag, pattern).and_then(|el| text_of(el, sep))
    }

    /// First paragraph inside the first `tag` whose class matches `pattern`.
    pub fn class_first_paragraph(&self, tag: &str, pattern: &Regex) -> Option<String> {
        self.by_class(tag, pattern)?
            .select(&PARAGRAPH)
            .next()
            .and_then(|p| text_of(p, " "))
    }
}

/// Text nodes of `el`, each trimmed, blanks dropped, joined by `sep`.
pub fn text_of(el: ElementRef<'_>, sep: &str) -> Option<String> {
    let parts: Vec<&str> = el.text().map(str::trim).filter(|t| !t.is_empty()).collect();
    non_empty(&parts.join(sep))
}

pub fn non_empty(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

/// Truncate to at most `max` characters.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

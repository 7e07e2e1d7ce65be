use std::fmt;

use url::Url;

/// Source platform of a URL. `Unknown` is what the classifier returns for
/// anything it does not recognise; `Error` only ever tags failed extractions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, clap::ValueEnum)]
pub enum Platform {
    Linkedin,
    X,
    Instagram,
    Youtube,
    Aws,
    Github,
    #[value(skip)]
    Unknown,
    #[value(skip)]
    Error,
}

impl Platform {
    /// Platforms that own an archive table.
    pub const ARCHIVED: [Platform; 6] = [
        Platform::Linkedin,
        Platform::X,
        Platform::Instagram,
        Platform::Youtube,
        Platform::Aws,
        Platform::Github,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Linkedin => "linkedin",
            Platform::X => "x",
            Platform::Instagram => "instagram",
            Platform::Youtube => "youtube",
            Platform::Aws => "aws",
            Platform::Github => "github",
            Platform::Unknown => "unknown",
            Platform::Error => "error",
        }
    }

    pub fn is_archived(self) -> bool {
        Self::ARCHIVED.contains(&self)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for Platform {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Lowercased host with a leading `www.` removed. Empty when the URL does not parse.
pub fn host_of(url: &str) -> String {
    Url::parse(url.trim())
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
        .map(|h| h.strip_prefix("www.").map(str::to_string).unwrap_or(h))
        .unwrap_or_default()
}

/// Map a URL to its platform. First matching rule wins; never fails.
pub fn classify(url: &str) -> Platform {
    let host = host_of(url);
    match host.as_str() {
        "" => Platform::Unknown,
        h if h.contains("linkedin.com") => Platform::Linkedin,
        h if h.contains("x.com") || h.contains("twitter.com") => Platform::X,
        h if h.contains("instagram.com") => Platform::Instagram,
        h if h.contains("youtube.com") || h.contains("youtu.be") => Platform::Youtube,
        h if h.contains("aws.amazon.com") && url.contains("/blogs/") => Platform::Aws,
        h if h.contains("github.com") || h.contains("github.io") => Platform::Github,
        _ => Platform::Unknown,
    }
}

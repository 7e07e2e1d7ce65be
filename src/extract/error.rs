use crate::fetch::FetchError;

/// Failure of an authenticated API lookup (X tweet lookup, YouTube Data API).
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("malformed API response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("could not extract {0} from URL")]
    MissingId(&'static str),
}

/// Failure of a platform extractor. Only ever surfaces as an error-tagged
/// result from [`super::Extractor::extract`].
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("could not extract YouTube video ID from {0}")]
    MissingVideoId(String),
}

use thiserror::Error;

/// Failures below the HTTP status level. A response with any status code,
/// including 4xx/5xx, is not a `ClientError`.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build http client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("{method} {url} failed: {source}")]
    Transport {
        method: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}

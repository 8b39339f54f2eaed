pub type Result<T> = std::result::Result<T, Error>;

/// Errors building a client. Call failures are reported as `custbench_core::ClassifiedError`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("API key must not be empty")]
    EmptyApiKey,

    #[error("invalid base url `{0}`: {1}")]
    InvalidBaseUrl(String, url::ParseError),

    #[error("base url must use http or https: `{0}`")]
    UnsupportedScheme(String),
}

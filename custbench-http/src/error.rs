use std::time::Duration;

use hyper_util::client::legacy;

pub type Result<T> = std::result::Result<T, Error>;

/// The point at which an HTTP exchange broke down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum FailureStage {
    Target,
    Build,
    Connect,
    Send,
    Timeout,
    Body,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unusable url {url}: {reason}")]
    InvalidTarget { url: String, reason: &'static str },

    #[error("cannot build request: {0}")]
    Build(#[from] http::Error),

    #[error("connect failed: {0}")]
    Connect(#[source] legacy::Error),

    #[error("request failed: {0}")]
    Send(#[source] legacy::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to read response body: {0}")]
    Body(#[from] hyper::Error),
}

impl Error {
    pub(crate) fn invalid_target(url: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidTarget {
            url: url.into(),
            reason,
        }
    }

    #[must_use]
    pub fn stage(&self) -> FailureStage {
        match self {
            Self::InvalidTarget { .. } => FailureStage::Target,
            Self::Build(_) => FailureStage::Build,
            Self::Connect(_) => FailureStage::Connect,
            Self::Send(_) => FailureStage::Send,
            Self::Timeout(_) => FailureStage::Timeout,
            Self::Body(_) => FailureStage::Body,
        }
    }
}

impl From<legacy::Error> for Error {
    fn from(err: legacy::Error) -> Self {
        if err.is_connect() {
            Self::Connect(err)
        } else {
            Self::Send(err)
        }
    }
}

use thiserror::Error;

use crate::traits::FetchError;

/// Errors from the OTruyen API client.
#[derive(Debug, Error)]
pub enum OTruyenError {
    #[error("fetch failed for {resource}: {source}")]
    Fetch {
        resource: String,
        source: reqwest::Error,
    },

    #[error("fetch failed for {resource} (status {status}): {message}")]
    Api {
        resource: String,
        status: u16,
        message: String,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("{0} is not offered by OTruyen")]
    Unsupported(&'static str),
}

impl FetchError for OTruyenError {
    fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

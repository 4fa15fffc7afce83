//! Screen controllers: each one runs a fetch sequence against a provider,
//! normalizes the payloads and keeps the result as view state.

pub mod catalog;
pub mod detail;
pub mod reader;

use hondana_api::normalize::{CoverIndex, NormalizeError};
use hondana_api::{FetchError, MangaProvider};

pub use catalog::CatalogScreen;
pub use detail::DetailScreen;
pub use reader::{ChapterLink, ChapterNav, ReaderScreen, ReaderView};

/// What a screen currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Loading,
    Ready(T),
    NotFound,
    Failed(String),
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        Self::Loading
    }
}

impl<T> ViewState<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Collapse a failed primary fetch into `NotFound` or `Failed`.
    fn from_fetch_error<E: FetchError>(err: &E) -> Self {
        if err.is_not_found() {
            Self::NotFound
        } else {
            Self::Failed(err.to_string())
        }
    }

    fn from_normalize_error(err: &NormalizeError) -> Self {
        match err {
            NormalizeError::Missing => Self::NotFound,
            NormalizeError::Unrecognized(_) => Self::Failed(err.to_string()),
        }
    }
}

/// Resolve cover-art ids through the provider. A failed lookup leaves the
/// index empty so the affected covers render as `""`.
async fn lookup_covers<P: MangaProvider>(provider: &P, ids: &[String]) -> CoverIndex {
    if ids.is_empty() {
        return CoverIndex::default();
    }
    match provider.fetch_covers(ids).await {
        Ok(doc) => CoverIndex::from_document(&doc),
        Err(e) => {
            tracing::warn!(provider = provider.name(), error = %e, "cover lookup failed");
            CoverIndex::default()
        }
    }
}

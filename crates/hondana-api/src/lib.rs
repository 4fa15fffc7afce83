//! Upstream manga providers and the normalizer that maps their raw JSON into
//! one canonical model.

pub mod de;
pub mod mangadex;
pub mod models;
pub mod normalize;
pub mod otruyen;
pub mod provider;
pub mod traits;

pub use provider::{AnyProvider, ProviderError, ProviderKind};
pub use traits::{CatalogParams, FetchError, MangaProvider, RawDocument};

const USER_AGENT: &str = concat!("hondana/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client setup for every provider.
pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_default()
}

//! Runtime provider selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mangadex::{MangaDexClient, MangaDexError};
use crate::otruyen::{OTruyenClient, OTruyenError};
use crate::traits::{CatalogParams, FetchError, MangaProvider, RawDocument};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    MangaDex(#[from] MangaDexError),

    #[error(transparent)]
    OTruyen(#[from] OTruyenError),
}

impl FetchError for ProviderError {
    fn is_not_found(&self) -> bool {
        match self {
            Self::MangaDex(e) => e.is_not_found(),
            Self::OTruyen(e) => e.is_not_found(),
        }
    }
}

/// Which upstream API to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    MangaDex,
    OTruyen,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MangaDex => "mangadex",
            Self::OTruyen => "otruyen",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mangadex" => Ok(Self::MangaDex),
            "otruyen" => Ok(Self::OTruyen),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

/// One of the supported providers, chosen from configuration.
pub enum AnyProvider {
    MangaDex(MangaDexClient),
    OTruyen(OTruyenClient),
}

impl AnyProvider {
    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::MangaDex(_) => ProviderKind::MangaDex,
            Self::OTruyen(_) => ProviderKind::OTruyen,
        }
    }
}

impl From<MangaDexClient> for AnyProvider {
    fn from(client: MangaDexClient) -> Self {
        Self::MangaDex(client)
    }
}

impl From<OTruyenClient> for AnyProvider {
    fn from(client: OTruyenClient) -> Self {
        Self::OTruyen(client)
    }
}

impl MangaProvider for AnyProvider {
    type Error = ProviderError;

    fn name(&self) -> &'static str {
        match self {
            Self::MangaDex(c) => c.name(),
            Self::OTruyen(c) => c.name(),
        }
    }

    fn cdn_base(&self) -> &str {
        match self {
            Self::MangaDex(c) => c.cdn_base(),
            Self::OTruyen(c) => c.cdn_base(),
        }
    }

    async fn fetch_catalog(&self, params: &CatalogParams) -> Result<RawDocument, ProviderError> {
        Ok(match self {
            Self::MangaDex(c) => c.fetch_catalog(params).await?,
            Self::OTruyen(c) => c.fetch_catalog(params).await?,
        })
    }

    async fn fetch_detail(&self, id_or_slug: &str) -> Result<RawDocument, ProviderError> {
        Ok(match self {
            Self::MangaDex(c) => c.fetch_detail(id_or_slug).await?,
            Self::OTruyen(c) => c.fetch_detail(id_or_slug).await?,
        })
    }

    async fn fetch_chapter_list(&self, id_or_slug: &str) -> Result<RawDocument, ProviderError> {
        Ok(match self {
            Self::MangaDex(c) => c.fetch_chapter_list(id_or_slug).await?,
            Self::OTruyen(c) => c.fetch_chapter_list(id_or_slug).await?,
        })
    }

    async fn fetch_author(&self, id: &str) -> Result<RawDocument, ProviderError> {
        Ok(match self {
            Self::MangaDex(c) => c.fetch_author(id).await?,
            Self::OTruyen(c) => c.fetch_author(id).await?,
        })
    }

    async fn fetch_covers(&self, ids: &[String]) -> Result<RawDocument, ProviderError> {
        Ok(match self {
            Self::MangaDex(c) => c.fetch_covers(ids).await?,
            Self::OTruyen(c) => c.fetch_covers(ids).await?,
        })
    }

    async fn fetch_chapter_pages(&self, chapter_id: &str) -> Result<RawDocument, ProviderError> {
        Ok(match self {
            Self::MangaDex(c) => c.fetch_chapter_pages(chapter_id).await?,
            Self::OTruyen(c) => c.fetch_chapter_pages(chapter_id).await?,
        })
    }
}

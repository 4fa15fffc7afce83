//! Trait definitions for upstream manga providers.
//!
//! Both provider clients (MangaDex, OTruyen) implement [`MangaProvider`],
//! allowing the screens to stay provider-agnostic. Providers hand back the
//! raw JSON document untouched; turning it into the canonical model is the
//! job of [`crate::normalize`].

use std::future::Future;

/// An unmodified JSON document returned by an upstream call.
pub type RawDocument = serde_json::Value;

/// Provider errors that can tell a missing resource from other failures.
pub trait FetchError: std::error::Error + Send + Sync + 'static {
    fn is_not_found(&self) -> bool;
}

/// A unified manga source interface. Every method issues at most one GET.
pub trait MangaProvider: Send + Sync {
    type Error: FetchError;

    /// Which provider this is, for logging.
    fn name(&self) -> &'static str;

    /// Base URL image paths are appended to when the payload carries none.
    fn cdn_base(&self) -> &str;

    /// Fetch one page of the catalog listing.
    fn fetch_catalog(
        &self,
        params: &CatalogParams,
    ) -> impl Future<Output = Result<RawDocument, Self::Error>> + Send;

    /// Fetch a single series by id or slug.
    fn fetch_detail(
        &self,
        id_or_slug: &str,
    ) -> impl Future<Output = Result<RawDocument, Self::Error>> + Send;

    /// Fetch the chapter list of a series.
    fn fetch_chapter_list(
        &self,
        id_or_slug: &str,
    ) -> impl Future<Output = Result<RawDocument, Self::Error>> + Send;

    /// Look up an author (or artist) by id.
    fn fetch_author(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<RawDocument, Self::Error>> + Send;

    /// Resolve cover-art relationship ids into cover records.
    fn fetch_covers(
        &self,
        ids: &[String],
    ) -> impl Future<Output = Result<RawDocument, Self::Error>> + Send;

    /// Fetch the image listing of one chapter.
    fn fetch_chapter_pages(
        &self,
        chapter_id: &str,
    ) -> impl Future<Output = Result<RawDocument, Self::Error>> + Send;
}

/// Paging and filtering for a catalog request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogParams {
    /// 1-based page number.
    pub page: u32,
    /// MangaDex page size. Flat providers page with a server-fixed size.
    pub limit: u32,
    /// MangaDex `contentRating[]` filter. Ignored by flat providers.
    pub content_ratings: Vec<String>,
    /// OTruyen listing name (`truyen-moi`, `hoan-thanh`, ...). Ignored by MangaDex.
    pub list: String,
}

impl CatalogParams {
    pub fn page(page: u32) -> Self {
        Self {
            page: page.max(1),
            ..Self::default()
        }
    }

    /// Zero-based item offset of the first entry on this page.
    pub fn offset(&self) -> u32 {
        self.page.saturating_sub(1) * self.limit
    }
}

impl Default for CatalogParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 16,
            content_ratings: vec!["safe".into(), "suggestive".into(), "erotica".into()],
            list: "truyen-moi".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset() {
        let mut params = CatalogParams::page(3);
        params.limit = 20;
        assert_eq!(params.offset(), 40);
        assert_eq!(CatalogParams::page(0).page, 1);
        assert_eq!(CatalogParams::default().offset(), 0);
    }
}

use reqwest::Client;
use serde_json::json;

use super::error::MangaDexError;
use crate::traits::{CatalogParams, MangaProvider, RawDocument};

pub const DEFAULT_BASE_URL: &str = "https://api.mangadex.org";
pub const DEFAULT_CDN_BASE: &str = "https://uploads.mangadex.org";

/// MangaDex caps `ids[]` filters at 100 per request.
const COVER_BATCH: usize = 100;

/// MangaDex REST client. Returns raw JSON; see [`crate::normalize`].
pub struct MangaDexClient {
    base_url: String,
    cdn_base: String,
    http: Client,
}

impl MangaDexClient {
    pub fn new(base_url: impl Into<String>, cdn_base: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cdn_base: cdn_base.into().trim_end_matches('/').to_string(),
            http: crate::http_client(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check the HTTP response for errors and return the body text on failure.
    async fn check_response(
        resp: reqwest::Response,
        resource: &str,
    ) -> Result<reqwest::Response, MangaDexError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        tracing::warn!(status = status.as_u16(), resource, "MangaDex API error");
        if status.as_u16() == 404 {
            return Err(MangaDexError::NotFound(resource.to_string()));
        }
        let body = resp.text().await.unwrap_or_default();
        Err(MangaDexError::Api {
            resource: resource.to_string(),
            status: status.as_u16(),
            message: body,
        })
    }

    async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
        resource: &str,
    ) -> Result<RawDocument, MangaDexError> {
        let url = format!("{}{path}", self.base_url);
        tracing::debug!(%url, resource, "GET");

        let resp = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|source| MangaDexError::Fetch {
                resource: resource.to_string(),
                source,
            })?;

        let resp = Self::check_response(resp, resource).await?;
        resp.json()
            .await
            .map_err(|e| MangaDexError::Parse(e.to_string()))
    }
}

impl MangaProvider for MangaDexClient {
    type Error = MangaDexError;

    fn name(&self) -> &'static str {
        "mangadex"
    }

    fn cdn_base(&self) -> &str {
        &self.cdn_base
    }

    async fn fetch_catalog(&self, params: &CatalogParams) -> Result<RawDocument, MangaDexError> {
        let mut query: Vec<(&str, String)> = vec![
            ("limit", params.limit.to_string()),
            ("offset", params.offset().to_string()),
            ("includedTagsMode", "AND".into()),
            ("excludedTagsMode", "OR".into()),
            ("order[latestUploadedChapter]", "desc".into()),
        ];
        for rating in &params.content_ratings {
            query.push(("contentRating[]", rating.clone()));
        }
        self.get_json("/manga", &query, "catalog").await
    }

    async fn fetch_detail(&self, id_or_slug: &str) -> Result<RawDocument, MangaDexError> {
        self.get_json(&format!("/manga/{id_or_slug}"), &[], "manga detail")
            .await
    }

    async fn fetch_chapter_list(&self, id_or_slug: &str) -> Result<RawDocument, MangaDexError> {
        self.get_json(&format!("/manga/{id_or_slug}/aggregate"), &[], "chapter list")
            .await
    }

    async fn fetch_author(&self, id: &str) -> Result<RawDocument, MangaDexError> {
        self.get_json(&format!("/author/{id}"), &[], "author").await
    }

    async fn fetch_covers(&self, ids: &[String]) -> Result<RawDocument, MangaDexError> {
        if ids.is_empty() {
            return Ok(json!({ "data": [] }));
        }
        let ids = &ids[..ids.len().min(COVER_BATCH)];
        let mut query: Vec<(&str, String)> = vec![("limit", COVER_BATCH.to_string())];
        query.extend(ids.iter().map(|id| ("ids[]", id.clone())));
        self.get_json("/cover", &query, "cover art").await
    }

    async fn fetch_chapter_pages(&self, chapter_id: &str) -> Result<RawDocument, MangaDexError> {
        self.get_json(&format!("/at-home/server/{chapter_id}"), &[], "chapter pages")
            .await
    }
}

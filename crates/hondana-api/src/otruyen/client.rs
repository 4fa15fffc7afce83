use reqwest::Client;
use serde_json::json;

use super::error::OTruyenError;
use crate::traits::{CatalogParams, MangaProvider, RawDocument};

pub const DEFAULT_BASE_URL: &str = "https://otruyenapi.com";
pub const DEFAULT_CDN_BASE: &str = "https://img.otruyenapi.com";
pub const DEFAULT_CHAPTER_BASE: &str = "https://sv1.otruyenapi.com";

/// OTruyen client. Chapter pages live on a separate host.
pub struct OTruyenClient {
    base_url: String,
    cdn_base: String,
    chapter_base: String,
    http: Client,
}

impl OTruyenClient {
    pub fn new(
        base_url: impl Into<String>,
        cdn_base: impl Into<String>,
        chapter_base: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cdn_base: cdn_base.into().trim_end_matches('/').to_string(),
            chapter_base: chapter_base.into().trim_end_matches('/').to_string(),
            http: crate::http_client(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn check_response(
        resp: reqwest::Response,
        resource: &str,
    ) -> Result<reqwest::Response, OTruyenError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        tracing::warn!(status = status.as_u16(), resource, "OTruyen API error");
        if status.as_u16() == 404 {
            return Err(OTruyenError::NotFound(resource.to_string()));
        }
        let body = resp.text().await.unwrap_or_default();
        Err(OTruyenError::Api {
            resource: resource.to_string(),
            status: status.as_u16(),
            message: body,
        })
    }

    async fn get_json(
        &self,
        url: String,
        query: &[(&str, String)],
        resource: &str,
    ) -> Result<RawDocument, OTruyenError> {
        tracing::debug!(%url, resource, "GET");

        let resp = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|source| OTruyenError::Fetch {
                resource: resource.to_string(),
                source,
            })?;

        let resp = Self::check_response(resp, resource).await?;
        let doc: RawDocument = resp
            .json()
            .await
            .map_err(|e| OTruyenError::Parse(e.to_string()))?;

        // OTruyen reports unknown slugs as a 200 with `status: "error"`.
        if doc.get("status").and_then(|s| s.as_str()) == Some("error") {
            return Err(OTruyenError::NotFound(resource.to_string()));
        }
        Ok(doc)
    }
}

impl MangaProvider for OTruyenClient {
    type Error = OTruyenError;

    fn name(&self) -> &'static str {
        "otruyen"
    }

    fn cdn_base(&self) -> &str {
        &self.cdn_base
    }

    async fn fetch_catalog(&self, params: &CatalogParams) -> Result<RawDocument, OTruyenError> {
        let url = format!("{}/v1/api/danh-sach/{}", self.base_url, params.list);
        self.get_json(url, &[("page", params.page.to_string())], "catalog")
            .await
    }

    async fn fetch_detail(&self, id_or_slug: &str) -> Result<RawDocument, OTruyenError> {
        let url = format!("{}/v1/api/truyen-tranh/{id_or_slug}", self.base_url);
        self.get_json(url, &[], "manga detail").await
    }

    /// Chapters are embedded in the detail document.
    async fn fetch_chapter_list(&self, id_or_slug: &str) -> Result<RawDocument, OTruyenError> {
        let url = format!("{}/v1/api/truyen-tranh/{id_or_slug}", self.base_url);
        self.get_json(url, &[], "chapter list").await
    }

    async fn fetch_author(&self, _id: &str) -> Result<RawDocument, OTruyenError> {
        Err(OTruyenError::Unsupported("author lookup"))
    }

    /// Covers come inline as `thumb_url`; there is nothing to look up.
    async fn fetch_covers(&self, _ids: &[String]) -> Result<RawDocument, OTruyenError> {
        Ok(json!({ "data": [] }))
    }

    async fn fetch_chapter_pages(&self, chapter_id: &str) -> Result<RawDocument, OTruyenError> {
        let url = format!("{}/v1/api/chapter/{chapter_id}", self.chapter_base);
        self.get_json(url, &[], "chapter pages").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn test_fetch_catalog_page() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/v1/api/danh-sach/truyen-moi")
            .match_query(Matcher::UrlEncoded("page".into(), "3".into()))
            .with_status(200)
            .with_body(r#"{ "status": "success", "data": { "items": [] } }"#)
            .create_async()
            .await;

        let client = OTruyenClient::new(server.url(), DEFAULT_CDN_BASE, server.url());
        let doc = client.fetch_catalog(&CatalogParams::page(3)).await.unwrap();
        assert_eq!(doc["status"], "success");
    }

    #[tokio::test]
    async fn test_error_status_is_not_found() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/v1/api/truyen-tranh/nope")
            .with_status(200)
            .with_body(r#"{ "status": "error", "message": "Không tìm thấy", "data": null }"#)
            .create_async()
            .await;

        let client = OTruyenClient::new(server.url(), DEFAULT_CDN_BASE, server.url());
        let err = client.fetch_detail("nope").await.unwrap_err();
        assert!(matches!(err, OTruyenError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_chapter_pages_use_chapter_host() {
        let mut api = Server::new_async().await;
        let mut chapters = Server::new_async().await;
        let _m = chapters
            .mock("GET", "/v1/api/chapter/abc")
            .with_status(200)
            .with_body(r#"{ "status": "success", "data": { "domain_cdn": "https://cdn", "item": {} } }"#)
            .create_async()
            .await;
        let unused = api.mock("GET", Matcher::Any).expect(0).create_async().await;

        let client = OTruyenClient::new(api.url(), DEFAULT_CDN_BASE, chapters.url());
        let doc = client.fetch_chapter_pages("abc").await.unwrap();
        assert_eq!(doc["data"]["domain_cdn"], "https://cdn");
        unused.assert_async().await;
    }

    #[tokio::test]
    async fn test_author_lookup_unsupported() {
        let client = OTruyenClient::new("http://127.0.0.1:9", DEFAULT_CDN_BASE, "http://127.0.0.1:9");
        let err = client.fetch_author("x").await.unwrap_err();
        assert!(matches!(err, OTruyenError::Unsupported(_)));
        let covers = client.fetch_covers(&["c".into()]).await.unwrap();
        assert!(covers["data"].as_array().is_some_and(Vec::is_empty));
    }
}

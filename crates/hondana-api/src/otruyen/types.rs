use serde::Deserialize;

use crate::de;
use crate::models::{Chapter, ChapterPages, MangaDetail, MangaStatus, MangaSummary};
use crate::normalize::{
    flat_cover_url, parse_chapter_number, parse_timestamp, release_year, split_tags, strip_html,
    TagView,
};

// ── Envelope ────────────────────────────────────────────────────

/// Every OTruyen response wraps its payload in `{status, message, data}`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
}

#[derive(Debug, Deserialize)]
pub struct ListData {
    #[serde(default, deserialize_with = "de::list")]
    pub items: Vec<serde_json::Value>,
    #[serde(rename = "APP_DOMAIN_CDN_IMAGE")]
    pub cdn_image: Option<String>,
    pub params: Option<ListParams>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub total_items: u32,
    #[serde(default)]
    pub total_items_per_page: u32,
    #[serde(default)]
    pub current_page: u32,
}

impl ListData {
    pub fn has_next(&self) -> bool {
        self.params
            .as_ref()
            .and_then(|p| p.pagination.as_ref())
            .is_some_and(|p| {
                p.current_page.saturating_mul(p.total_items_per_page) < p.total_items
            })
    }
}

// ── Comic documents ─────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OTruyenItem {
    #[serde(rename = "_id", default, deserialize_with = "de::text")]
    pub id: String,
    #[serde(default, deserialize_with = "de::text")]
    pub name: String,
    #[serde(default, deserialize_with = "de::text")]
    pub slug: String,
    #[serde(rename = "origin_name", default, deserialize_with = "de::list")]
    pub origin_name: Vec<String>,
    #[serde(default, deserialize_with = "de::text")]
    pub content: String,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub status: Option<String>,
    #[serde(rename = "thumb_url", default, deserialize_with = "de::text")]
    pub thumb_url: String,
    #[serde(default, deserialize_with = "de::list")]
    pub author: Vec<String>,
    #[serde(default, deserialize_with = "de::list")]
    pub category: Vec<Category>,
    #[serde(default, deserialize_with = "de::list")]
    pub chapters: Vec<Server>,
    #[serde(default, deserialize_with = "de::list")]
    pub chapters_latest: Vec<ServerChapter>,
    #[serde(default, deserialize_with = "de::opt_u64")]
    pub views: Option<u64>,
    #[serde(default, deserialize_with = "de::number")]
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_u64")]
    pub follows: Option<u64>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    #[serde(default, deserialize_with = "de::text")]
    pub id: String,
    #[serde(default, deserialize_with = "de::text")]
    pub name: String,
    #[serde(default, deserialize_with = "de::text")]
    pub slug: String,
}

/// One mirror's chapter list.
#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    #[serde(default, deserialize_with = "de::text")]
    pub server_name: String,
    #[serde(default, deserialize_with = "de::list")]
    pub server_data: Vec<ServerChapter>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerChapter {
    #[serde(default, deserialize_with = "de::text")]
    pub filename: String,
    #[serde(default, deserialize_with = "de::text")]
    pub chapter_name: String,
    #[serde(default, deserialize_with = "de::text")]
    pub chapter_title: String,
    /// Absolute URL of the chapter's page listing.
    #[serde(default, deserialize_with = "de::text")]
    pub chapter_api_data: String,
}

impl ServerChapter {
    /// The chapter id is the last path segment of `chapter_api_data`.
    pub fn id(&self) -> String {
        chapter_id_from_api_url(&self.chapter_api_data)
    }
}

/// Extract the trailing id from a chapter API URL. Non-URLs are returned
/// trimmed of slashes.
pub fn chapter_id_from_api_url(api_url: &str) -> String {
    let path = match url::Url::parse(api_url) {
        Ok(url) => url.path().to_string(),
        Err(_) => api_url.to_string(),
    };
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

// ── Chapter pages ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChapterData {
    #[serde(default, deserialize_with = "de::text")]
    pub domain_cdn: String,
    pub item: Option<ChapterItem>,
}

#[derive(Debug, Deserialize)]
pub struct ChapterItem {
    #[serde(rename = "_id", default, deserialize_with = "de::text")]
    pub id: String,
    #[serde(default, deserialize_with = "de::text")]
    pub chapter_path: String,
    #[serde(default, deserialize_with = "de::list")]
    pub chapter_image: Vec<ChapterImage>,
}

#[derive(Debug, Deserialize)]
pub struct ChapterImage {
    #[serde(default)]
    pub image_page: u32,
    #[serde(default, deserialize_with = "de::text")]
    pub image_file: String,
}

// ── Conversions to the canonical model ──────────────────────────

impl OTruyenItem {
    fn title(&self) -> String {
        let name = self.name.trim();
        if name.is_empty() {
            crate::normalize::UNKNOWN_TITLE.to_string()
        } else {
            name.to_string()
        }
    }

    fn slug_or_id(&self) -> String {
        if self.slug.is_empty() {
            self.id.clone()
        } else {
            self.slug.clone()
        }
    }

    fn tag_views(&self) -> impl Iterator<Item = TagView<'_>> {
        self.category.iter().map(|c| TagView {
            id: &c.id,
            name: Some(c.name.as_str()),
            group: "genre",
            slug: Some(c.slug.as_str()),
        })
    }

    /// Latest chapter label: the listing's `chaptersLatest`, else the last
    /// chapter of the first server.
    fn chapter_label(&self) -> String {
        self.chapters_latest
            .first()
            .or_else(|| {
                self.chapters
                    .first()
                    .and_then(|s| s.server_data.last())
            })
            .map(|c| c.chapter_name.clone())
            .unwrap_or_default()
    }

    pub fn into_summary(self, cdn_base: &str) -> MangaSummary {
        let (genres, _) = split_tags(self.tag_views());
        MangaSummary {
            id: self.id.clone(),
            slug: self.slug_or_id(),
            title: self.title(),
            cover_image: flat_cover_url(cdn_base, &self.thumb_url),
            status: self.status.as_deref().map(MangaStatus::parse).unwrap_or_default(),
            genres,
            chapter_label: self.chapter_label(),
            views: self.views.unwrap_or(0),
            rating: self.rating.unwrap_or(0.0) as f32,
        }
    }

    /// Map the first server's chapter list. Chapters already arrive flat.
    pub fn chapters(&self, fallback_date: Option<chrono::DateTime<chrono::Utc>>) -> Vec<Chapter> {
        let Some(server) = self.chapters.first() else {
            return Vec::new();
        };
        server
            .server_data
            .iter()
            .map(|ch| Chapter {
                id: ch.id(),
                manga_id: self.id.clone(),
                label: ch.chapter_name.clone(),
                chapter_number: parse_chapter_number(&ch.chapter_name),
                title: ch.chapter_title.trim().to_string(),
                release_date: fallback_date,
                views: 0,
                pages: Vec::new(),
            })
            .collect()
    }

    pub fn into_detail(self, cdn_base: &str) -> MangaDetail {
        let (genres, tags) = split_tags(self.tag_views());
        let created = self.created_at.as_deref().and_then(parse_timestamp);
        let last_updated = self.updated_at.as_deref().and_then(parse_timestamp);
        let chapters = self.chapters(last_updated);

        let author: Vec<String> = self
            .author
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect();
        let alternative_titles: Vec<String> = self
            .origin_name
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        MangaDetail {
            id: self.id.clone(),
            slug: self.slug_or_id(),
            title: self.title(),
            cover_image: flat_cover_url(cdn_base, &self.thumb_url),
            status: self.status.as_deref().map(MangaStatus::parse).unwrap_or_default(),
            genres,
            chapter_label: self.chapter_label(),
            views: self.views.unwrap_or(0),
            rating: self.rating.unwrap_or(0.0) as f32,
            alternative_titles,
            artist: author.first().cloned().unwrap_or_default(),
            author,
            description: strip_html(&self.content),
            release_year: release_year(None, created, last_updated),
            last_updated,
            follows: self.follows.unwrap_or(0),
            tags,
            chapters,
        }
    }
}

impl ChapterData {
    pub fn into_pages(self, chapter_id: &str) -> ChapterPages {
        let Some(item) = self.item else {
            return ChapterPages {
                chapter_id: chapter_id.to_string(),
                pages: Vec::new(),
            };
        };
        let base = self.domain_cdn.trim_end_matches('/');
        let path = item.chapter_path.trim_matches('/');

        let mut images = item.chapter_image;
        images.sort_by_key(|img| img.image_page);

        ChapterPages {
            chapter_id: chapter_id.to_string(),
            pages: images
                .into_iter()
                .filter(|img| !img.image_file.is_empty())
                .map(|img| format!("{base}/{path}/{}", img.image_file))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CDN: &str = "https://img.otruyenapi.com";

    #[test]
    fn test_detail_from_flat_item() {
        let json = r#"{
            "_id": "665",
            "name": "Dược Sư Tự Sự",
            "slug": "duoc-su-tu-su",
            "origin_name": ["Kusuriya no Hitorigoto", ""],
            "content": "<p>Maomao &amp; friends.</p><p>Second line</p>",
            "status": "ongoing",
            "thumb_url": "duoc-su-tu-su-thumb.jpg",
            "author": ["Natsu Hyuuga"],
            "category": [
                { "id": "c1", "name": "Drama", "slug": "drama" },
                { "id": "c1", "name": "Drama", "slug": "drama" },
                { "id": "c2", "name": "Mystery", "slug": "mystery" }
            ],
            "chapters": [
                {
                    "server_name": "Server #1",
                    "server_data": [
                        { "filename": "", "chapter_name": "1", "chapter_title": "", "chapter_api_data": "https://sv1.otruyenapi.com/v1/api/chapter/aaa111" },
                        { "filename": "", "chapter_name": "2", "chapter_title": "Cat", "chapter_api_data": "https://sv1.otruyenapi.com/v1/api/chapter/bbb222" }
                    ]
                }
            ],
            "updatedAt": "2024-05-10T12:34:56.789Z"
        }"#;
        let item: OTruyenItem = serde_json::from_str(json).unwrap();
        let detail = item.into_detail(CDN);

        assert_eq!(detail.id, "665");
        assert_eq!(detail.slug, "duoc-su-tu-su");
        assert_eq!(detail.title, "Dược Sư Tự Sự");
        assert_eq!(
            detail.cover_image,
            "https://img.otruyenapi.com/uploads/comics/duoc-su-tu-su-thumb.jpg"
        );
        assert_eq!(detail.alternative_titles, vec!["Kusuriya no Hitorigoto"]);
        assert_eq!(detail.author, vec!["Natsu Hyuuga"]);
        assert_eq!(detail.artist, "Natsu Hyuuga");
        assert_eq!(detail.description, "Maomao & friends.\nSecond line");
        assert_eq!(detail.genres.len(), 2);
        assert_eq!(detail.genres[0].slug, "drama");
        assert_eq!(detail.tags, vec!["Drama", "Drama", "Mystery"]);
        assert_eq!(detail.release_year, 2024);
        assert_eq!(detail.chapter_label, "2");

        assert_eq!(detail.chapters.len(), 2);
        assert_eq!(detail.chapters[1].id, "bbb222");
        assert_eq!(detail.chapters[1].title, "Cat");
        assert_eq!(detail.chapters[1].chapter_number, 2.0);
        assert_eq!(detail.chapters[0].release_date, detail.last_updated);
    }

    #[test]
    fn test_minimal_item_defaults() {
        let item: OTruyenItem =
            serde_json::from_str(r#"{ "_id": "x", "name": null, "thumb_url": null }"#).unwrap();
        let summary = item.into_summary(CDN);
        assert_eq!(summary.title, "Unknown");
        assert_eq!(summary.cover_image, "");
        assert!(summary.genres.is_empty());
    }

    #[test]
    fn test_chapter_id_from_api_url() {
        assert_eq!(
            chapter_id_from_api_url("https://sv1.otruyenapi.com/v1/api/chapter/6581a3f2/"),
            "6581a3f2"
        );
        assert_eq!(chapter_id_from_api_url("abc"), "abc");
        assert_eq!(chapter_id_from_api_url(""), "");
    }

    #[test]
    fn test_chapter_pages_ordered_by_page() {
        let json = r#"{
            "domain_cdn": "https://sv1.otruyencdn.com/",
            "item": {
                "_id": "ch-1",
                "chapter_path": "uploads/20240510/abc/chapter_1",
                "chapter_image": [
                    { "image_page": 2, "image_file": "page_2.jpg" },
                    { "image_page": 1, "image_file": "page_1.jpg" }
                ]
            }
        }"#;
        let data: ChapterData = serde_json::from_str(json).unwrap();
        let pages = data.into_pages("ch-1");
        assert_eq!(
            pages.pages,
            vec![
                "https://sv1.otruyencdn.com/uploads/20240510/abc/chapter_1/page_1.jpg",
                "https://sv1.otruyencdn.com/uploads/20240510/abc/chapter_1/page_2.jpg",
            ]
        );
    }

    #[test]
    fn test_list_has_next() {
        let json = r#"{
            "items": [],
            "APP_DOMAIN_CDN_IMAGE": "https://img.otruyenapi.com",
            "params": { "pagination": { "totalItems": 48, "totalItemsPerPage": 24, "currentPage": 1 } }
        }"#;
        let data: ListData = serde_json::from_str(json).unwrap();
        assert!(data.has_next());
    }
}

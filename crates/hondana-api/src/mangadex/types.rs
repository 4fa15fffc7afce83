use serde::{Deserialize, Serialize};

use crate::de::{self, LocalizedString};
use crate::models::{Chapter, ChapterPages, MangaDetail, MangaStatus, MangaSummary};
use crate::normalize::{
    self, graph_cover_url, localized_text, parse_chapter_number, parse_timestamp, release_year,
    resolve_title, split_tags, strip_html, Lookups, TagView,
};

// ── Manga documents ─────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct MangaDexManga {
    pub id: String,
    #[serde(default)]
    pub attributes: MangaAttributes,
    #[serde(default, deserialize_with = "de::list")]
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MangaAttributes {
    #[serde(default, deserialize_with = "de::localized")]
    pub title: LocalizedString,
    #[serde(default, deserialize_with = "de::list")]
    pub alt_titles: Vec<LocalizedMap>,
    #[serde(default, deserialize_with = "de::localized")]
    pub description: LocalizedString,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "de::opt_u32")]
    pub year: Option<u32>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub last_chapter: Option<String>,
    #[serde(default, deserialize_with = "de::list")]
    pub tags: Vec<Tag>,
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

/// One `altTitles` entry: a single-language map such as `{"vi": "..."}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct LocalizedMap(#[serde(deserialize_with = "de::localized")] pub LocalizedString);

#[derive(Debug, Clone, Deserialize)]
pub struct Tag {
    pub id: String,
    #[serde(default)]
    pub attributes: TagAttributes,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagAttributes {
    #[serde(default, deserialize_with = "de::localized")]
    pub name: LocalizedString,
    #[serde(default, deserialize_with = "de::text")]
    pub group: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Relationship {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    /// Present when the request expanded the relationship with `includes[]`.
    pub attributes: Option<RelationshipAttributes>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipAttributes {
    #[serde(default, deserialize_with = "de::opt_string")]
    pub file_name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MangaListResponse {
    #[serde(default, deserialize_with = "de::list")]
    pub data: Vec<serde_json::Value>,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub total: u32,
}

impl MangaListResponse {
    pub fn has_next(&self) -> bool {
        self.offset.saturating_add(self.limit) < self.total
    }
}

// ── Secondary lookups ───────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CoverListResponse {
    #[serde(default, deserialize_with = "de::list")]
    pub data: Vec<CoverResource>,
}

#[derive(Debug, Deserialize)]
pub struct CoverResource {
    pub id: String,
    #[serde(default)]
    pub attributes: RelationshipAttributes,
    #[serde(default, deserialize_with = "de::list")]
    pub relationships: Vec<Relationship>,
}

impl CoverResource {
    /// The manga this cover belongs to.
    pub fn manga_id(&self) -> Option<&str> {
        self.relationships
            .iter()
            .find(|r| r.type_ == "manga")
            .map(|r| r.id.as_str())
    }
}

#[derive(Debug, Deserialize)]
pub struct AuthorResponse {
    pub data: Option<AuthorResource>,
}

#[derive(Debug, Deserialize)]
pub struct AuthorResource {
    #[serde(default)]
    pub attributes: RelationshipAttributes,
}

// ── Chapters ────────────────────────────────────────────────────

/// `GET /manga/{id}/aggregate`: chapters grouped by volume.
#[derive(Debug, Deserialize)]
pub struct AggregateResponse {
    #[serde(default, deserialize_with = "de::values")]
    pub volumes: Vec<AggregateVolume>,
}

#[derive(Debug, Deserialize)]
pub struct AggregateVolume {
    #[serde(default, deserialize_with = "de::text")]
    pub volume: String,
    #[serde(default, deserialize_with = "de::values")]
    pub chapters: Vec<AggregateChapter>,
}

#[derive(Debug, Deserialize)]
pub struct AggregateChapter {
    #[serde(default, deserialize_with = "de::text")]
    pub chapter: String,
    #[serde(default)]
    pub id: String,
}

/// `GET /at-home/server/{chapterId}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtHomeResponse {
    pub base_url: String,
    pub chapter: AtHomeChapter,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtHomeChapter {
    pub hash: String,
    #[serde(default, deserialize_with = "de::list")]
    pub data: Vec<String>,
    #[serde(default, deserialize_with = "de::list")]
    pub data_saver: Vec<String>,
}

/// Which image set to read from the at-home server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageQuality {
    #[default]
    Data,
    DataSaver,
}

impl ImageQuality {
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::DataSaver => "data-saver",
        }
    }
}

// ── Conversions to the canonical model ──────────────────────────

impl MangaDexManga {
    fn relationships_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Relationship> {
        self.relationships.iter().filter(move |r| r.type_ == kind)
    }

    /// Cover-art relationship ids that need a `fetch_covers` lookup.
    pub fn pending_cover_ids(&self) -> Vec<String> {
        self.relationships_of("cover_art")
            .filter(|r| inline_file_name(r).is_none())
            .map(|r| r.id.clone())
            .collect()
    }

    /// Author and artist ids whose names were not included inline.
    pub fn pending_person_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for rel in self
            .relationships
            .iter()
            .filter(|r| r.type_ == "author" || r.type_ == "artist")
        {
            if inline_name(rel).is_none() && !ids.contains(&rel.id) {
                ids.push(rel.id.clone());
            }
        }
        ids
    }

    fn cover_image(&self, cdn_base: &str, lookups: &Lookups) -> String {
        let Some(rel) = self.relationships_of("cover_art").next() else {
            return String::new();
        };
        if let Some(file_name) = inline_file_name(rel) {
            return graph_cover_url(cdn_base, &self.id, file_name);
        }
        match lookups.covers.get(&rel.id) {
            Some(cover) => {
                let manga_id = if cover.manga_id.is_empty() {
                    self.id.as_str()
                } else {
                    cover.manga_id.as_str()
                };
                graph_cover_url(cdn_base, manga_id, &cover.file_name)
            }
            None => String::new(),
        }
    }

    fn people(&self, kind: &str, lookups: &Lookups) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for rel in self.relationships_of(kind) {
            let name = inline_name(rel)
                .map(str::to_string)
                .or_else(|| lookups.people.get(&rel.id).cloned())
                .unwrap_or_default();
            let name = name.trim();
            if !name.is_empty() && !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }

    fn tag_views(&self) -> impl Iterator<Item = TagView<'_>> {
        self.attributes.tags.iter().map(|t| TagView {
            id: &t.id,
            name: t.attributes.name.get("en").map(String::as_str),
            group: &t.attributes.group,
            slug: None,
        })
    }

    pub fn into_summary(self, cdn_base: &str, lookups: &Lookups) -> MangaSummary {
        let cover_image = self.cover_image(cdn_base, lookups);
        let (genres, _) = split_tags(self.tag_views());
        let attrs = self.attributes;
        let alt: Vec<LocalizedString> = attrs.alt_titles.into_iter().map(|m| m.0).collect();

        MangaSummary {
            slug: attrs.slug.filter(|s| !s.is_empty()).unwrap_or_else(|| self.id.clone()),
            id: self.id,
            title: resolve_title(&alt, &attrs.title),
            cover_image,
            status: attrs.status.as_deref().map(MangaStatus::parse).unwrap_or_default(),
            genres,
            chapter_label: attrs.last_chapter.unwrap_or_default(),
            views: attrs.views.unwrap_or(0),
            rating: attrs.rating.unwrap_or(0.0) as f32,
        }
    }

    pub fn into_detail(self, cdn_base: &str, lookups: &Lookups) -> MangaDetail {
        let cover_image = self.cover_image(cdn_base, lookups);
        let (genres, tags) = split_tags(self.tag_views());
        let author = self.people("author", lookups);
        let artist = self
            .people("artist", lookups)
            .into_iter()
            .next()
            .or_else(|| author.first().cloned())
            .unwrap_or_default();

        let attrs = self.attributes;
        let alt: Vec<LocalizedString> = attrs.alt_titles.into_iter().map(|m| m.0).collect();
        let title = resolve_title(&alt, &attrs.title);

        let mut alternative_titles: Vec<String> = Vec::new();
        for text in alt.iter().flat_map(|m| m.values()) {
            let text = text.trim();
            if !text.is_empty() && text != title && !alternative_titles.iter().any(|t| t == text) {
                alternative_titles.push(text.to_string());
            }
        }

        let created = attrs.created_at.as_deref().and_then(parse_timestamp);
        let last_updated = attrs.updated_at.as_deref().and_then(parse_timestamp);

        MangaDetail {
            slug: attrs.slug.filter(|s| !s.is_empty()).unwrap_or_else(|| self.id.clone()),
            id: self.id,
            title,
            cover_image,
            status: attrs.status.as_deref().map(MangaStatus::parse).unwrap_or_default(),
            genres,
            chapter_label: attrs.last_chapter.unwrap_or_default(),
            views: attrs.views.unwrap_or(0),
            rating: attrs.rating.unwrap_or(0.0) as f32,
            alternative_titles,
            author,
            artist,
            description: strip_html(&localized_text(&attrs.description)),
            release_year: release_year(attrs.year, created, last_updated),
            last_updated,
            follows: attrs.follows.unwrap_or(0),
            tags,
            chapters: Vec::new(),
        }
    }
}

fn inline_file_name(rel: &Relationship) -> Option<&str> {
    rel.attributes
        .as_ref()
        .and_then(|a| a.file_name.as_deref())
        .filter(|f| !f.is_empty())
}

fn inline_name(rel: &Relationship) -> Option<&str> {
    rel.attributes
        .as_ref()
        .and_then(|a| a.name.as_deref())
        .filter(|n| !n.trim().is_empty())
}

impl AggregateResponse {
    /// Flatten every volume's chapters into one list.
    pub fn into_chapters(
        self,
        manga_id: &str,
        fallback_date: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Vec<Chapter> {
        self.volumes
            .into_iter()
            .flat_map(|v| v.chapters)
            .filter(|c| !c.id.is_empty())
            .map(|c| Chapter {
                chapter_number: parse_chapter_number(&c.chapter),
                id: c.id,
                manga_id: manga_id.to_string(),
                label: c.chapter,
                title: String::new(),
                release_date: fallback_date,
                views: 0,
                pages: Vec::new(),
            })
            .collect()
    }
}

impl AtHomeResponse {
    pub fn into_pages(self, chapter_id: &str, quality: ImageQuality) -> ChapterPages {
        let base = self.base_url.trim_end_matches('/');
        let hash = self.chapter.hash;
        let (files, segment) = match quality {
            ImageQuality::DataSaver if !self.chapter.data_saver.is_empty() => {
                (self.chapter.data_saver, ImageQuality::DataSaver.path_segment())
            }
            _ => (self.chapter.data, ImageQuality::Data.path_segment()),
        };

        ChapterPages {
            chapter_id: chapter_id.to_string(),
            pages: files
                .into_iter()
                .map(|file| format!("{base}/{segment}/{hash}/{file}"))
                .collect(),
        }
    }
}

impl AuthorResponse {
    pub fn into_name(self) -> String {
        self.data
            .and_then(|d| d.attributes.name)
            .map(|n| n.trim().to_string())
            .unwrap_or_default()
    }
}

impl CoverListResponse {
    pub fn into_index(self) -> normalize::CoverIndex {
        let mut index = normalize::CoverIndex::default();
        for cover in self.data {
            let Some(file_name) = cover.attributes.file_name.clone() else {
                continue;
            };
            let manga_id = cover.manga_id().unwrap_or_default().to_string();
            index.insert(cover.id, manga_id, file_name);
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CDN: &str = "https://uploads.mangadex.org";

    fn sample_manga() -> serde_json::Value {
        serde_json::json!({
            "id": "m-1",
            "type": "manga",
            "attributes": {
                "title": { "en": "Frieren" },
                "altTitles": [
                    { "ja": "葬送のフリーレン" },
                    { "vi": "Pháp sư tiễn táng" },
                    { "en": "Frieren: Beyond Journey's End" }
                ],
                "description": { "en": "<p>After the party defeats the Demon King&hellip;</p>" },
                "status": "ongoing",
                "year": 2020,
                "lastChapter": "",
                "tags": [
                    { "id": "t-action", "attributes": { "name": { "en": "Action" }, "group": "genre" } },
                    { "id": "t-fantasy", "attributes": { "name": { "en": "Fantasy" }, "group": "genre" } },
                    { "id": "t-magic", "attributes": { "name": { "en": " Magic " }, "group": "theme" } }
                ],
                "createdAt": "2020-04-02T17:00:00+00:00",
                "updatedAt": "2024-03-22T10:00:00+00:00"
            },
            "relationships": [
                { "id": "a-1", "type": "author" },
                { "id": "a-2", "type": "artist" },
                { "id": "c-1", "type": "cover_art" }
            ]
        })
    }

    #[test]
    fn test_detail_from_graph_item() {
        let manga: MangaDexManga = serde_json::from_value(sample_manga()).unwrap();
        assert_eq!(manga.pending_cover_ids(), vec!["c-1".to_string()]);
        assert_eq!(manga.pending_person_ids(), vec!["a-1".to_string(), "a-2".to_string()]);

        let mut lookups = Lookups::default();
        lookups.covers.insert("c-1".into(), "m-1".into(), "cover.jpg".into());
        lookups.people.insert("a-1".into(), "Yamada Kanehito".into());

        let detail = manga.into_detail(CDN, &lookups);
        assert_eq!(detail.title, "Pháp sư tiễn táng");
        assert_eq!(detail.slug, "m-1");
        assert_eq!(detail.cover_image, format!("{CDN}/covers/m-1/cover.jpg"));
        assert_eq!(detail.author, vec!["Yamada Kanehito".to_string()]);
        // Artist lookup failed, so it falls back to the first author.
        assert_eq!(detail.artist, "Yamada Kanehito");
        assert_eq!(detail.genres.len(), 2);
        assert_eq!(detail.genres[1].name, "Fantasy");
        assert_eq!(detail.tags, vec!["Action", "Fantasy", "Magic"]);
        assert_eq!(detail.release_year, 2020);
        assert_eq!(detail.status, MangaStatus::Ongoing);
        assert!(detail.description.starts_with("After the party"));
        assert!(detail.alternative_titles.contains(&"葬送のフリーレン".to_string()));
        assert!(!detail.alternative_titles.contains(&detail.title));
        assert!(detail.chapters.is_empty());
    }

    #[test]
    fn test_inline_includes_skip_lookups() {
        let json = serde_json::json!({
            "id": "m-2",
            "attributes": { "title": { "en": "Inline" } },
            "relationships": [
                { "id": "a-9", "type": "author", "attributes": { "name": "Someone" } },
                { "id": "c-9", "type": "cover_art", "attributes": { "fileName": "inline.png" } }
            ]
        });
        let manga: MangaDexManga = serde_json::from_value(json).unwrap();
        assert!(manga.pending_cover_ids().is_empty());
        assert!(manga.pending_person_ids().is_empty());

        let detail = manga.into_detail(CDN, &Lookups::default());
        assert_eq!(detail.cover_image, format!("{CDN}/covers/m-2/inline.png"));
        assert_eq!(detail.author, vec!["Someone".to_string()]);
    }

    #[test]
    fn test_unresolved_cover_is_empty() {
        let manga: MangaDexManga = serde_json::from_value(sample_manga()).unwrap();
        let summary = manga.into_summary(CDN, &Lookups::default());
        assert_eq!(summary.cover_image, "");
        assert_eq!(summary.views, 0);
        assert_eq!(summary.chapter_label, "");
    }

    #[test]
    fn test_aggregate_flattens_volumes() {
        let json = r#"{
            "result": "ok",
            "volumes": {
                "1": {
                    "volume": "1",
                    "count": 2,
                    "chapters": {
                        "1": { "chapter": "1", "id": "ch-1", "others": [], "count": 1 },
                        "2": { "chapter": "2", "id": "ch-2", "others": [], "count": 1 }
                    }
                },
                "none": {
                    "volume": "none",
                    "count": 2,
                    "chapters": [
                        { "chapter": "10.5", "id": "ch-10.5" },
                        { "chapter": "Oneshot", "id": "ch-extra" }
                    ]
                }
            }
        }"#;
        let agg: AggregateResponse = serde_json::from_str(json).unwrap();
        let chapters = agg.into_chapters("m-1", None);
        assert_eq!(chapters.len(), 4);
        let extra = chapters.iter().find(|c| c.id == "ch-extra").unwrap();
        assert_eq!(extra.chapter_number, 0.0);
        assert_eq!(extra.label, "Oneshot");
        assert!(chapters.iter().all(|c| c.manga_id == "m-1"));
    }

    #[test]
    fn test_empty_aggregate_is_array() {
        let agg: AggregateResponse =
            serde_json::from_str(r#"{ "result": "ok", "volumes": [] }"#).unwrap();
        assert!(agg.into_chapters("m-1", None).is_empty());
    }

    #[test]
    fn test_at_home_pages() {
        let json = r#"{
            "result": "ok",
            "baseUrl": "https://node.mangadex.network/",
            "chapter": {
                "hash": "abc",
                "data": ["1.png", "2.png"],
                "dataSaver": ["1.jpg", "2.jpg"]
            }
        }"#;
        let resp: AtHomeResponse = serde_json::from_str(json).unwrap();
        let pages = resp.into_pages("ch-1", ImageQuality::Data);
        assert_eq!(
            pages.pages,
            vec![
                "https://node.mangadex.network/data/abc/1.png",
                "https://node.mangadex.network/data/abc/2.png",
            ]
        );

        let resp: AtHomeResponse = serde_json::from_str(json).unwrap();
        let pages = resp.into_pages("ch-1", ImageQuality::DataSaver);
        assert_eq!(pages.pages[0], "https://node.mangadex.network/data-saver/abc/1.jpg");
    }

    #[test]
    fn test_cover_index() {
        let json = r#"{
            "data": [
                {
                    "id": "c-1",
                    "attributes": { "fileName": "y.jpg" },
                    "relationships": [{ "id": "M", "type": "manga" }]
                },
                { "id": "c-2", "attributes": {} }
            ]
        }"#;
        let list: CoverListResponse = serde_json::from_str(json).unwrap();
        let index = list.into_index();
        let cover = index.get("c-1").unwrap();
        assert_eq!(cover.manga_id, "M");
        assert_eq!(cover.file_name, "y.jpg");
        assert!(index.get("c-2").is_none());
    }

    #[test]
    fn test_author_name() {
        let resp: AuthorResponse =
            serde_json::from_str(r#"{ "data": { "attributes": { "name": " Oda " } } }"#).unwrap();
        assert_eq!(resp.into_name(), "Oda");

        let resp: AuthorResponse = serde_json::from_str(r#"{ "data": null }"#).unwrap();
        assert_eq!(resp.into_name(), "");
    }
}

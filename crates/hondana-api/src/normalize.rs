//! Raw upstream JSON → canonical model.
//!
//! Two provider shapes reach this module:
//!
//! - **Graph** (MangaDex): `attributes` + `relationships`, localized title
//!   maps, tag objects with a `group` discriminator, covers behind a
//!   `cover_art` relationship.
//! - **Flat** (OTruyen): `name`, `category`, a single `thumb_url`, chapters
//!   grouped per server.
//!
//! Every entry point first classifies the payload into a [`RawManga`] (or a
//! chapter/page document variant) and only then branches. Missing optional
//! fields always collapse to defaults; only an absent or unrecognizable
//! top-level payload is an error.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Utc};
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::de::LocalizedString;
use crate::mangadex::types::{
    AggregateResponse, AtHomeResponse, AuthorResponse, CoverListResponse, ImageQuality,
    MangaDexManga, MangaListResponse,
};
use crate::models::{
    CatalogPage, Chapter, ChapterPages, Genre, MangaDetail, MangaSummary,
};
use crate::otruyen::types::{ChapterData, ListData, OTruyenItem};

/// Title used when no candidate resolves.
pub const UNKNOWN_TITLE: &str = "Unknown";

/// Locale preference for titles and descriptions.
const LANGUAGE_PREFERENCE: [&str; 3] = ["vi", "en", "ja"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("payload is missing")]
    Missing,

    #[error("unrecognized {0} payload")]
    Unrecognized(&'static str),
}

// ── Classification ──────────────────────────────────────────────

/// A single manga document, classified by provider shape.
#[derive(Debug, Clone)]
pub enum RawManga {
    Graph(Box<MangaDexManga>),
    Flat(Box<OTruyenItem>),
}

impl RawManga {
    /// Decide which shape `raw` is and decode it.
    pub fn classify(raw: &Value) -> Result<Self, NormalizeError> {
        let obj = match raw {
            Value::Object(obj) => obj,
            Value::Null => return Err(NormalizeError::Missing),
            _ => return Err(NormalizeError::Unrecognized("manga")),
        };

        if obj.contains_key("relationships") || obj.contains_key("attributes") {
            serde_json::from_value(raw.clone())
                .map(|m| Self::Graph(Box::new(m)))
                .map_err(|_| NormalizeError::Unrecognized("manga"))
        } else if obj.contains_key("thumb_url") || obj.contains_key("_id") {
            serde_json::from_value(raw.clone())
                .map(|i| Self::Flat(Box::new(i)))
                .map_err(|_| NormalizeError::Unrecognized("manga"))
        } else {
            Err(NormalizeError::Unrecognized("manga"))
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Graph(m) => &m.id,
            Self::Flat(i) => &i.id,
        }
    }

    /// Cover-art ids that still need a secondary lookup.
    pub fn pending_cover_ids(&self) -> Vec<String> {
        match self {
            Self::Graph(m) => m.pending_cover_ids(),
            Self::Flat(_) => Vec::new(),
        }
    }

    /// Author/artist ids that still need a secondary lookup.
    pub fn pending_person_ids(&self) -> Vec<String> {
        match self {
            Self::Graph(m) => m.pending_person_ids(),
            Self::Flat(_) => Vec::new(),
        }
    }

    pub fn into_summary(self, cdn_base: &str, lookups: &Lookups) -> MangaSummary {
        match self {
            Self::Graph(m) => (*m).into_summary(cdn_base, lookups),
            Self::Flat(i) => (*i).into_summary(cdn_base),
        }
    }

    pub fn into_detail(self, cdn_base: &str, lookups: &Lookups) -> MangaDetail {
        let mut detail = match self {
            Self::Graph(m) => (*m).into_detail(cdn_base, lookups),
            Self::Flat(i) => (*i).into_detail(cdn_base),
        };
        sort_chapters(&mut detail.chapters);
        detail
    }
}

/// Results of the secondary lookups a graph-shaped item depends on.
#[derive(Debug, Clone, Default)]
pub struct Lookups {
    pub covers: CoverIndex,
    /// Author/artist id → display name.
    pub people: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverRecord {
    pub manga_id: String,
    pub file_name: String,
}

/// Cover-art id → cover record.
#[derive(Debug, Clone, Default)]
pub struct CoverIndex(HashMap<String, CoverRecord>);

impl CoverIndex {
    pub fn insert(&mut self, cover_id: String, manga_id: String, file_name: String) {
        self.0.insert(cover_id, CoverRecord { manga_id, file_name });
    }

    pub fn get(&self, cover_id: &str) -> Option<&CoverRecord> {
        self.0.get(cover_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Build from a raw `fetch_covers` document. Unknown shapes give an
    /// empty index.
    pub fn from_document(doc: &Value) -> Self {
        serde_json::from_value::<CoverListResponse>(doc.clone())
            .map(CoverListResponse::into_index)
            .unwrap_or_default()
    }

    pub fn extend(&mut self, other: CoverIndex) {
        self.0.extend(other.0);
    }
}

// ── Envelopes ───────────────────────────────────────────────────

/// Unwrap a detail document down to its item: `{data: {item}}`,
/// `{data: {...}}` or a bare item.
pub fn detail_item(doc: &Value) -> Result<&Value, NormalizeError> {
    if doc.is_null() {
        return Err(NormalizeError::Missing);
    }
    let item = match doc.get("data") {
        Some(Value::Null) => return Err(NormalizeError::Missing),
        Some(data) => data.get("item").unwrap_or(data),
        None => doc,
    };
    if item.is_null() {
        return Err(NormalizeError::Missing);
    }
    Ok(item)
}

/// CDN base embedded in a flat-shape envelope, if any.
pub fn embedded_cdn(doc: &Value) -> Option<&str> {
    doc.get("data")
        .and_then(|d| d.get("APP_DOMAIN_CDN_IMAGE"))
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Every cover-art id across a catalog or detail document that needs a
/// secondary lookup.
pub fn pending_cover_ids(doc: &Value) -> Vec<String> {
    let mut seen = HashSet::new();
    catalog_items(doc)
        .into_iter()
        .filter_map(|raw| RawManga::classify(raw).ok())
        .flat_map(|m| m.pending_cover_ids())
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

fn catalog_items(doc: &Value) -> Vec<&Value> {
    match doc.get("data") {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(data) if data.is_object() => match data.get("items") {
            Some(Value::Array(items)) => items.iter().collect(),
            _ => data.get("item").map(|i| vec![i]).unwrap_or_else(|| vec![data]),
        },
        _ => match doc {
            Value::Array(items) => items.iter().collect(),
            Value::Object(_) => vec![doc],
            _ => Vec::new(),
        },
    }
}

// ── Entry points ────────────────────────────────────────────────

/// Normalize a catalog listing. Items that cannot be classified are skipped.
pub fn normalize_catalog(
    doc: &Value,
    cdn_base: &str,
    lookups: &Lookups,
) -> Result<CatalogPage, NormalizeError> {
    if doc.is_null() {
        return Err(NormalizeError::Missing);
    }
    let cdn_base = embedded_cdn(doc).unwrap_or(cdn_base);

    let has_next = if let Some(data) = doc.get("data").filter(|d| d.is_object()) {
        serde_json::from_value::<ListData>(data.clone())
            .map(|d| d.has_next())
            .unwrap_or(false)
    } else {
        serde_json::from_value::<MangaListResponse>(doc.clone())
            .map(|r| r.has_next())
            .unwrap_or(false)
    };

    let items = catalog_items(doc)
        .into_iter()
        .filter_map(|raw| match RawManga::classify(raw) {
            Ok(manga) => Some(manga.into_summary(cdn_base, lookups)),
            Err(e) => {
                tracing::debug!(error = %e, "skipping catalog entry");
                None
            }
        })
        .collect();

    Ok(CatalogPage { items, has_next })
}

/// Normalize a single detail document.
pub fn normalize_detail(
    doc: &Value,
    cdn_base: &str,
    lookups: &Lookups,
) -> Result<MangaDetail, NormalizeError> {
    let item = detail_item(doc)?;
    let cdn_base = embedded_cdn(doc).unwrap_or(cdn_base);
    Ok(RawManga::classify(item)?.into_detail(cdn_base, lookups))
}

/// Normalize a chapter list document: a MangaDex volume aggregate or an
/// OTruyen detail document. Anything else yields an empty list.
///
/// Chapters without their own date take `fallback_date`.
pub fn normalize_chapters(
    doc: &Value,
    manga_id: &str,
    fallback_date: Option<DateTime<Utc>>,
) -> Vec<Chapter> {
    let mut chapters = if doc.get("volumes").is_some() {
        serde_json::from_value::<AggregateResponse>(doc.clone())
            .map(|agg| agg.into_chapters(manga_id, fallback_date))
            .unwrap_or_default()
    } else {
        match detail_item(doc).ok().map(RawManga::classify) {
            Some(Ok(RawManga::Flat(item))) => {
                let fallback = item
                    .updated_at
                    .as_deref()
                    .and_then(parse_timestamp)
                    .or(fallback_date);
                item.chapters(fallback)
            }
            _ => Vec::new(),
        }
    };
    sort_chapters(&mut chapters);
    chapters
}

/// Normalize a chapter page listing into absolute image URLs.
pub fn normalize_pages(
    doc: &Value,
    chapter_id: &str,
    quality: ImageQuality,
) -> Result<ChapterPages, NormalizeError> {
    if doc.is_null() {
        return Err(NormalizeError::Missing);
    }
    if doc.get("baseUrl").is_some() {
        return serde_json::from_value::<AtHomeResponse>(doc.clone())
            .map(|r| r.into_pages(chapter_id, quality))
            .map_err(|_| NormalizeError::Unrecognized("chapter pages"));
    }
    match doc.get("data") {
        Some(Value::Null) => Err(NormalizeError::Missing),
        Some(data) if data.get("item").is_some() => {
            serde_json::from_value::<ChapterData>(data.clone())
                .map(|d| d.into_pages(chapter_id))
                .map_err(|_| NormalizeError::Unrecognized("chapter pages"))
        }
        _ => Err(NormalizeError::Unrecognized("chapter pages")),
    }
}

/// Display name from an author lookup document, or empty.
pub fn normalize_author(doc: &Value) -> String {
    serde_json::from_value::<AuthorResponse>(doc.clone())
        .map(AuthorResponse::into_name)
        .unwrap_or_default()
}

// ── Title resolution ────────────────────────────────────────────

/// Resolve a display title: `altTitles` entries for vi, en, ja; then the
/// `title` map in the same order; then [`UNKNOWN_TITLE`].
pub fn resolve_title(alt_titles: &[LocalizedString], title: &LocalizedString) -> String {
    for lang in LANGUAGE_PREFERENCE {
        if let Some(found) = alt_titles.iter().find_map(|m| non_empty(m.get(lang))) {
            return found;
        }
    }
    for lang in LANGUAGE_PREFERENCE {
        if let Some(found) = non_empty(title.get(lang)) {
            return found;
        }
    }
    UNKNOWN_TITLE.to_string()
}

/// Pick localized text by language preference, falling back to any
/// non-empty entry.
pub fn localized_text(text: &LocalizedString) -> String {
    LANGUAGE_PREFERENCE
        .iter()
        .find_map(|lang| non_empty(text.get(*lang)))
        .or_else(|| text.values().find_map(|v| non_empty(Some(v))))
        .unwrap_or_default()
}

fn non_empty(s: Option<&String>) -> Option<String> {
    s.map(|s| s.trim()).filter(|s| !s.is_empty()).map(str::to_string)
}

// ── Genre / tag split ───────────────────────────────────────────

/// A borrowed view of one upstream tag.
#[derive(Debug, Clone, Copy)]
pub struct TagView<'a> {
    pub id: &'a str,
    /// English name.
    pub name: Option<&'a str>,
    /// Classification, e.g. `genre`, `theme`, `format`.
    pub group: &'a str,
    /// Explicit slug; the id is used when absent.
    pub slug: Option<&'a str>,
}

/// Split tags into genre-group `Genre`s (deduplicated by id) and the flat
/// list of every trimmed, non-empty tag name.
pub fn split_tags<'a>(tags: impl IntoIterator<Item = TagView<'a>>) -> (Vec<Genre>, Vec<String>) {
    let mut genres = Vec::new();
    let mut names = Vec::new();
    let mut seen = HashSet::new();

    for tag in tags {
        if tag.group == "genre" && seen.insert(tag.id) {
            genres.push(Genre {
                id: tag.id.to_string(),
                name: tag
                    .name
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or(UNKNOWN_TITLE)
                    .to_string(),
                slug: tag.slug.filter(|s| !s.is_empty()).unwrap_or(tag.id).to_string(),
            });
        }
        let name = tag.name.unwrap_or_default().trim();
        if !name.is_empty() {
            names.push(name.to_string());
        }
    }

    (genres, names)
}

// ── Cover URLs ──────────────────────────────────────────────────

/// `{cdn}/covers/{manga_id}/{file_name}`, or empty if either part is missing.
pub fn graph_cover_url(cdn_base: &str, manga_id: &str, file_name: &str) -> String {
    if manga_id.is_empty() || file_name.is_empty() {
        return String::new();
    }
    format!("{}/covers/{manga_id}/{file_name}", cdn_base.trim_end_matches('/'))
}

/// `{cdn}/uploads/comics/{thumb_url}`. An already absolute `thumb_url` is
/// kept; an empty one gives an empty string.
pub fn flat_cover_url(cdn_base: &str, thumb_url: &str) -> String {
    let thumb = thumb_url.trim();
    if thumb.is_empty() {
        return String::new();
    }
    if thumb.starts_with("http://") || thumb.starts_with("https://") {
        return thumb.to_string();
    }
    format!(
        "{}/uploads/comics/{}",
        cdn_base.trim_end_matches('/'),
        thumb.trim_start_matches('/')
    )
}

// ── Chapters ────────────────────────────────────────────────────

/// Parse a chapter label as a number. Anything unparsable is `0.0`.
pub fn parse_chapter_number(label: &str) -> f64 {
    label
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

/// Stable ascending sort by chapter number.
pub fn sort_chapters(chapters: &mut [Chapter]) {
    chapters.sort_by(|a, b| a.chapter_number.total_cmp(&b.chapter_number));
}

// ── Dates ───────────────────────────────────────────────────────

pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Explicit year, else the creation year, else the update year, else 0.
pub fn release_year(
    year: Option<u32>,
    created: Option<DateTime<Utc>>,
    updated: Option<DateTime<Utc>>,
) -> u32 {
    year.filter(|y| *y > 0)
        .or_else(|| created.or(updated).map(|d| d.year().max(0) as u32))
        .unwrap_or(0)
}

// ── HTML ────────────────────────────────────────────────────────

static RE_BLOCK_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<\s*(?:br\s*/?|/p|/div|/li)\s*>").unwrap());
static RE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<[a-z/!][^>]*>").unwrap());

/// Strip HTML markup to plain text. Paragraph and line breaks become
/// newlines; blank lines are dropped.
pub fn strip_html(html: &str) -> String {
    let text = RE_BLOCK_BREAK.replace_all(html, "\n");
    let text = RE_TAG.replace_all(&text, "");
    let text = decode_entities(&text);

    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&hellip;", "…")
        .replace("&amp;", "&")
}

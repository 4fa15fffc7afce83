//! Canonical, provider-agnostic manga model.
//!
//! Every screen works on these types only. Fields always carry a usable
//! default so the presentation layer never has to handle missing data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Publication status of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MangaStatus {
    Ongoing,
    Completed,
    Hiatus,
    Cancelled,
    #[default]
    Unknown,
}

impl MangaStatus {
    /// Parse an upstream status string. Unrecognized values map to `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "ongoing" => Self::Ongoing,
            "completed" => Self::Completed,
            "hiatus" => Self::Hiatus,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ongoing => "ongoing",
            Self::Completed => "completed",
            Self::Hiatus => "hiatus",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for MangaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ongoing => write!(f, "Ongoing"),
            Self::Completed => write!(f, "Completed"),
            Self::Hiatus => write!(f, "Hiatus"),
            Self::Cancelled => write!(f, "Cancelled"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Genre {
    pub id: String,
    pub name: String,
    pub slug: String,
}

/// A catalog entry, as shown on the home grid.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MangaSummary {
    pub id: String,
    pub slug: String,
    pub title: String,
    /// Absolute URL, or empty when no cover could be resolved.
    pub cover_image: String,
    pub status: MangaStatus,
    pub genres: Vec<Genre>,
    /// Display label of the latest chapter. Not necessarily numeric.
    pub chapter_label: String,
    pub views: u64,
    pub rating: f32,
}

/// Full detail view of a single series.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MangaDetail {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub cover_image: String,
    pub status: MangaStatus,
    pub genres: Vec<Genre>,
    pub chapter_label: String,
    pub views: u64,
    pub rating: f32,
    pub alternative_titles: Vec<String>,
    pub author: Vec<String>,
    pub artist: String,
    pub description: String,
    pub release_year: u32,
    pub last_updated: Option<DateTime<Utc>>,
    pub follows: u64,
    pub tags: Vec<String>,
    /// Sorted by `chapter_number` ascending.
    pub chapters: Vec<Chapter>,
}

impl MangaDetail {
    /// Project the detail down to the fields a catalog card needs.
    pub fn summary(&self) -> MangaSummary {
        MangaSummary {
            id: self.id.clone(),
            slug: self.slug.clone(),
            title: self.title.clone(),
            cover_image: self.cover_image.clone(),
            status: self.status,
            genres: self.genres.clone(),
            chapter_label: self.chapter_label.clone(),
            views: self.views,
            rating: self.rating,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub manga_id: String,
    /// Upstream chapter label, kept verbatim for display and routing.
    pub label: String,
    pub chapter_number: f64,
    pub title: String,
    pub release_date: Option<DateTime<Utc>>,
    pub views: u64,
    pub pages: Vec<String>,
}

/// Image URLs for one chapter, in reading order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChapterPages {
    pub chapter_id: String,
    pub pages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CatalogPage {
    pub items: Vec<MangaSummary>,
    pub has_next: bool,
}

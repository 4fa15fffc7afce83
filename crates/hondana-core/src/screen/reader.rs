use hondana_api::mangadex::ImageQuality;
use hondana_api::models::Chapter;
use hondana_api::normalize::{self, Lookups};
use hondana_api::MangaProvider;
use serde::Serialize;

use super::ViewState;
use crate::loader::{LoadOutcome, ScreenLoader};
use crate::route::Route;

/// A neighbouring chapter the reader can jump to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterLink {
    pub id: String,
    pub label: String,
}

/// Previous/next chapter relative to the one being read, in ascending
/// chapter order. Neither end wraps around.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ChapterNav {
    pub previous: Option<ChapterLink>,
    pub next: Option<ChapterLink>,
}

impl ChapterNav {
    pub fn at(chapters: &[Chapter], index: usize) -> Self {
        if index >= chapters.len() {
            return Self::default();
        }
        let link = |c: &Chapter| ChapterLink {
            id: c.id.clone(),
            label: c.label.clone(),
        };
        Self {
            previous: index.checked_sub(1).and_then(|i| chapters.get(i)).map(link),
            next: chapters.get(index + 1).map(link),
        }
    }
}

/// Everything the reader displays for one chapter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReaderView {
    pub manga_id: String,
    /// The chapter being read, with `pages` filled in.
    pub chapter: Chapter,
    pub nav: ChapterNav,
    /// Zero-based position in the ascending chapter list.
    pub position: usize,
    pub total: usize,
}

impl ReaderView {
    pub fn previous_route(&self) -> Option<Route> {
        self.nav.previous.as_ref().map(|c| self.route_to(c))
    }

    pub fn next_route(&self) -> Option<Route> {
        self.nav.next.as_ref().map(|c| self.route_to(c))
    }

    fn route_to(&self, link: &ChapterLink) -> Route {
        Route::Reader {
            manga: self.manga_id.clone(),
            chapter: link.id.clone(),
        }
    }
}

/// Find a chapter by id, then by label, then by numeric value.
pub fn locate_chapter(chapters: &[Chapter], key: &str) -> Option<usize> {
    let key = key.trim();
    if let Some(i) = chapters.iter().position(|c| c.id == key) {
        return Some(i);
    }
    if let Some(i) = chapters.iter().position(|c| c.label.trim() == key) {
        return Some(i);
    }
    let value: f64 = key.parse().ok().filter(|v: &f64| v.is_finite())?;
    chapters.iter().position(|c| c.chapter_number == value)
}

/// Paginated image reader.
#[derive(Debug, Default)]
pub struct ReaderScreen {
    state: ViewState<ReaderView>,
    loader: ScreenLoader,
}

impl ReaderScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ViewState<ReaderView> {
        &self.state
    }

    pub fn loader(&self) -> ScreenLoader {
        self.loader.clone()
    }

    pub fn unmount(&self) {
        self.loader.unmount();
    }

    pub async fn load<P: MangaProvider>(
        &mut self,
        provider: &P,
        manga: &str,
        chapter: &str,
        quality: ImageQuality,
    ) -> LoadOutcome<()> {
        let loader = self.loader.clone();
        match loader.run(fetch(provider, manga, chapter, quality)).await {
            LoadOutcome::Completed(state) => {
                self.state = state;
                LoadOutcome::Completed(())
            }
            LoadOutcome::Cancelled => LoadOutcome::Cancelled,
        }
    }
}

async fn fetch<P: MangaProvider>(
    provider: &P,
    manga: &str,
    key: &str,
    quality: ImageQuality,
) -> ViewState<ReaderView> {
    let chapters = match provider.fetch_chapter_list(manga).await {
        Ok(doc) => normalize::normalize_chapters(&doc, manga, None),
        Err(e) => {
            tracing::warn!(provider = provider.name(), manga, error = %e, "chapter list fetch failed");
            return ViewState::from_fetch_error(&e);
        }
    };

    let Some(position) = locate_chapter(&chapters, key) else {
        tracing::warn!(manga, chapter = key, "chapter not in list");
        return ViewState::NotFound;
    };
    let nav = ChapterNav::at(&chapters, position);
    let total = chapters.len();
    let mut chapter = chapters.into_iter().nth(position).unwrap_or_default();
    if chapter.release_date.is_none() {
        chapter.release_date = parent_updated(provider, manga).await;
    }

    let doc = match provider.fetch_chapter_pages(&chapter.id).await {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!(chapter = %chapter.id, error = %e, "chapter pages fetch failed");
            return ViewState::from_fetch_error(&e);
        }
    };
    match normalize::normalize_pages(&doc, &chapter.id, quality) {
        Ok(pages) => chapter.pages = pages.pages,
        Err(e) => return ViewState::from_normalize_error(&e),
    }

    tracing::info!(
        provider = provider.name(),
        chapter = %chapter.id,
        pages = chapter.pages.len(),
        "chapter loaded"
    );
    ViewState::Ready(ReaderView {
        manga_id: manga.to_string(),
        chapter,
        nav,
        position,
        total,
    })
}

/// The manga's last-updated time, for chapters the list left undated.
/// A failed lookup leaves the date absent.
async fn parent_updated<P: MangaProvider>(
    provider: &P,
    manga: &str,
) -> Option<chrono::DateTime<chrono::Utc>> {
    match provider.fetch_detail(manga).await {
        Ok(doc) => normalize::normalize_detail(&doc, provider.cdn_base(), &Lookups::default())
            .ok()
            .and_then(|detail| detail.last_updated),
        Err(e) => {
            tracing::debug!(manga, error = %e, "parent detail lookup failed");
            None
        }
    }
}

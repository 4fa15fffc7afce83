use hondana_api::models::{Chapter, MangaDetail};
use hondana_api::normalize::{self, Lookups, RawManga};
use hondana_api::MangaProvider;

use super::{lookup_covers, ViewState};
use crate::loader::{LoadOutcome, ScreenLoader};

/// Manga detail screen.
#[derive(Debug, Default)]
pub struct DetailScreen {
    state: ViewState<MangaDetail>,
    loader: ScreenLoader,
}

impl DetailScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ViewState<MangaDetail> {
        &self.state
    }

    pub fn loader(&self) -> ScreenLoader {
        self.loader.clone()
    }

    pub fn unmount(&self) {
        self.loader.unmount();
    }

    pub async fn load<P: MangaProvider>(&mut self, provider: &P, id_or_slug: &str) -> LoadOutcome<()> {
        let loader = self.loader.clone();
        match loader.run(fetch(provider, id_or_slug)).await {
            LoadOutcome::Completed(state) => {
                self.state = state;
                LoadOutcome::Completed(())
            }
            LoadOutcome::Cancelled => LoadOutcome::Cancelled,
        }
    }
}

/// Chapters in display order, latest first.
pub fn chapters_newest_first(detail: &MangaDetail) -> impl Iterator<Item = &Chapter> {
    detail.chapters.iter().rev()
}

async fn fetch<P: MangaProvider>(provider: &P, id_or_slug: &str) -> ViewState<MangaDetail> {
    let doc = match provider.fetch_detail(id_or_slug).await {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!(provider = provider.name(), id = id_or_slug, error = %e, "detail fetch failed");
            return ViewState::from_fetch_error(&e);
        }
    };

    let manga = match normalize::detail_item(&doc).and_then(RawManga::classify) {
        Ok(manga) => manga,
        Err(e) => {
            tracing::warn!(id = id_or_slug, error = %e, "unusable detail payload");
            return ViewState::from_normalize_error(&e);
        }
    };

    let mut lookups = Lookups {
        covers: lookup_covers(provider, &manga.pending_cover_ids()).await,
        ..Lookups::default()
    };

    for person in manga.pending_person_ids() {
        match provider.fetch_author(&person).await {
            Ok(doc) => {
                let name = normalize::normalize_author(&doc);
                if !name.is_empty() {
                    lookups.people.insert(person, name);
                }
            }
            Err(e) => {
                tracing::warn!(id = %person, error = %e, "author lookup failed");
            }
        }
    }

    let cdn_base = normalize::embedded_cdn(&doc).unwrap_or(provider.cdn_base());
    let mut detail = manga.into_detail(cdn_base, &lookups);

    // Flat documents carry their chapter list inline.
    if detail.chapters.is_empty() {
        match provider.fetch_chapter_list(id_or_slug).await {
            Ok(doc) => {
                detail.chapters =
                    normalize::normalize_chapters(&doc, &detail.id, detail.last_updated);
            }
            Err(e) => {
                tracing::warn!(id = id_or_slug, error = %e, "chapter list fetch failed");
            }
        }
    } else {
        normalize::sort_chapters(&mut detail.chapters);
    }

    tracing::info!(
        provider = provider.name(),
        id = %detail.id,
        chapters = detail.chapters.len(),
        "detail loaded"
    );
    ViewState::Ready(detail)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::screen::fake::FakeProvider;

    fn graph_detail() -> serde_json::Value {
        json!({
            "result": "ok",
            "data": {
                "id": "M",
                "type": "manga",
                "attributes": {
                    "title": { "en": "Frieren" },
                    "tags": [
                        { "id": "t-1", "attributes": { "name": { "en": "Action" }, "group": "genre" } },
                        { "id": "t-2", "attributes": { "name": { "en": "School" }, "group": "theme" } }
                    ],
                    "updatedAt": "2024-03-22T10:00:00+00:00"
                },
                "relationships": [
                    { "id": "a-1", "type": "author" },
                    { "id": "a-2", "type": "artist" },
                    { "id": "c-1", "type": "cover_art" }
                ]
            }
        })
    }

    fn aggregate() -> serde_json::Value {
        json!({
            "result": "ok",
            "volumes": {
                "1": {
                    "volume": "1",
                    "chapters": {
                        "2": { "chapter": "2", "id": "ch-2" },
                        "1": { "chapter": "1", "id": "ch-1" },
                        "1.5": { "chapter": "1.5", "id": "ch-1.5" }
                    }
                }
            }
        })
    }

    fn full_provider() -> FakeProvider {
        FakeProvider::default()
            .with("detail:M", graph_detail())
            .with(
                "covers",
                json!({ "data": [{
                    "id": "c-1",
                    "attributes": { "fileName": "y.jpg" },
                    "relationships": [{ "id": "M", "type": "manga" }]
                }] }),
            )
            .with("author:a-1", json!({ "data": { "attributes": { "name": "Yamada" } } }))
            .with("author:a-2", json!({ "data": { "attributes": { "name": "Abe" } } }))
            .with("chapters:M", aggregate())
    }

    #[tokio::test]
    async fn test_full_pipeline() {
        let provider = full_provider();
        let mut screen = DetailScreen::new();
        screen.load(&provider, "M").await;

        let detail = screen.state().ready().unwrap();
        assert_eq!(detail.title, "Frieren");
        assert_eq!(detail.cover_image, "https://cdn.test/covers/M/y.jpg");
        assert_eq!(detail.author, vec!["Yamada".to_string()]);
        assert_eq!(detail.artist, "Abe");
        assert_eq!(detail.genres.len(), 1);
        assert_eq!(detail.genres[0].name, "Action");
        assert_eq!(detail.tags, vec!["Action", "School"]);

        let labels: Vec<&str> = detail.chapters.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["1", "1.5", "2"]);
        let newest: Vec<&str> = chapters_newest_first(detail).map(|c| c.id.as_str()).collect();
        assert_eq!(newest, vec!["ch-2", "ch-1.5", "ch-1"]);
        // Chapters without their own date inherit the manga's update time.
        assert_eq!(detail.chapters[0].release_date, detail.last_updated);
    }

    #[tokio::test]
    async fn test_dependent_failures_degrade_fields() {
        let provider = FakeProvider::default()
            .with("detail:M", graph_detail())
            .failing("covers")
            .failing("author:a-1")
            .with("author:a-2", json!({ "data": { "attributes": { "name": "Abe" } } }))
            .failing("chapters:M");
        let mut screen = DetailScreen::new();
        screen.load(&provider, "M").await;

        let detail = screen.state().ready().unwrap();
        assert_eq!(detail.title, "Frieren");
        assert_eq!(detail.cover_image, "");
        assert!(detail.author.is_empty());
        assert_eq!(detail.artist, "Abe");
        assert!(detail.chapters.is_empty());
    }

    #[tokio::test]
    async fn test_missing_manga_is_not_found() {
        let provider = FakeProvider::default();
        let mut screen = DetailScreen::new();
        screen.load(&provider, "nope").await;
        assert_eq!(screen.state(), &ViewState::NotFound);
    }

    #[tokio::test]
    async fn test_null_payload_is_not_found() {
        let provider = FakeProvider::default()
            .with("detail:x", json!({ "status": "success", "data": null }));
        let mut screen = DetailScreen::new();
        screen.load(&provider, "x").await;
        assert_eq!(screen.state(), &ViewState::NotFound);
        assert!(!provider.called("chapters:x"));
    }

    #[tokio::test]
    async fn test_transport_failure_is_failed() {
        let provider = FakeProvider::default().failing("detail:M");
        let mut screen = DetailScreen::new();
        screen.load(&provider, "M").await;
        assert!(matches!(screen.state(), ViewState::Failed(_)));
    }

    #[tokio::test]
    async fn test_flat_detail_skips_lookups() {
        let doc = json!({
            "status": "success",
            "data": {
                "item": {
                    "_id": "1",
                    "name": "Tên",
                    "slug": "ten",
                    "thumb_url": "x.jpg",
                    "author": ["Tác giả"],
                    "category": [{ "id": "c1", "name": "Action", "slug": "action" }],
                    "chapters": [{
                        "server_name": "Server #1",
                        "server_data": [
                            { "chapter_name": "2", "chapter_api_data": "https://sv1.otruyenapi.com/v1/api/chapter/b" },
                            { "chapter_name": "1", "chapter_api_data": "https://sv1.otruyenapi.com/v1/api/chapter/a" }
                        ]
                    }]
                },
                "APP_DOMAIN_CDN_IMAGE": "https://img.otruyenapi.com"
            }
        });
        let provider = FakeProvider::default().with("detail:ten", doc);
        let mut screen = DetailScreen::new();
        screen.load(&provider, "ten").await;

        let detail = screen.state().ready().unwrap();
        assert_eq!(detail.cover_image, "https://img.otruyenapi.com/uploads/comics/x.jpg");
        assert_eq!(detail.author, vec!["Tác giả".to_string()]);
        assert_eq!(detail.chapters.len(), 2);
        assert_eq!(detail.chapters[0].id, "a");
        assert!(!provider.called("covers"));
        assert!(!provider.called("chapters:ten"));
    }
}

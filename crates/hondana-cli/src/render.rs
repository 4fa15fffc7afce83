//! Plain-text rendering of the screens' view models.

use std::fmt::Write;

use hondana_api::models::{CatalogPage, MangaDetail};
use hondana_core::screen::detail::chapters_newest_first;
use hondana_core::screen::ReaderView;
use hondana_core::Route;

pub fn catalog(page: &CatalogPage, page_number: u32) -> String {
    let mut out = String::new();
    if page.items.is_empty() {
        out.push_str("No manga on this page.\n");
    }
    for item in &page.items {
        let _ = writeln!(out, "{}  [{}]", item.title, item.status);
        if !item.chapter_label.is_empty() {
            let _ = writeln!(out, "    latest: ch. {}", item.chapter_label);
        }
        if !item.genres.is_empty() {
            let names: Vec<&str> = item.genres.iter().map(|g| g.name.as_str()).collect();
            let _ = writeln!(out, "    {}", names.join(", "));
        }
        let _ = writeln!(out, "    {}", Route::Manga { id: item.slug.clone() });
    }
    if page.has_next {
        let _ = writeln!(out, "\nmore: hondana home --page {}", page_number + 1);
    }
    out
}

pub fn detail(detail: &MangaDetail) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", detail.title);
    for alt in &detail.alternative_titles {
        let _ = writeln!(out, "  aka {alt}");
    }
    out.push('\n');

    let _ = writeln!(out, "Status:   {}", detail.status);
    if !detail.author.is_empty() {
        let _ = writeln!(out, "Author:   {}", detail.author.join(", "));
    }
    if !detail.artist.is_empty() {
        let _ = writeln!(out, "Artist:   {}", detail.artist);
    }
    if detail.release_year > 0 {
        let _ = writeln!(out, "Year:     {}", detail.release_year);
    }
    if let Some(updated) = detail.last_updated {
        let _ = writeln!(out, "Updated:  {}", updated.format("%Y-%m-%d"));
    }
    if !detail.genres.is_empty() {
        let names: Vec<&str> = detail.genres.iter().map(|g| g.name.as_str()).collect();
        let _ = writeln!(out, "Genres:   {}", names.join(", "));
    }
    if !detail.tags.is_empty() {
        let _ = writeln!(out, "Tags:     {}", detail.tags.join(", "));
    }
    if !detail.cover_image.is_empty() {
        let _ = writeln!(out, "Cover:    {}", detail.cover_image);
    }

    if !detail.description.is_empty() {
        let _ = writeln!(out, "\n{}", detail.description);
    }

    let _ = writeln!(out, "\nChapters ({}):", detail.chapters.len());
    for chapter in chapters_newest_first(detail) {
        let route = Route::Reader {
            manga: detail.slug.clone(),
            chapter: chapter.id.clone(),
        };
        if chapter.title.is_empty() {
            let _ = writeln!(out, "  ch. {:<8} {route}", chapter.label);
        } else {
            let _ = writeln!(out, "  ch. {:<8} {}  {route}", chapter.label, chapter.title);
        }
    }
    out
}

pub fn reader(view: &ReaderView) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Chapter {} ({}/{})",
        view.chapter.label,
        view.position + 1,
        view.total
    );
    for (i, page) in view.chapter.pages.iter().enumerate() {
        let _ = writeln!(out, "  {:>3}  {page}", i + 1);
    }
    out.push('\n');
    match view.previous_route() {
        Some(route) => {
            let _ = writeln!(out, "previous: {route}");
        }
        None => out.push_str("previous: none\n"),
    }
    match view.next_route() {
        Some(route) => {
            let _ = writeln!(out, "next:     {route}");
        }
        None => out.push_str("next:     none\n"),
    }
    out
}

#[cfg(test)]
mod tests {
    use hondana_api::models::{Chapter, MangaStatus, MangaSummary};
    use hondana_core::screen::{ChapterLink, ChapterNav};

    use super::*;

    #[test]
    fn test_catalog_lists_routes() {
        let page = CatalogPage {
            items: vec![MangaSummary {
                slug: "one-piece".into(),
                title: "One Piece".into(),
                status: MangaStatus::Ongoing,
                chapter_label: "1100".into(),
                ..MangaSummary::default()
            }],
            has_next: true,
        };
        let out = catalog(&page, 2);
        assert!(out.contains("One Piece  [Ongoing]"));
        assert!(out.contains("/manga/one-piece"));
        assert!(out.contains("hondana home --page 3"));
    }

    #[test]
    fn test_detail_lists_newest_chapter_first() {
        let chapter = |id: &str, label: &str| Chapter {
            id: id.into(),
            label: label.into(),
            ..Chapter::default()
        };
        let manga = MangaDetail {
            slug: "m".into(),
            title: "Title".into(),
            chapters: vec![chapter("a", "1"), chapter("b", "2")],
            ..MangaDetail::default()
        };
        let out = detail(&manga);
        let newest = out.find("/read/m/b").unwrap();
        let oldest = out.find("/read/m/a").unwrap();
        assert!(newest < oldest);
        assert!(!out.contains("Year:"));
    }

    #[test]
    fn test_reader_shows_nav() {
        let view = ReaderView {
            manga_id: "m".into(),
            chapter: Chapter {
                label: "1".into(),
                pages: vec!["https://cdn/1.jpg".into()],
                ..Chapter::default()
            },
            nav: ChapterNav {
                previous: None,
                next: Some(ChapterLink {
                    id: "c2".into(),
                    label: "2".into(),
                }),
            },
            position: 0,
            total: 2,
        };
        let out = reader(&view);
        assert!(out.starts_with("Chapter 1 (1/2)"));
        assert!(out.contains("https://cdn/1.jpg"));
        assert!(out.contains("previous: none"));
        assert!(out.contains("next:     /read/m/c2"));
    }
}

//! Path routing for the three screens.

use std::fmt;

/// A screen address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Manga { id: String },
    Reader { manga: String, chapter: String },
    NotFound,
}

impl Route {
    /// Parse a path such as `/manga/one-piece` or `/read/abc/12`.
    ///
    /// Query strings, fragments and trailing slashes are ignored.
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Self::Home,
            ["manga", id] => Self::Manga { id: id.to_string() },
            ["read", manga, chapter] => Self::Reader {
                manga: manga.to_string(),
                chapter: chapter.to_string(),
            },
            _ => Self::NotFound,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".into(),
            Self::Manga { id } => format!("/manga/{id}"),
            Self::Reader { manga, chapter } => format!("/read/{manga}/{chapter}"),
            Self::NotFound => "/404".into(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

use hondana_api::models::CatalogPage;
use hondana_api::normalize::{self, Lookups};
use hondana_api::{CatalogParams, MangaProvider};

use super::{lookup_covers, ViewState};
use crate::loader::{LoadOutcome, ScreenLoader};

/// Home screen: one page of the catalog.
#[derive(Debug, Default)]
pub struct CatalogScreen {
    state: ViewState<CatalogPage>,
    loader: ScreenLoader,
}

impl CatalogScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ViewState<CatalogPage> {
        &self.state
    }

    /// A handle that can cancel this screen's in-flight load.
    pub fn loader(&self) -> ScreenLoader {
        self.loader.clone()
    }

    pub fn unmount(&self) {
        self.loader.unmount();
    }

    pub async fn load<P: MangaProvider>(
        &mut self,
        provider: &P,
        params: &CatalogParams,
    ) -> LoadOutcome<()> {
        let loader = self.loader.clone();
        match loader.run(fetch(provider, params)).await {
            LoadOutcome::Completed(state) => {
                self.state = state;
                LoadOutcome::Completed(())
            }
            LoadOutcome::Cancelled => LoadOutcome::Cancelled,
        }
    }
}

async fn fetch<P: MangaProvider>(provider: &P, params: &CatalogParams) -> ViewState<CatalogPage> {
    let doc = match provider.fetch_catalog(params).await {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!(provider = provider.name(), page = params.page, error = %e, "catalog fetch failed");
            return ViewState::from_fetch_error(&e);
        }
    };

    let lookups = Lookups {
        covers: lookup_covers(provider, &normalize::pending_cover_ids(&doc)).await,
        ..Lookups::default()
    };

    match normalize::normalize_catalog(&doc, provider.cdn_base(), &lookups) {
        Ok(page) => {
            tracing::info!(
                provider = provider.name(),
                page = params.page,
                items = page.items.len(),
                "catalog loaded"
            );
            ViewState::Ready(page)
        }
        Err(e) => ViewState::from_normalize_error(&e),
    }
}

use std::path::PathBuf;

use directories::ProjectDirs;
use hondana_api::mangadex::{ImageQuality, MangaDexClient};
use hondana_api::otruyen::OTruyenClient;
use hondana_api::{AnyProvider, CatalogParams, ProviderKind};
use serde::{Deserialize, Serialize};

use crate::error::HondanaError;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

pub const PROVIDER_ENV: &str = "HONDANA_PROVIDER";
pub const BASE_URL_ENV: &str = "HONDANA_API_BASE_URL";

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub mangadex: MangaDexConfig,
    pub otruyen: OTruyenConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    pub provider: ProviderKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MangaDexConfig {
    pub base_url: String,
    pub cdn_base: String,
    #[serde(default)]
    pub image_quality: ImageQuality,
    pub content_ratings: Vec<String>,
    pub catalog_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OTruyenConfig {
    pub base_url: String,
    pub cdn_base: String,
    pub chapter_base: String,
    pub catalog_list: String,
}

impl AppConfig {
    /// Load config: user file (if exists) or built-in defaults, then the
    /// environment overrides.
    pub fn load() -> Result<Self, HondanaError> {
        let user_path = Self::config_path();
        let mut config = if user_path.exists() {
            let user_str = std::fs::read_to_string(&user_path)?;
            Self::from_toml(&user_str)?
        } else {
            Self::from_toml(DEFAULT_CONFIG)?
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_toml(s: &str) -> Result<Self, HondanaError> {
        toml::from_str(s).map_err(|e| HondanaError::Config(e.to_string()))
    }

    /// Save current config to the user config file.
    pub fn save(&self) -> Result<(), HondanaError> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = self.to_toml()?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, HondanaError> {
        toml::to_string_pretty(self).map_err(|e| HondanaError::Config(e.to_string()))
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", "hondana")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Apply `HONDANA_PROVIDER` and `HONDANA_API_BASE_URL` when set.
    pub fn apply_env(&mut self) {
        let provider = std::env::var(PROVIDER_ENV).ok();
        let base_url = std::env::var(BASE_URL_ENV).ok();
        if let Err(e) = self.apply_overrides(provider.as_deref(), base_url.as_deref()) {
            tracing::warn!(error = %e, "ignoring {PROVIDER_ENV}");
        }
    }

    /// Switch provider and/or replace the active provider's API base URL.
    /// Blank values are ignored.
    pub fn apply_overrides(
        &mut self,
        provider: Option<&str>,
        base_url: Option<&str>,
    ) -> Result<(), HondanaError> {
        if let Some(p) = provider.filter(|p| !p.trim().is_empty()) {
            self.general.provider = p.parse().map_err(HondanaError::Config)?;
        }
        if let Some(url) = base_url.map(str::trim).filter(|u| !u.is_empty()) {
            match self.general.provider {
                ProviderKind::MangaDex => self.mangadex.base_url = url.to_string(),
                ProviderKind::OTruyen => self.otruyen.base_url = url.to_string(),
            }
        }
        Ok(())
    }

    /// Build the configured provider client.
    pub fn provider(&self) -> AnyProvider {
        match self.general.provider {
            ProviderKind::MangaDex => {
                MangaDexClient::new(&self.mangadex.base_url, &self.mangadex.cdn_base).into()
            }
            ProviderKind::OTruyen => OTruyenClient::new(
                &self.otruyen.base_url,
                &self.otruyen.cdn_base,
                &self.otruyen.chapter_base,
            )
            .into(),
        }
    }

    /// Catalog request parameters for the given page.
    pub fn catalog_params(&self, page: u32) -> CatalogParams {
        CatalogParams {
            page: page.max(1),
            limit: self.mangadex.catalog_limit,
            content_ratings: self.mangadex.content_ratings.clone(),
            list: self.otruyen.catalog_list.clone(),
        }
    }

    pub fn image_quality(&self) -> ImageQuality {
        self.mangadex.image_quality
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}

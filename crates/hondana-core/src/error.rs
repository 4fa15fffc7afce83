use hondana_api::ProviderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HondanaError {
    #[error("config error: {0}")]
    Config(String),

    #[error("API error: {0}")]
    Api(#[from] ProviderError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("load failed: {0}")]
    Load(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

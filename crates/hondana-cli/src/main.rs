mod render;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use hondana_core::screen::{CatalogScreen, DetailScreen, ReaderScreen, ViewState};
use hondana_core::{AppConfig, HondanaError, LoadOutcome, Route, ScreenLoader};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "hondana", about = "Read manga from MangaDex or OTruyen", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Upstream provider: mangadex or otruyen.
    #[arg(long, global = true)]
    provider: Option<String>,

    /// Override the provider's API base URL.
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Print the loaded view model as JSON.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a site path such as `/manga/{id}` or `/read/{manga}/{chapter}`.
    Open { path: String },

    /// Browse the catalog.
    Home {
        #[arg(long, default_value = "1")]
        page: u32,
    },

    /// Show one manga and its chapters.
    Manga { id: String },

    /// Read a chapter, by id, label or number.
    Read { manga: String, chapter: String },

    /// Print the effective configuration.
    Config,
}

// ─── Entry Point ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), HondanaError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hondana=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load()?;
    config.apply_overrides(cli.provider.as_deref(), cli.base_url.as_deref())?;
    tracing::debug!(provider = %config.general.provider, "config loaded");

    let (route, page) = match cli.command {
        Commands::Config => {
            println!("# {}", AppConfig::config_path().display());
            print!("{}", config.to_toml()?);
            return Ok(());
        }
        Commands::Open { path } => (Route::parse(&path), page_from_query(&path)),
        Commands::Home { page } => (Route::Home, page),
        Commands::Manga { id } => (Route::Manga { id }, 1),
        Commands::Read { manga, chapter } => (Route::Reader { manga, chapter }, 1),
    };

    dispatch(&config, &route, page, cli.json).await
}

async fn dispatch(
    config: &AppConfig,
    route: &Route,
    page: u32,
    json: bool,
) -> Result<(), HondanaError> {
    let provider = config.provider();

    match route {
        Route::Home => {
            let mut screen = CatalogScreen::new();
            let guard = cancel_on_ctrl_c(screen.loader());
            let outcome = screen.load(&provider, &config.catalog_params(page)).await;
            guard.abort();
            present(route, outcome, screen.state(), json, |p| {
                render::catalog(p, page.max(1))
            })
        }
        Route::Manga { id } => {
            let mut screen = DetailScreen::new();
            let guard = cancel_on_ctrl_c(screen.loader());
            let outcome = screen.load(&provider, id).await;
            guard.abort();
            present(route, outcome, screen.state(), json, render::detail)
        }
        Route::Reader { manga, chapter } => {
            let mut screen = ReaderScreen::new();
            let guard = cancel_on_ctrl_c(screen.loader());
            let outcome = screen
                .load(&provider, manga, chapter, config.image_quality())
                .await;
            guard.abort();
            present(route, outcome, screen.state(), json, render::reader)
        }
        Route::NotFound => Err(HondanaError::NotFound(route.path())),
    }
}

/// Unmount the screen when the user hits Ctrl-C.
fn cancel_on_ctrl_c(loader: ScreenLoader) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            loader.unmount();
        }
    })
}

fn present<T: Serialize>(
    route: &Route,
    outcome: LoadOutcome<()>,
    state: &ViewState<T>,
    json: bool,
    text: impl FnOnce(&T) -> String,
) -> Result<(), HondanaError> {
    if outcome == LoadOutcome::Cancelled {
        eprintln!("cancelled");
        return Ok(());
    }
    match state {
        ViewState::Ready(value) if json => {
            let out = serde_json::to_string_pretty(value)
                .map_err(|e| HondanaError::Load(e.to_string()))?;
            println!("{out}");
            Ok(())
        }
        ViewState::Ready(value) => {
            print!("{}", text(value));
            Ok(())
        }
        ViewState::NotFound => Err(HondanaError::NotFound(route.path())),
        ViewState::Failed(msg) => Err(HondanaError::Load(msg.clone())),
        ViewState::Loading => Err(HondanaError::Load(format!("{route} did not finish"))),
    }
}

/// `page` from a path's query string, e.g. `/?page=3`.
fn page_from_query(path: &str) -> u32 {
    path.split_once('?')
        .map(|(_, query)| query)
        .into_iter()
        .flat_map(|q| q.split('&'))
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "page")
        .and_then(|(_, value)| value.parse().ok())
        .unwrap_or(1)
}

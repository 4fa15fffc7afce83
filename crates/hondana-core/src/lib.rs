pub mod config;
pub mod error;
pub mod loader;
pub mod route;
pub mod screen;

pub use config::AppConfig;
pub use error::HondanaError;
pub use loader::{LoadOutcome, ScreenLoader};
pub use route::Route;

pub mod client;
pub mod error;
pub mod types;

pub use client::OTruyenClient;
pub use error::OTruyenError;

pub mod config;
pub mod db;
pub mod error;

// GitHub sync: client, rate limiting, paged resume loop
pub mod github;

// Transcript export
pub mod dump;

pub mod cli;

// Re-exports
pub use config::Settings;
pub use error::{Error, Result};

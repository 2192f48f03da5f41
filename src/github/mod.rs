pub mod client;
pub mod config;
pub mod models;
pub mod parser;
pub mod rate_limiter;
pub mod scheduler;
pub mod syncer;

pub use client::GitHubClient;
pub use config::GitHubConfig;
pub use models::Stream;
pub use parser::{parse_repository_url, RepositoryInfo};
pub use rate_limiter::RateLimiter;
pub use scheduler::SyncScheduler;
pub use syncer::{RepositorySyncReport, SyncReport, Syncer};

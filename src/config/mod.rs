use crate::error::{Error, Result};
use crate::github::GitHubConfig;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub github: GitHubConfig,
    pub dump: DumpConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct DumpConfig {
    /// Directory receiving `{owner}-{repo}.txt` transcripts
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Repositories synced concurrently; pages within one repository never are
    pub jobs: usize,
}

impl Settings {
    /// Load settings from environment variables
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:./data/issues.db".to_string());

        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .map_err(|_| Error::Config("Invalid DATABASE_MAX_CONNECTIONS value".to_string()))?;

        let output_dir = std::env::var("DUMP_DIR")
            .unwrap_or_else(|_| "./dumps".to_string())
            .into();

        let jobs = std::env::var("SYNC_JOBS")
            .unwrap_or_else(|_| "1".to_string())
            .parse()
            .map_err(|_| Error::Config("Invalid SYNC_JOBS value".to_string()))?;

        Ok(Settings {
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            github: GitHubConfig::from_env(),
            dump: DumpConfig { output_dir },
            sync: SyncConfig { jobs },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.database.max_connections == 0 {
            return Err(Error::Config(
                "DATABASE_MAX_CONNECTIONS must be non-zero".to_string(),
            ));
        }

        if self.sync.jobs == 0 {
            return Err(Error::Config("SYNC_JOBS must be non-zero".to_string()));
        }

        if self.github.client_id.is_some() != self.github.client_secret.is_some() {
            return Err(Error::Config(
                "GITHUB_CLIENT_ID and GITHUB_CLIENT_SECRET must be set together".to_string(),
            ));
        }

        if !self.github.api_url.starts_with("http://") && !self.github.api_url.starts_with("https://")
        {
            return Err(Error::Config(format!(
                "GITHUB_API_URL must be an http(s) URL: {}",
                self.github.api_url
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
            },
            github: GitHubConfig::default(),
            dump: DumpConfig {
                output_dir: "/tmp/dumps".into(),
            },
            sync: SyncConfig { jobs: 1 },
        }
    }

    #[test]
    fn test_settings_validation() {
        let mut settings = settings();
        assert!(settings.validate().is_ok());

        settings.sync.jobs = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_half_configured_oauth_app_is_rejected() {
        let mut settings = settings();
        settings.github.client_secret = Some("secret".to_string());
        assert!(matches!(settings.validate(), Err(Error::Config(_))));

        settings.github.client_id = Some("id".to_string());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_api_url_must_be_http() {
        let mut settings = settings();
        settings.github.api_url = "ftp://example.com".to_string();
        assert!(settings.validate().is_err());
    }
}

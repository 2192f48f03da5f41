use std::env;

/// Items requested per page; GitHub's maximum for both endpoints
pub const PAGE_SIZE: u32 = 100;

const DEFAULT_API_URL: &str = "https://api.github.com";

/// GitHub API configuration
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// API root, overridable for GitHub Enterprise or tests
    pub api_url: String,

    /// Optional personal access token sent as a bearer token
    pub token: Option<String>,

    /// OAuth application credentials sent as query parameters
    pub client_id: Option<String>,
    pub client_secret: Option<String>,

    /// Extra seconds to sleep past the advertised reset time
    pub rate_limit_margin_secs: u64,

    /// Connection-level retries for a single request
    pub max_retries: u32,

    pub request_timeout_secs: u64,

    pub user_agent: String,
}

impl GitHubConfig {
    /// Create a new GitHubConfig from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: env::var("GITHUB_API_URL").unwrap_or(defaults.api_url),
            token: env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()),
            client_id: env::var("GITHUB_CLIENT_ID").ok().filter(|s| !s.is_empty()),
            client_secret: env::var("GITHUB_CLIENT_SECRET")
                .ok()
                .filter(|s| !s.is_empty()),
            rate_limit_margin_secs: env::var("GITHUB_RATE_LIMIT_MARGIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.rate_limit_margin_secs),
            max_retries: env::var("GITHUB_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_retries),
            request_timeout_secs: env::var("GITHUB_REQUEST_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
            user_agent: defaults.user_agent,
        }
    }

    /// Base API URL without a trailing slash
    pub fn api_base_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    /// Query parameters carrying the OAuth application credentials, if any
    pub fn credential_params(&self) -> Vec<(&'static str, String)> {
        match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) => vec![
                ("client_id", id.clone()),
                ("client_secret", secret.clone()),
            ],
            _ => Vec::new(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() || !self.credential_params().is_empty()
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            client_id: None,
            client_secret: None,
            rate_limit_margin_secs: 10,
            max_retries: 5,
            request_timeout_secs: 30,
            user_agent: format!("issuedump/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_params_need_both_halves() {
        let mut config = GitHubConfig {
            client_id: Some("id".to_string()),
            ..GitHubConfig::default()
        };
        assert!(config.credential_params().is_empty());
        assert!(!config.is_authenticated());

        config.client_secret = Some("secret".to_string());
        let params = config.credential_params();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0], ("client_id", "id".to_string()));
        assert!(config.is_authenticated());
    }

    #[test]
    fn test_api_base_url_strips_trailing_slash() {
        let config = GitHubConfig {
            api_url: "http://127.0.0.1:1234/".to_string(),
            ..GitHubConfig::default()
        };
        assert_eq!(config.api_base_url(), "http://127.0.0.1:1234");
    }
}

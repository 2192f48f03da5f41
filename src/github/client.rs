use crate::github::{
    config::{GitHubConfig, PAGE_SIZE},
    models::{RateLimitResponse, RateLimitStatus, Stream},
    parser::RepositoryInfo,
    rate_limiter::RateLimiter,
};
use crate::{Error, Result};
use reqwest::{header, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, warn};

/// GitHub API client
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    config: GitHubConfig,
    rate_limiter: RateLimiter,
    initial_backoff: Duration,
}

impl GitHubClient {
    /// Create a new GitHub client
    pub fn new(config: GitHubConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github.v3+json"),
        );

        if let Some(token) = &config.token {
            let auth_value = format!("Bearer {token}");
            let mut value = header::HeaderValue::from_str(&auth_value)
                .map_err(|e| Error::Config(format!("Invalid GitHub token: {e}")))?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(Error::Http)?;

        let rate_limiter = RateLimiter::new(Duration::from_secs(config.rate_limit_margin_secs));

        Ok(Self {
            client,
            config,
            rate_limiter,
            initial_backoff: Duration::from_millis(500),
        })
    }

    /// Shared limiter fed by every response this client receives
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Fetch one page of a repository stream, oldest items first.
    /// The quota reported with the page is recorded in the rate limiter.
    pub async fn fetch_page<T>(&self, repo: &RepositoryInfo, stream: Stream, page: u32) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let path = format!(
            "/repos/{}/{}/{}",
            urlencoding::encode(&repo.owner),
            urlencoding::encode(&repo.repo),
            stream.endpoint()
        );

        let mut query: Vec<(&str, String)> = vec![
            ("sort", "created".to_string()),
            ("direction", "asc".to_string()),
            ("per_page", PAGE_SIZE.to_string()),
            ("page", page.to_string()),
        ];
        if stream == Stream::Issues {
            query.push(("state", "all".to_string()));
        }

        let response = self.get(&path, &query).await?;
        self.rate_limiter
            .update(RateLimitStatus::from_headers(response.headers()))
            .await;

        let items: Vec<T> = response
            .json()
            .await
            .map_err(|e| Error::Data(format!("Failed to decode {stream} page {page}: {e}")))?;

        debug!("Fetched {} {} from {} page {}", items.len(), stream, repo, page);

        Ok(items)
    }

    /// Query `/rate_limit`; this call does not count against the quota
    pub async fn rate_limit(&self) -> Result<RateLimitStatus> {
        let response = self.get("/rate_limit", &[]).await?;
        let body: RateLimitResponse = response
            .json()
            .await
            .map_err(|e| Error::Data(format!("Failed to decode rate limit response: {e}")))?;

        let status = RateLimitStatus::from(body);
        self.rate_limiter.update(status).await;
        Ok(status)
    }

    /// GET with connection-level retries. Status errors are never retried.
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Response> {
        let url = format!("{}{}", self.config.api_base_url(), path);
        let mut retries = 0;
        let mut backoff = self.initial_backoff;

        loop {
            debug!("GitHub API request: GET {}", url);

            match self.request(&url, query).send().await.map_err(Error::Http) {
                Ok(response) => return check_status(response).await,
                Err(e) if retries < self.config.max_retries && e.is_transport_retryable() => {
                    retries += 1;
                    warn!(
                        "GitHub request failed (attempt {}/{}): {}. Retrying in {:?}",
                        retries,
                        self.config.max_retries,
                        e.log_safe(),
                        backoff
                    );
                    sleep(backoff).await;
                    backoff *= 2;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn request(&self, url: &str, query: &[(&str, String)]) -> RequestBuilder {
        self.client
            .get(url)
            .query(&self.config.credential_params())
            .query(query)
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string());
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or(body);

    error!("GitHub API error: {} - {}", status, message);
    Err(Error::Api { status, message })
}

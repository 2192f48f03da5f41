use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The request never produced a response (connect failure, timeout, ...)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// GitHub answered with a non-success status
    #[error("GitHub API error ({status}): {message}")]
    Api { status: StatusCode, message: String },

    /// A response item is missing a required field or has a malformed one
    #[error("Malformed GitHub data: {0}")]
    Data(String),

    #[error("Rate limit error: {0}")]
    RateLimit(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Get a sanitized error message safe for logging
    /// Filters out potentially sensitive information
    pub fn log_safe(&self) -> String {
        match self {
            // Database errors might contain sensitive schema information
            Error::Database(_) => "Database operation failed".to_string(),
            Error::Migration(_) => "Database migration failed".to_string(),

            // reqwest errors carry the full URL, including client_secret
            Error::Http(e) => match e.status() {
                Some(status) => format!("External HTTP request failed: {status}"),
                None if e.is_timeout() => "External HTTP request timed out".to_string(),
                None if e.is_connect() => "Could not connect to GitHub".to_string(),
                None => "External HTTP request failed".to_string(),
            },
            Error::Api { status, message } => {
                let lower = message.to_lowercase();
                if lower.contains("secret") || lower.contains("token") {
                    format!("GitHub API error ({status}): details redacted")
                } else {
                    format!("GitHub API error ({status}): {message}")
                }
            }

            // These errors are generally safe to log as-is
            Error::Data(msg) => format!("Malformed GitHub data: {msg}"),
            Error::RateLimit(msg) => format!("Rate limit error: {msg}"),
            Error::Io(e) => format!("File system operation failed: {e}"),
            Error::Config(msg) => format!("Configuration error: {msg}"),
            Error::Validation(msg) => format!("Validation error: {msg}"),
        }
    }

    /// Whether the failure happened below HTTP and is worth another attempt
    pub fn is_transport_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_redacts_credentials() {
        let err = Error::Api {
            status: StatusCode::UNAUTHORIZED,
            message: "Bad client_secret supplied".to_string(),
        };
        let safe = err.log_safe();
        assert!(safe.contains("401"));
        assert!(!safe.contains("client_secret"));
    }

    #[test]
    fn test_api_errors_are_not_retryable() {
        let err = Error::Api {
            status: StatusCode::BAD_GATEWAY,
            message: "upstream".to_string(),
        };
        assert!(!err.is_transport_retryable());
        assert!(!Error::Data("missing id".to_string()).is_transport_retryable());
    }
}

//! HTTP client construction
//!
//! Builds the plain HTTPS client shared by the search and fetch tools.

use rand::seq::SliceRandom;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// HTTP tool configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    /// Maximum characters of page text kept per fetch
    pub max_content_chars: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_content_chars: 6000,
        }
    }
}

/// Errors from the web tools
#[derive(Debug, Error)]
pub enum WebError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{service} returned status {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{0} is not set. Export it or pass it on the command line.")]
    MissingCredential(&'static str),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Desktop browser user agents; one is picked per client
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36 Edg/138.0.0.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_5) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:140.0) Gecko/20100101 Firefox/140.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36",
];

pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// Create an HTTP client with the configured timeout
pub fn create_http_client(config: &HttpConfig) -> Result<Client, WebError> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(random_user_agent())
        .build()
        .map_err(|e| WebError::ClientBuild(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_content_chars, 6000);
    }

    #[test]
    fn test_random_user_agent() {
        let ua = random_user_agent();
        assert!(ua.starts_with("Mozilla/5.0"));
    }

    #[test]
    fn test_missing_credential_message() {
        let err = WebError::MissingCredential("SERPER_API_KEY");
        assert!(err.to_string().starts_with("SERPER_API_KEY is not set"));
    }
}

//! HTTP Fetcher
//!
//! Blocking `reqwest` client used by the embedding pass for remote
//! resources. Redirects are followed up to a fixed limit.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::redirect::Policy;

use crate::domain::ports::fetcher::{FetchError, Fetcher};

const MAX_REDIRECTS: usize = 5;
const TIMEOUT_SECS: u64 = 30;

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .redirect(Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .user_agent(concat!("lathe/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport {
                url: String::new(),
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let transport = |e: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self.client.get(url).send().map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        tracing::debug!(url, status = status.as_u16(), "fetched remote resource");
        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(transport)
    }
}

/// Whether an embed target names a remote resource
pub fn is_remote(target: &str) -> bool {
    target.starts_with("http://") || target.starts_with("https://") || target.starts_with("//")
}

/// Protocol-relative URLs are fetched over https
pub fn normalize_url(target: &str) -> String {
    match target.strip_prefix("//") {
        Some(rest) => format!("https://{}", rest),
        None => target.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_detection() {
        assert!(is_remote("https://cdn.example.com/a.js"));
        assert!(is_remote("//cdn.example.com/a.js"));
        assert!(!is_remote("js/app.js"));
        assert!(!is_remote("/css/site.css"));
    }

    #[test]
    fn protocol_relative_becomes_https() {
        assert_eq!(normalize_url("//x.io/a.css"), "https://x.io/a.css");
        assert_eq!(normalize_url("http://x.io/a.css"), "http://x.io/a.css");
    }
}

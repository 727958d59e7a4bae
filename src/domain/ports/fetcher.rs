//! Fetcher port - retrieval of remote resources for the embedding pass

/// Remote fetch errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Server answered with a non-success status
    Status { url: String, status: u16 },
    /// Connection, TLS or redirect failure
    Transport { url: String, message: String },
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Status { url, status } => write!(f, "GET {} returned {}", url, status),
            FetchError::Transport { url, message } => write!(f, "GET {} failed: {}", url, message),
        }
    }
}

impl std::error::Error for FetchError {}

pub trait Fetcher: Send + Sync {
    /// Fetch `url`, following redirects
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Fetcher that refuses every request (offline builds, tests)
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineFetcher;

impl Fetcher for OfflineFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        Err(FetchError::Transport {
            url: url.to_string(),
            message: "network access disabled".to_string(),
        })
    }
}

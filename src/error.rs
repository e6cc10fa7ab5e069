use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search credentials missing: set PROFILES_API_KEY and PROFILES_CSE_ID")]
    MissingCredentials,
    #[error("search request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("bad response from search API: {0}")]
    BadResponse(String),
    #[error("search response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("download task aborted: {0}")]
    Aborted(String),
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

//! Enrichment Search Module
//!
//! Cultural-heritage lookups used to enrich a finished pattern analysis:
//! - Europeana (primary) - European museum and archive records, needs an API key
//! - Met Museum (secondary) - The Met's open collection API, no key needed
//!
//! Callers treat every failure as "no results"; errors exist for logging.

pub mod europeana;
pub mod met_museum;

pub use europeana::EuropeanaClient;
pub use met_museum::MetMuseumClient;

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;

const ENRICHMENT_TIMEOUT: Duration = Duration::from_secs(20);

/// Errors that can occur during enrichment lookups
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    RequestFailed(String),

    #[error("Search service returned HTTP {0}")]
    Status(u16),

    #[error("Failed to parse search results: {0}")]
    ParseError(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SearchError::ParseError(err.to_string())
        } else {
            SearchError::RequestFailed(err.to_string())
        }
    }
}

/// HTTP client shared by the enrichment proxies.
pub fn http_client() -> Result<Client, SearchError> {
    Client::builder()
        .timeout(ENRICHMENT_TIMEOUT)
        .build()
        .map_err(|e| SearchError::RequestFailed(e.to_string()))
}

//! Europeana Search API client
//!
//! https://pro.europeana.eu/page/search
//!
//! The relay hands the decoded response back to the app untouched, so this
//! client deals in `serde_json::Value` instead of typed records.

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

use super::SearchError;
use crate::config::EnrichmentConfig;

pub struct EuropeanaClient {
    client: Client,
    api_key: String,
    base_url: String,
    rows: u32,
}

impl EuropeanaClient {
    /// Returns `None` when no API key is configured.
    pub fn from_config(config: &EnrichmentConfig, client: Client) -> Option<Self> {
        let api_key = config.europeana_api_key.as_deref()?.trim();
        if api_key.is_empty() {
            return None;
        }

        Some(Self {
            client,
            api_key: api_key.to_string(),
            base_url: config.europeana_base_url.trim_end_matches('/').to_string(),
            rows: config.europeana_rows,
        })
    }

    /// Search openly reusable records that carry media.
    pub async fn search(&self, query: &str) -> Result<Value, SearchError> {
        info!(query = %query, "Searching Europeana");

        let url = format!("{}/record/v2/search.json", self.base_url);
        let rows = self.rows.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("query", query),
                ("wskey", self.api_key.as_str()),
                ("rows", rows.as_str()),
                ("profile", "rich"),
                ("media", "true"),
                ("reusability", "open"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        let body: Value = response.json().await?;
        let items = body.get("items").and_then(Value::as_array).map_or(0, Vec::len);
        debug!(items, "Europeana response received");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use mockito::Matcher;
    use serde_json::json;

    fn client_for(server: &mockito::Server) -> EuropeanaClient {
        let mut config = Config::default().enrichment;
        config.europeana_api_key = Some("wskey-test".to_string());
        config.europeana_base_url = server.url();
        EuropeanaClient::from_config(&config, Client::new()).unwrap()
    }

    #[test]
    fn test_requires_api_key() {
        let mut config = Config::default().enrichment;
        assert!(EuropeanaClient::from_config(&config, Client::new()).is_none());

        config.europeana_api_key = Some("   ".to_string());
        assert!(EuropeanaClient::from_config(&config, Client::new()).is_none());
    }

    #[tokio::test]
    async fn test_search_sends_fixed_parameters() {
        let mut server = mockito::Server::new_async().await;
        let body = json!({"success": true, "itemsCount": 1, "items": [{"id": "/9200/abc", "title": ["Paisley shawl"]}]});
        let mock = server
            .mock("GET", "/record/v2/search.json")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("query".into(), "paisley shawl".into()),
                Matcher::UrlEncoded("wskey".into(), "wskey-test".into()),
                Matcher::UrlEncoded("rows".into(), "5".into()),
                Matcher::UrlEncoded("profile".into(), "rich".into()),
                Matcher::UrlEncoded("media".into(), "true".into()),
                Matcher::UrlEncoded("reusability".into(), "open".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let result = client_for(&server).search("paisley shawl").await.unwrap();

        mock.assert_async().await;
        assert_eq!(result, body);
    }

    #[tokio::test]
    async fn test_body_without_items_is_returned_untouched() {
        let mut server = mockito::Server::new_async().await;
        let body = r#"{"success":true,"itemsCount":0,"totalResults":0}"#;
        let _mock = server
            .mock("GET", "/record/v2/search.json")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;

        let result = client_for(&server).search("brocade").await.unwrap();

        // Upstream key order survives the round trip
        assert_eq!(serde_json::to_string(&result).unwrap(), body);
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/record/v2/search.json")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"success": false, "error": "Invalid API key"}"#)
            .create_async()
            .await;

        let err = client_for(&server).search("ikat").await.unwrap_err();
        assert!(matches!(err, SearchError::Status(401)));
    }
}

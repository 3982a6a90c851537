//! Metropolitan Museum of Art collection API client
//!
//! https://metmuseum.github.io/
//!
//! A search only returns object ids; each object is then fetched on its own.
//! Lookups run concurrently and individual failures are dropped.

use futures::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::SearchError;
use crate::config::EnrichmentConfig;

#[derive(Debug, Deserialize)]
struct MetSearchResponse {
    #[serde(default)]
    total: u64,
    #[serde(rename = "objectIDs", default)]
    object_ids: Option<Vec<u64>>,
}

pub struct MetMuseumClient {
    client: Client,
    base_url: String,
    max_results: usize,
}

impl MetMuseumClient {
    pub fn from_config(config: &EnrichmentConfig, client: Client) -> Self {
        Self {
            client,
            base_url: config.met_base_url.trim_end_matches('/').to_string(),
            max_results: config.met_max_results,
        }
    }

    /// Search objects with images, optionally narrowed by medium
    /// (e.g. "Textiles"), and return up to `max_results` full records in
    /// search order.
    pub async fn search(&self, query: &str, medium: Option<&str>) -> Result<Vec<Value>, SearchError> {
        info!(query = %query, medium = ?medium, "Searching Met Museum collection");

        let mut params = vec![("q", query), ("hasImages", "true")];
        if let Some(medium) = medium {
            params.push(("medium", medium));
        }

        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        let search: MetSearchResponse = response.json().await?;
        let ids: Vec<u64> = search
            .object_ids
            .unwrap_or_default()
            .into_iter()
            .take(self.max_results)
            .collect();
        debug!(total = search.total, fetching = ids.len(), "Met search returned");

        let lookups = ids.iter().map(|id| self.fetch_object(*id));
        let items = join_all(lookups)
            .await
            .into_iter()
            .zip(&ids)
            .filter_map(|(result, id)| match result {
                Ok(object) => Some(object),
                Err(e) => {
                    warn!(object_id = id, error = %e, "Dropping Met object");
                    None
                }
            })
            .collect();

        Ok(items)
    }

    async fn fetch_object(&self, id: u64) -> Result<Value, SearchError> {
        let response = self
            .client
            .get(format!("{}/objects/{}", self.base_url, id))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use mockito::Matcher;
    use serde_json::json;

    fn client_for(server: &mockito::Server) -> MetMuseumClient {
        let mut config = Config::default().enrichment;
        config.met_base_url = server.url();
        MetMuseumClient::from_config(&config, Client::new())
    }

    #[tokio::test]
    async fn test_fetches_first_objects_in_order_and_skips_failures() {
        let mut server = mockito::Server::new_async().await;
        let search = server
            .mock("GET", "/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "kilim".into()),
                Matcher::UrlEncoded("hasImages".into(), "true".into()),
                Matcher::UrlEncoded("medium".into(), "Textiles".into()),
            ]))
            .with_status(200)
            .with_body(json!({"total": 7, "objectIDs": [11, 12, 13, 14, 15, 16, 17]}).to_string())
            .create_async()
            .await;

        let mut objects = Vec::new();
        for id in [11, 12, 14, 15] {
            objects.push(
                server
                    .mock("GET", format!("/objects/{}", id).as_str())
                    .with_status(200)
                    .with_body(json!({"objectID": id, "title": format!("Kilim {}", id)}).to_string())
                    .create_async()
                    .await,
            );
        }
        let _missing = server
            .mock("GET", "/objects/13")
            .with_status(404)
            .with_body(r#"{"message": "Not a valid object"}"#)
            .create_async()
            .await;
        let beyond_limit = server
            .mock("GET", "/objects/16")
            .expect(0)
            .create_async()
            .await;

        let items = client_for(&server).search("kilim", Some("Textiles")).await.unwrap();

        search.assert_async().await;
        beyond_limit.assert_async().await;
        let ids: Vec<u64> = items.iter().map(|item| item["objectID"].as_u64().unwrap()).collect();
        assert_eq!(ids, vec![11, 12, 14, 15]);
    }

    #[tokio::test]
    async fn test_no_matches_yields_empty_list() {
        let mut server = mockito::Server::new_async().await;
        let _search = server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"total": 0, "objectIDs": null}"#)
            .create_async()
            .await;

        let items = client_for(&server).search("nothing", None).await.unwrap();
        assert!(items.is_empty());
    }
}

//! Enrichment proxies
//!
//! Both endpoints degrade to `{"items": []}` on any upstream problem so the
//! app can render an analysis without its enrichment cards.

use axum::{
    Router,
    routing::get,
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use crate::models::{AppState, EnrichmentItems, EuropeanaQuery, MetMuseumQuery};
use crate::types::AppError;
use tracing::{error, warn};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/enrichment/europeana", get(europeana_search))
        .route("/api/enrichment/met", get(met_search))
        .with_state(state)
}

fn required_query(q: Option<String>) -> Result<String, AppError> {
    q.map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::InvalidRequest("Missing query parameter 'q'".to_string()))
}

/// GET /api/enrichment/europeana?q=
async fn europeana_search(
    State(state): State<AppState>,
    Query(params): Query<EuropeanaQuery>,
) -> Response {
    // No key means the feature is off, not an error
    let Some(client) = state.europeana.as_ref() else {
        return Json(EnrichmentItems::empty()).into_response();
    };

    let query = match required_query(params.q) {
        Ok(query) => query,
        Err(e) => return e.into_response(),
    };

    match client.search(&query).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            error!(error = %e, "Europeana error");
            Json(EnrichmentItems::empty()).into_response()
        }
    }
}

/// GET /api/enrichment/met?q=&medium=
async fn met_search(
    State(state): State<AppState>,
    Query(params): Query<MetMuseumQuery>,
) -> Response {
    let query = match required_query(params.q) {
        Ok(query) => query,
        Err(e) => return e.into_response(),
    };
    let medium = params.medium.filter(|m| !m.trim().is_empty());

    match state.met_museum.search(&query, medium.as_deref()).await {
        Ok(items) => Json(EnrichmentItems { items }).into_response(),
        Err(e) => {
            warn!(error = %e, "Met Museum error");
            Json(EnrichmentItems::empty()).into_response()
        }
    }
}

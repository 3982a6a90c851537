use std::sync::Arc;

use crate::config::Config;
use crate::llm::LLMAdapter;
use crate::queue::{AnalysisWorker, JobStore};
use crate::search::{EuropeanaClient, MetMuseumClient};
use crate::types::AppResult;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub jobs: JobStore,
    pub worker: AnalysisWorker,
    pub europeana: Option<Arc<EuropeanaClient>>,
    pub met_museum: Arc<MetMuseumClient>,
}

impl AppState {
    /// Wire the relay around an LLM adapter. Production passes the
    /// Anthropic adapter; tests pass their own.
    pub fn new(config: Config, llm: Arc<dyn LLMAdapter>) -> AppResult<Self> {
        let jobs = JobStore::new(config.jobs.retention());
        let worker = AnalysisWorker::new(jobs.clone(), llm, config.llm.clone(), config.image.clone());

        let http = crate::search::http_client()
            .map_err(|e| crate::types::AppError::Internal(e.to_string()))?;
        let europeana = EuropeanaClient::from_config(&config.enrichment, http.clone()).map(Arc::new);
        let met_museum = Arc::new(MetMuseumClient::from_config(&config.enrichment, http));

        Ok(Self {
            config,
            jobs,
            worker,
            europeana,
            met_museum,
        })
    }

    pub fn from_config(config: Config) -> AppResult<Self> {
        let llm = crate::llm::create_adapter(&config.llm)?;
        Self::new(config, llm)
    }
}

// API Request/Response types

/// Body of `POST /api/analyze`. The image is optional here so a missing
/// field reaches the handler and gets the relay's own 400 message.
#[derive(Debug, Default, serde::Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct AnalyzeResponse {
    #[serde(rename = "jobId")]
    pub job_id: String,
}

#[derive(Debug, serde::Deserialize)]
pub struct EuropeanaQuery {
    pub q: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
pub struct MetMuseumQuery {
    pub q: Option<String>,
    pub medium: Option<String>,
}

/// `{ "items": [...] }` envelope shared by the enrichment endpoints.
#[derive(Debug, serde::Serialize)]
pub struct EnrichmentItems {
    pub items: Vec<serde_json::Value>,
}

impl EnrichmentItems {
    pub fn empty() -> Self {
        Self { items: Vec::new() }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub jobs: usize,
}

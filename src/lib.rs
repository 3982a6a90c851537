// Cipher relay - job-polling bridge between the Cipher app and a vision model

pub mod config;
pub mod models;
pub mod types;
pub mod llm;
pub mod analysis;  // Image transcoding, prompt and response repair
pub mod queue;     // In-memory jobs and the background worker
pub mod search;    // Europeana and Met Museum enrichment
pub mod routes;
pub mod middleware;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}

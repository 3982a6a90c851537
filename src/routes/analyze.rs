use axum::{
    Router,
    routing::{get, post},
    Json,
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
};
use crate::models::{AnalyzeRequest, AnalyzeResponse, AppState};
use crate::queue::Job;
use crate::types::{AppError, AppResult};
use tracing::{info, warn};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/analyze", post(submit_analysis))
        .route("/api/analyze/{job_id}", get(get_job_status))
        .with_state(state)
}

/// POST /api/analyze - register a job and return its id before any work starts
async fn submit_analysis(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> AppResult<Json<AnalyzeResponse>> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return Err(AppError::PayloadTooLarge(rejection.body_text()));
        }
        Err(rejection) => {
            warn!(reason = %rejection.body_text(), "Unreadable analyze request");
            AnalyzeRequest::default()
        }
    };

    let image = request
        .image
        .filter(|image| !image.trim().is_empty())
        .ok_or_else(|| AppError::InvalidRequest("Missing image data".to_string()))?;

    // Insert before responding so an immediate poll finds the job
    let job_id = state.jobs.create().await;
    info!(job_id = %job_id, size_kb = image.len() / 1024, "Received image");

    state.worker.spawn(job_id.clone(), image);

    Ok(Json(AnalyzeResponse { job_id }))
}

/// GET /api/analyze/{job_id} - current status, result or error
async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<Json<Job>> {
    state
        .jobs
        .get(&job_id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))
}

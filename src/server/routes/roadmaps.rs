//! Study-plan run endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};

use crate::persistence::Roadmap;
use crate::pipeline::context::RunRequest;
use crate::server::state::AppState;
use crate::server::types::{ErrorResponse, RunStartedResponse};

fn error(status: StatusCode, code: &str, message: String) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: message,
            code: code.to_string(),
        }),
    )
}

/// POST /api/roadmaps - Start a generation run
pub async fn create_roadmap(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<RunRequest>,
) -> Result<(StatusCode, Json<RunStartedResponse>), (StatusCode, Json<ErrorResponse>)> {
    state
        .auth
        .verify(&headers)
        .map_err(|e| error(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", e.to_string()))?;

    if !(1..=6).contains(&request.duration_months) {
        return Err(error(
            StatusCode::BAD_REQUEST,
            "INVALID_DURATION",
            format!(
                "duration_months must be between 1 and 6, got {}",
                request.duration_months
            ),
        ));
    }
    if request.topic.trim().is_empty() {
        return Err(error(
            StatusCode::BAD_REQUEST,
            "INVALID_TOPIC",
            "topic must not be empty".to_string(),
        ));
    }

    // Register the event channel before the run can emit anything
    let run_id = uuid::Uuid::new_v4().to_string();
    let events = state.get_event_sender(&run_id).await;
    state.coordinator.spawn_run(run_id.clone(), request, events);

    Ok((StatusCode::ACCEPTED, Json(RunStartedResponse { run_id })))
}

/// GET /api/roadmaps/:id - Fetch a persisted roadmap with its hierarchy
pub async fn get_roadmap(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(roadmap_id): Path<String>,
) -> Result<Json<Roadmap>, (StatusCode, Json<ErrorResponse>)> {
    state
        .auth
        .verify(&headers)
        .map_err(|e| error(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", e.to_string()))?;

    state.db.get_roadmap(&roadmap_id).await.map(Json).map_err(|e| {
        error(
            StatusCode::NOT_FOUND,
            "ROADMAP_NOT_FOUND",
            format!("{}: {}", roadmap_id, e),
        )
    })
}

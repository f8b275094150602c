//! Interview protocol endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};

use crate::server::state::AppState;
use crate::server::types::{
    ErrorResponse, StartInterviewRequest, StartInterviewResponse, SubmitAnswersRequest,
    SubmitAnswersResponse,
};
use crate::interview::{SubmitError, SubmitOutcome};

fn error(status: StatusCode, code: &str, message: String) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: message,
            code: code.to_string(),
        }),
    )
}

/// POST /api/interviews - Open an interview session
pub async fn start_interview(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<StartInterviewRequest>,
) -> Result<(StatusCode, Json<StartInterviewResponse>), (StatusCode, Json<ErrorResponse>)> {
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

    let session = state
        .interviews
        .start(&request.topic, request.mode, request.duration_months);

    let response = StartInterviewResponse {
        session_id: session.id.clone(),
        questions: session.pending_questions.clone(),
        round: session.current_round,
    };

    state.sessions.insert(session).await;

    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/interviews/:id/answers - Submit one answer batch
pub async fn submit_answers(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
    Json(request): Json<SubmitAnswersRequest>,
) -> Result<Json<SubmitAnswersResponse>, (StatusCode, Json<ErrorResponse>)> {
    state
        .auth
        .verify(&headers)
        .map_err(|e| error(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", e.to_string()))?;

    let entry = state.sessions.get(&session_id).await.ok_or_else(|| {
        error(
            StatusCode::NOT_FOUND,
            "SESSION_NOT_FOUND",
            format!("Session not found: {}", session_id),
        )
    })?;

    // Per-key lock: concurrent submits on the same session serialize here
    let mut session = entry.lock().await;

    let outcome = state
        .interviews
        .submit(&mut session, &request.answers)
        .await
        .map_err(|e| match e {
            SubmitError::AlreadyCompleted => {
                error(StatusCode::CONFLICT, "ALREADY_COMPLETED", e.to_string())
            }
            SubmitError::AlreadyTerminated(_) => {
                error(StatusCode::CONFLICT, "ALREADY_TERMINATED", e.to_string())
            }
        })?;

    let response = match outcome {
        SubmitOutcome::MoreQuestions { round, questions } => SubmitAnswersResponse {
            status: "followup_needed".to_string(),
            round: Some(round),
            followup_questions: Some(questions),
            interview_context: None,
            key_insights: None,
            schedule: None,
            warning: None,
        },
        SubmitOutcome::Completed {
            round,
            context,
            key_insights,
            schedule,
        } => SubmitAnswersResponse {
            status: "completed".to_string(),
            round: Some(round),
            followup_questions: None,
            interview_context: Some(context),
            key_insights: Some(key_insights),
            schedule: Some(schedule),
            warning: None,
        },
        SubmitOutcome::Terminated { reason } => SubmitAnswersResponse {
            status: "terminated".to_string(),
            round: None,
            followup_questions: None,
            interview_context: None,
            key_insights: None,
            schedule: None,
            warning: Some(format!("Interview ended early: {}", reason)),
        },
    };

    Ok(Json(response))
}

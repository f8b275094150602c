//! Request/response DTOs for the HTTP API.

use serde::{Deserialize, Serialize};

use crate::interview::{Question, SubmittedAnswer};
use crate::pipeline::context::{RoadmapMode, ScheduleConstraints};

/// Response for a started run
#[derive(Debug, Serialize)]
pub struct RunStartedResponse {
    pub run_id: String,
}

/// Request to open an interview
#[derive(Debug, Deserialize)]
pub struct StartInterviewRequest {
    pub topic: String,
    pub mode: RoadmapMode,
    pub duration_months: u32,
}

/// Response for an opened interview
#[derive(Debug, Serialize)]
pub struct StartInterviewResponse {
    pub session_id: String,
    pub questions: Vec<Question>,
    pub round: u32,
}

/// Request carrying one answer batch
#[derive(Debug, Deserialize)]
pub struct SubmitAnswersRequest {
    pub answers: Vec<SubmittedAnswer>,
}

/// Response for one submitted batch
#[derive(Debug, Serialize)]
pub struct SubmitAnswersResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followup_questions: Option<Vec<Question>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interview_context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_insights: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduleConstraints>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

//! Interview session state.
//!
//! Three ordered stages, each with a bounded follow-up sub-loop (the
//! "probing" sub-state), invalid-answer tracking that runs independently of
//! quality scoring, and two terminal states. All transition logic lives in
//! the [`InterviewService`](super::InterviewService); this module owns the
//! data.

use serde::{Deserialize, Serialize};

use crate::pipeline::context::{RoadmapMode, ScheduleConstraints};

use super::evaluator::Evaluation;
use super::questions::Question;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStage {
    Stage1,
    Stage2,
    Stage3,
    Completed,
    Terminated,
}

impl InterviewStage {
    pub fn next(&self) -> InterviewStage {
        match self {
            InterviewStage::Stage1 => InterviewStage::Stage2,
            InterviewStage::Stage2 => InterviewStage::Stage3,
            InterviewStage::Stage3 => InterviewStage::Completed,
            InterviewStage::Completed => InterviewStage::Completed,
            InterviewStage::Terminated => InterviewStage::Terminated,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, InterviewStage::Completed | InterviewStage::Terminated)
    }
}

/// One answered question with its evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question: Question,
    pub answer: String,
    pub evaluation: Evaluation,
}

/// One submitted batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round: u32,
    pub stage: InterviewStage,
    pub answers: Vec<AnswerRecord>,
}

#[derive(Debug, Clone)]
pub struct InterviewSession {
    pub id: String,
    pub topic: String,
    pub mode: RoadmapMode,
    pub duration_months: u32,

    pub stage: InterviewStage,
    pub current_round: u32,
    /// Follow-up batches already spent in the current stage
    pub followups_this_stage: u32,
    /// The in-flight round's question set; replaced on every transition
    pub pending_questions: Vec<Question>,

    pub history: Vec<RoundRecord>,
    pub invalid_history: Vec<String>,
    pub invalid_count: u32,
    pub consecutive_invalid: u32,

    pub is_terminated: bool,
    pub termination_reason: Option<String>,

    pub compiled_context: Option<String>,
    pub key_insights: Vec<String>,
    pub extracted_schedule: Option<ScheduleConstraints>,
}

impl InterviewSession {
    pub fn new(topic: String, mode: RoadmapMode, duration_months: u32) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            topic,
            mode,
            duration_months,
            stage: InterviewStage::Stage1,
            current_round: 1,
            followups_this_stage: 0,
            pending_questions: Vec::new(),
            history: Vec::new(),
            invalid_history: Vec::new(),
            invalid_count: 0,
            consecutive_invalid: 0,
            is_terminated: false,
            termination_reason: None,
            compiled_context: None,
            key_insights: Vec::new(),
            extracted_schedule: None,
        }
    }

    /// Whether the current stage is in its follow-up sub-loop
    pub fn is_probing(&self) -> bool {
        self.followups_this_stage > 0 && !self.stage.is_terminal()
    }

    /// Answers given during one stage, oldest first
    pub fn answers_for_stage(&self, stage: InterviewStage) -> Vec<&AnswerRecord> {
        self.history
            .iter()
            .filter(|round| round.stage == stage)
            .flat_map(|round| round.answers.iter())
            .collect()
    }
}

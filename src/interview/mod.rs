//! Multi-round interview protocol.
//!
//! The service owns all transitions: it evaluates submitted batches, runs
//! the bounded follow-up sub-loop, tracks invalid answers independently of
//! scoring, and compiles the final learner context when the last stage
//! completes.

pub mod compiler;
pub mod evaluator;
pub mod questions;
pub mod session;

pub use compiler::{CompiledInterview, ContextCompiler};
pub use evaluator::{AnswerEvaluator, Evaluation};
pub use questions::{Question, QuestionType};
pub use session::{InterviewSession, InterviewStage};

use std::sync::Arc;

use crate::config::PolicyConfig;
use crate::llm::LlmGateway;
use crate::pipeline::context::{RoadmapMode, ScheduleConstraints};

use session::{AnswerRecord, RoundRecord};

/// One answer in a submitted batch
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: String,
    pub answer: String,
}

/// Result of one submit
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// Follow-ups for the current stage, or the next stage's questions
    MoreQuestions { round: u32, questions: Vec<Question> },
    Completed {
        round: u32,
        context: String,
        key_insights: Vec<String>,
        schedule: ScheduleConstraints,
    },
    Terminated { reason: String },
}

/// Submits against a session already in a terminal state are rejected
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("interview already completed")]
    AlreadyCompleted,
    #[error("interview terminated: {0}")]
    AlreadyTerminated(String),
}

pub struct InterviewService {
    evaluator: AnswerEvaluator,
    compiler: ContextCompiler,
    policy: PolicyConfig,
}

impl InterviewService {
    pub fn new(gateway: Arc<dyn LlmGateway>, policy: PolicyConfig) -> Self {
        Self {
            evaluator: AnswerEvaluator::new(Arc::clone(&gateway), policy.followup_threshold),
            compiler: ContextCompiler::new(gateway),
            policy,
        }
    }

    /// Open a session at Stage 1 with its question bank pending
    pub fn start(&self, topic: &str, mode: RoadmapMode, duration_months: u32) -> InterviewSession {
        let mut session = InterviewSession::new(topic.to_string(), mode, duration_months);
        session.pending_questions = questions::bank_for_stage(InterviewStage::Stage1, topic);
        session
    }

    /// Process one answer batch for the session's in-flight round
    pub async fn submit(
        &self,
        session: &mut InterviewSession,
        answers: &[SubmittedAnswer],
    ) -> Result<SubmitOutcome, SubmitError> {
        if session.is_terminated {
            return Err(SubmitError::AlreadyTerminated(
                session
                    .termination_reason
                    .clone()
                    .unwrap_or_else(|| "terminated".to_string()),
            ));
        }
        if session.stage == InterviewStage::Completed {
            return Err(SubmitError::AlreadyCompleted);
        }

        // Pair every pending question with its submitted answer (missing
        // answers count as empty, i.e. non-answers)
        let paired: Vec<(Question, String)> = session
            .pending_questions
            .iter()
            .map(|question| {
                let answer = answers
                    .iter()
                    .find(|a| a.question_id == question.id)
                    .map(|a| a.answer.clone())
                    .unwrap_or_default();
                (question.clone(), answer)
            })
            .collect();

        // Invalid-answer tracking runs independently of quality scoring
        let invalid: Vec<&str> = paired
            .iter()
            .filter(|(_, answer)| evaluator::is_non_answer(answer))
            .map(|(_, answer)| answer.as_str())
            .collect();
        session.invalid_count += invalid.len() as u32;
        session
            .invalid_history
            .extend(invalid.iter().map(|a| a.to_string()));
        if invalid.len() * 2 > paired.len() {
            session.consecutive_invalid += 1;
        } else {
            session.consecutive_invalid = 0;
        }

        let mut records = Vec::with_capacity(paired.len());
        for (question, answer) in paired {
            let evaluation = self
                .evaluator
                .evaluate(&session.topic, &question, &answer)
                .await;
            records.push(AnswerRecord {
                question,
                answer,
                evaluation,
            });
        }

        let batch_average = if records.is_empty() {
            0.0
        } else {
            records.iter().map(|r| r.evaluation.average).sum::<f32>() / records.len() as f32
        };

        session.history.push(RoundRecord {
            round: session.current_round,
            stage: session.stage,
            answers: records,
        });

        if session.consecutive_invalid >= self.policy.consecutive_invalid_limit
            || session.invalid_count >= self.policy.invalid_limit
        {
            let reason = format!(
                "too many invalid answers ({} total, {} consecutive batches)",
                session.invalid_count, session.consecutive_invalid
            );
            session.is_terminated = true;
            session.stage = InterviewStage::Terminated;
            session.termination_reason = Some(reason.clone());
            session.pending_questions.clear();
            tracing::warn!("interview {} terminated: {}", session.id, reason);
            return Ok(SubmitOutcome::Terminated { reason });
        }

        let followups_allowed = session.followups_this_stage < self.policy.max_followups_per_stage
            && session.current_round < self.policy.max_rounds;

        if batch_average < self.policy.followup_threshold && followups_allowed {
            return Ok(self.probe(session).await);
        }

        self.advance(session).await
    }

    /// Stay in the current stage and ask follow-ups for the weak answers
    async fn probe(&self, session: &mut InterviewSession) -> SubmitOutcome {
        let last_round = session
            .history
            .last()
            .map(|round| round.answers.clone())
            .unwrap_or_default();

        let mut followups = Vec::new();
        for (i, record) in last_round
            .iter()
            .filter(|r| r.evaluation.average < self.policy.followup_threshold)
            .enumerate()
        {
            let text = self
                .evaluator
                .followup_for(&record.question, &record.answer)
                .await;
            followups.push(Question::text(
                &format!("{}-f{}-{}", record.question.id, session.followups_this_stage + 1, i + 1),
                text.clone(),
                None,
            ));

            // Remember the follow-up on the record that provoked it
            if let Some(round) = session.history.last_mut() {
                if let Some(original) = round
                    .answers
                    .iter_mut()
                    .find(|r| r.question.id == record.question.id)
                {
                    original.evaluation.followup_question = Some(text);
                }
            }
        }

        session.followups_this_stage += 1;
        session.current_round += 1;
        session.pending_questions = followups.clone();

        SubmitOutcome::MoreQuestions {
            round: session.current_round,
            questions: followups,
        }
    }

    /// Advance to the next stage, compiling the context when Stage 3 exits
    async fn advance(
        &self,
        session: &mut InterviewSession,
    ) -> Result<SubmitOutcome, SubmitError> {
        let next = session.stage.next();
        session.followups_this_stage = 0;

        if next == InterviewStage::Completed {
            session.stage = InterviewStage::Completed;
            session.current_round = (session.current_round + 1).min(self.policy.max_rounds);
            session.pending_questions.clear();

            let compiled = self.compiler.compile(session).await;
            session.compiled_context = Some(compiled.context.clone());
            session.key_insights = compiled.key_insights.clone();
            session.extracted_schedule = Some(compiled.schedule.clone());

            return Ok(SubmitOutcome::Completed {
                round: session.current_round,
                context: compiled.context,
                key_insights: compiled.key_insights,
                schedule: compiled.schedule,
            });
        }

        session.stage = next;
        session.current_round = (session.current_round + 1).min(self.policy.max_rounds);
        session.pending_questions = questions::bank_for_stage(next, &session.topic);

        Ok(SubmitOutcome::MoreQuestions {
            round: session.current_round,
            questions: session.pending_questions.clone(),
        })
    }
}

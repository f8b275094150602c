//! Answer-quality evaluation.
//!
//! Two-tier like every other model-facing step: the AI scoring path falls
//! back to a deterministic heuristic so a dead gateway still lets an
//! interview finish. Non-answers never reach the gateway at all.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::llm::{GatewayError, LlmGateway};
use crate::prompts;

use super::questions::Question;

/// Scores for one answer, in [0,1] each
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub specificity: f32,
    pub relevance: f32,
    pub completeness: f32,
    pub average: f32,
    pub needs_followup: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followup_question: Option<String>,
    pub insights: String,
}

impl Evaluation {
    fn from_scores(
        specificity: f32,
        relevance: f32,
        completeness: f32,
        threshold: f32,
        insights: String,
    ) -> Self {
        let specificity = specificity.clamp(0.0, 1.0);
        let relevance = relevance.clamp(0.0, 1.0);
        let completeness = completeness.clamp(0.0, 1.0);
        let average = (specificity + relevance + completeness) / 3.0;

        Self {
            specificity,
            relevance,
            completeness,
            average,
            needs_followup: average < threshold,
            followup_question: None,
            insights,
        }
    }

    fn zero() -> Self {
        Self {
            specificity: 0.0,
            relevance: 0.0,
            completeness: 0.0,
            average: 0.0,
            needs_followup: true,
            followup_question: None,
            insights: String::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ScorePayload {
    specificity: f32,
    relevance: f32,
    completeness: f32,
    #[serde(default)]
    insights: String,
}

pub struct AnswerEvaluator {
    gateway: Arc<dyn LlmGateway>,
    threshold: f32,
}

impl AnswerEvaluator {
    pub fn new(gateway: Arc<dyn LlmGateway>, threshold: f32) -> Self {
        Self { gateway, threshold }
    }

    pub async fn evaluate(&self, topic: &str, question: &Question, answer: &str) -> Evaluation {
        if is_non_answer(answer) {
            return Evaluation::zero();
        }

        let result = self
            .gateway
            .invoke_structured(
                &prompts::evaluation_prompt(topic, &question.question, answer),
                0.2,
            )
            .await
            .and_then(|value| {
                serde_json::from_value::<ScorePayload>(value)
                    .map_err(|e| GatewayError::Parse(e.to_string()))
            });

        match result {
            Ok(payload) => Evaluation::from_scores(
                payload.specificity,
                payload.relevance,
                payload.completeness,
                self.threshold,
                payload.insights,
            ),
            Err(e) => {
                tracing::debug!("AI evaluation unavailable, scoring heuristically: {}", e);
                heuristic_evaluation(question, answer, self.threshold)
            }
        }
    }

    /// Produce a follow-up question for a weak answer
    pub async fn followup_for(&self, question: &Question, answer: &str) -> String {
        match self
            .gateway
            .invoke(&prompts::followup_prompt(&question.question, answer), 0.5)
            .await
        {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            _ => format!(
                "Could you go into more detail? Earlier you were asked: {}",
                question.question
            ),
        }
    }
}

/// Deterministic scoring used when the gateway is unusable
pub fn heuristic_evaluation(question: &Question, answer: &str, threshold: f32) -> Evaluation {
    if is_non_answer(answer) {
        return Evaluation::zero();
    }

    let words: Vec<&str> = answer.split_whitespace().collect();
    let word_count = words.len() as f32;

    let has_digit = answer.chars().any(|c| c.is_ascii_digit());
    let sentences = answer
        .split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count();

    let specificity = (word_count / 20.0 + if has_digit { 0.2 } else { 0.0 }).min(1.0);

    let question_terms: Vec<String> = question
        .question
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| w.len() > 3)
        .collect();
    let overlaps = words.iter().any(|w| {
        let w = w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
        w.len() > 3 && question_terms.contains(&w)
    });
    let relevance = 0.4
        + if overlaps { 0.4 } else { 0.0 }
        + if word_count >= 12.0 { 0.2 } else { 0.0 };

    let completeness =
        (word_count / 30.0 + if sentences >= 2 { 0.2 } else { 0.0 }).min(1.0);

    Evaluation::from_scores(specificity, relevance, completeness, threshold, String::new())
}

/// Detect non-answers: empty, placeholder or incoherent input
pub fn is_non_answer(answer: &str) -> bool {
    let trimmed = answer.trim();
    if trimmed.len() < 2 {
        return true;
    }

    const PLACEHOLDERS: [&str; 10] = [
        "idk",
        "i don't know",
        "i dont know",
        "dont know",
        "n/a",
        "na",
        "none",
        "nothing",
        "asdf",
        "test",
    ];
    let lowered = trimmed.to_lowercase();
    if PLACEHOLDERS.contains(&lowered.as_str()) {
        return true;
    }

    if !trimmed.chars().any(|c| c.is_alphanumeric()) {
        return true;
    }

    // A single character smeared across the keyboard ("aaaaaa")
    let mut chars = trimmed.chars().filter(|c| !c.is_whitespace());
    if let Some(first) = chars.next() {
        if chars.all(|c| c == first) {
            return true;
        }
    }

    false
}

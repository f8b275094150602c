//! Final context compilation.
//!
//! Synthesizes the free-text learner context, key insights, and schedule
//! constraints from the full interview transcript. AI-primary with a cruder
//! rule-based fallback that scans raw Stage-3 answers for keyword patterns;
//! the two tiers are a deliberate resilience pattern and both always
//! populate every schedule field.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::llm::{GatewayError, LlmGateway};
use crate::pipeline::context::{Intensity, ScheduleConstraints};
use crate::prompts;

use super::session::{InterviewSession, InterviewStage};

#[derive(Debug, Clone)]
pub struct CompiledInterview {
    pub context: String,
    pub key_insights: Vec<String>,
    pub schedule: ScheduleConstraints,
}

#[derive(Debug, Deserialize)]
struct CompilePayload {
    context: String,
    #[serde(default)]
    key_insights: Vec<String>,
    #[serde(default)]
    schedule: Option<SchedulePayload>,
}

#[derive(Debug, Deserialize)]
struct SchedulePayload {
    daily_minutes: Option<u32>,
    rest_days: Option<Vec<u8>>,
    intensity: Option<String>,
}

pub struct ContextCompiler {
    gateway: Arc<dyn LlmGateway>,
}

impl ContextCompiler {
    pub fn new(gateway: Arc<dyn LlmGateway>) -> Self {
        Self { gateway }
    }

    pub async fn compile(&self, session: &InterviewSession) -> CompiledInterview {
        let result = self
            .gateway
            .invoke_structured(&prompts::compile_prompt(session), 0.3)
            .await
            .and_then(|value| {
                serde_json::from_value::<CompilePayload>(value)
                    .map_err(|e| GatewayError::Parse(e.to_string()))
            });

        match result {
            Ok(payload) => {
                // Missing schedule fields fall through to the rule-based
                // extraction so the result is always fully populated.
                let extracted = extract_schedule(session);
                let schedule = match payload.schedule {
                    Some(s) => ScheduleConstraints {
                        daily_minutes: s.daily_minutes.unwrap_or(extracted.daily_minutes),
                        rest_days: s
                            .rest_days
                            .map(|days| days.into_iter().filter(|d| *d <= 6).collect())
                            .filter(|days: &BTreeSet<u8>| !days.is_empty())
                            .unwrap_or(extracted.rest_days),
                        intensity: s
                            .intensity
                            .as_deref()
                            .and_then(parse_intensity)
                            .unwrap_or(extracted.intensity),
                    },
                    None => extracted,
                };

                let key_insights = if payload.key_insights.is_empty() {
                    fallback_insights(session)
                } else {
                    payload.key_insights
                };

                CompiledInterview {
                    context: payload.context,
                    key_insights,
                    schedule,
                }
            }
            Err(e) => {
                tracing::warn!("AI context compilation failed, using rule-based path: {}", e);
                compile_fallback(session)
            }
        }
    }
}

/// Rule-based compilation used when the AI path is unusable
pub fn compile_fallback(session: &InterviewSession) -> CompiledInterview {
    let mut context = format!(
        "Interview summary for {} ({} mode, {} months):\n",
        session.topic,
        session.mode.as_str(),
        session.duration_months
    );
    for round in &session.history {
        for record in &round.answers {
            context.push_str(&format!(
                "- {} => {}\n",
                record.question.question, record.answer
            ));
        }
    }

    CompiledInterview {
        context,
        key_insights: fallback_insights(session),
        schedule: extract_schedule(session),
    }
}

fn fallback_insights(session: &InterviewSession) -> Vec<String> {
    let mut insights: Vec<String> = session
        .history
        .iter()
        .flat_map(|round| round.answers.iter())
        .map(|record| record.evaluation.insights.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if insights.is_empty() {
        insights = session
            .history
            .iter()
            .flat_map(|round| round.answers.iter())
            .filter(|record| !record.answer.trim().is_empty())
            .take(3)
            .map(|record| {
                let first = record.answer.split(['.', '!', '?']).next().unwrap_or("");
                first.trim().chars().take(80).collect()
            })
            .collect();
    }

    insights
}

lazy_static! {
    static ref MINUTES_RE: Regex = Regex::new(r"(?i)(\d+)\s*(?:minutes|mins|min)\b").unwrap();
    static ref HOURS_RE: Regex =
        Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:hours|hrs|hour|hr)\b").unwrap();
}

/// Day names indexed 0 = Monday .. 6 = Sunday
const DAY_NAMES: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Scan raw Stage-3 answers for time-range, day-name, and intensity
/// phrases. Every field has a default so the result is always complete.
pub fn extract_schedule(session: &InterviewSession) -> ScheduleConstraints {
    let answers: Vec<String> = session
        .answers_for_stage(InterviewStage::Stage3)
        .iter()
        .map(|record| record.answer.to_lowercase())
        .collect();
    let combined = answers.join(" ");

    let defaults = ScheduleConstraints::default();

    let daily_minutes = MINUTES_RE
        .captures(&combined)
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .or_else(|| {
            HOURS_RE
                .captures(&combined)
                .and_then(|caps| caps[1].parse::<f32>().ok())
                .map(|hours| (hours * 60.0).round() as u32)
        })
        .or_else(|| {
            if combined.contains("half an hour") {
                Some(30)
            } else if combined.contains("an hour") {
                Some(60)
            } else {
                None
            }
        })
        .unwrap_or(defaults.daily_minutes);

    let mut rest_days: BTreeSet<u8> = DAY_NAMES
        .iter()
        .enumerate()
        .filter(|(_, name)| combined.contains(*name))
        .map(|(i, _)| i as u8)
        .collect();
    if combined.contains("weekend") {
        rest_days.insert(5);
        rest_days.insert(6);
    }
    if rest_days.is_empty() {
        rest_days = defaults.rest_days;
    }

    const INTENSE_WORDS: [&str; 5] = ["intense", "intensive", "aggressive", "hard", "fast"];
    const LIGHT_WORDS: [&str; 5] = ["light", "casual", "relaxed", "easy", "gentle"];
    let intensity = if INTENSE_WORDS.iter().any(|w| combined.contains(w)) {
        Intensity::Intense
    } else if LIGHT_WORDS.iter().any(|w| combined.contains(w)) {
        Intensity::Light
    } else {
        defaults.intensity
    };

    ScheduleConstraints {
        daily_minutes,
        rest_days,
        intensity,
    }
}

fn parse_intensity(value: &str) -> Option<Intensity> {
    match value.to_lowercase().as_str() {
        "light" => Some(Intensity::Light),
        "moderate" => Some(Intensity::Moderate),
        "intense" => Some(Intensity::Intense),
        _ => None,
    }
}

//! The mutable state threaded through one pipeline run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoadmapMode {
    Planning,
    Learning,
}

impl RoadmapMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoadmapMode::Planning => "planning",
            RoadmapMode::Learning => "learning",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Light,
    Moderate,
    Intense,
}

impl Intensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intensity::Light => "light",
            Intensity::Moderate => "moderate",
            Intensity::Intense => "intense",
        }
    }
}

/// Schedule constraints attached to a run, either given up front or
/// extracted from an interview. Rest days use 0 = Monday .. 6 = Sunday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConstraints {
    pub daily_minutes: u32,
    pub rest_days: BTreeSet<u8>,
    pub intensity: Intensity,
}

impl Default for ScheduleConstraints {
    fn default() -> Self {
        Self {
            daily_minutes: 30,
            rest_days: BTreeSet::from([6]),
            intensity: Intensity::Moderate,
        }
    }
}

/// A request to generate one study plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
    pub topic: String,
    pub duration_months: u32,
    pub start_date: NaiveDate,
    pub mode: RoadmapMode,
    #[serde(default)]
    pub interview_context: Option<String>,
    #[serde(default)]
    pub schedule: Option<ScheduleConstraints>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyGoalDraft {
    pub month_number: u32,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyTaskDraft {
    pub month_number: u32,
    pub week_number: u32,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyTaskDraft {
    pub month_number: u32,
    pub week_number: u32,
    pub day_number: u32,
    pub order: u32,
    pub title: String,
    pub description: String,
}

/// State owned by exactly one run and mutated strictly sequentially by the
/// stage functions; discarded after persistence or terminal failure.
#[derive(Debug, Clone)]
pub struct GenerationContext {
    pub run_id: String,
    pub topic: String,
    pub duration_months: u32,
    pub mode: RoadmapMode,
    pub start_date: NaiveDate,
    pub schedule: Option<ScheduleConstraints>,
    pub interview_context: Option<String>,

    /// Snippets gathered by the optional web-search stage
    pub research_notes: Vec<String>,

    pub title: String,
    pub description: String,
    pub monthly_goals: Vec<MonthlyGoalDraft>,
    pub weekly_tasks: Vec<WeeklyTaskDraft>,
    pub daily_tasks: Vec<DailyTaskDraft>,

    pub validation_passed: bool,
    pub retry_count: u32,
    pub error_message: Option<String>,
}

impl GenerationContext {
    pub fn new(run_id: String, request: RunRequest) -> Self {
        Self {
            run_id,
            topic: request.topic,
            duration_months: request.duration_months,
            mode: request.mode,
            start_date: request.start_date,
            schedule: request.schedule,
            interview_context: request.interview_context,
            research_notes: Vec::new(),
            title: String::new(),
            description: String::new(),
            monthly_goals: Vec::new(),
            weekly_tasks: Vec::new(),
            daily_tasks: Vec::new(),
            validation_passed: false,
            retry_count: 0,
            error_message: None,
        }
    }

    /// Record a stage-internal error without aborting the run
    pub fn record_error(&mut self, message: &str) {
        match &mut self.error_message {
            Some(existing) => {
                existing.push_str("; ");
                existing.push_str(message);
            }
            None => self.error_message = Some(message.to_string()),
        }
    }

    /// Drop generated goals and tasks ahead of a validation retry.
    /// Title and description survive; the retry edge re-enters at the
    /// monthly generator.
    pub fn clear_generated(&mut self) {
        self.monthly_goals.clear();
        self.weekly_tasks.clear();
        self.daily_tasks.clear();
    }

    pub fn weekly_tasks_for(&self, month_number: u32) -> impl Iterator<Item = &WeeklyTaskDraft> {
        self.weekly_tasks
            .iter()
            .filter(move |task| task.month_number == month_number)
    }

    pub fn daily_tasks_for(
        &self,
        month_number: u32,
        week_number: u32,
    ) -> impl Iterator<Item = &DailyTaskDraft> {
        self.daily_tasks
            .iter()
            .filter(move |task| task.month_number == month_number && task.week_number == week_number)
    }
}

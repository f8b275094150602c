use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::pipeline::context::ScheduleConstraints;

/// Persisted study plan with its full hierarchy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roadmap {
    pub id: String,
    pub title: String,
    pub description: String,
    pub topic: String,
    pub duration_months: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduleConstraints>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub monthly_goals: Vec<MonthlyGoal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyGoal {
    pub month_number: u32,
    pub title: String,
    pub description: String,
    pub weekly_tasks: Vec<WeeklyTask>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyTask {
    pub week_number: u32,
    pub title: String,
    pub description: String,
    pub daily_tasks: Vec<DailyTask>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyTask {
    pub day_number: u32,
    pub order: u32,
    pub title: String,
    pub description: String,
}

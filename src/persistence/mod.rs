//! Persistence of finished study plans.
//!
//! The pipeline hands its final context here; the full hierarchy is
//! committed transactionally or not at all. Saves are idempotent per run id
//! so a re-driven run cannot duplicate rows.

pub mod db;
pub mod models;

pub use db::RoadmapDatabase;
pub use models::{DailyTask, MonthlyGoal, Roadmap, WeeklyTask};

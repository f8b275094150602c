use anyhow::{Context, Result};
use chrono::{Months, Utc};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::pipeline::context::{GenerationContext, ScheduleConstraints};

use super::models::{DailyTask, MonthlyGoal, Roadmap, WeeklyTask};

/// SQLite database holding finished study plans
pub struct RoadmapDatabase {
    pool: SqlitePool,
}

impl RoadmapDatabase {
    /// Open the database at the default location
    pub async fn new() -> Result<Self> {
        let db_path = Self::db_path()?;

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // ?mode=rwc creates the database file if it doesn't exist
        let database_url = format!("sqlite:{}?mode=rwc", db_path.display());
        Self::new_with_url(&database_url).await
    }

    /// Open the database at an explicit URL (used by tests)
    pub async fn new_with_url(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .context("Failed to connect to database")?;

        Self::migrate(&pool).await?;

        Ok(Self { pool })
    }

    fn db_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to get config directory")?;
        Ok(config_dir.join("learnpath").join("roadmaps.db"))
    }

    async fn migrate(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS roadmaps (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                topic TEXT NOT NULL,
                duration_months INTEGER NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                mode TEXT NOT NULL,
                daily_minutes INTEGER,
                rest_days TEXT,
                intensity TEXT,
                error_message TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS monthly_goals (
                roadmap_id TEXT NOT NULL,
                month_number INTEGER NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                PRIMARY KEY (roadmap_id, month_number)
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS weekly_tasks (
                roadmap_id TEXT NOT NULL,
                month_number INTEGER NOT NULL,
                week_number INTEGER NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                PRIMARY KEY (roadmap_id, month_number, week_number)
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS daily_tasks (
                roadmap_id TEXT NOT NULL,
                month_number INTEGER NOT NULL,
                week_number INTEGER NOT NULL,
                day_number INTEGER NOT NULL,
                ord INTEGER NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                PRIMARY KEY (roadmap_id, month_number, week_number, day_number)
            )
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Persist the full hierarchy produced by one run, replacing any prior
    /// save under the same run id. Commits everything or nothing.
    pub async fn save_roadmap(&self, ctx: &GenerationContext) -> Result<String> {
        let end_date = ctx
            .start_date
            .checked_add_months(Months::new(ctx.duration_months))
            .context("End date out of range")?;

        let (daily_minutes, rest_days, intensity) = match &ctx.schedule {
            Some(s) => (
                Some(s.daily_minutes as i64),
                Some(serde_json::to_string(&s.rest_days)?),
                Some(s.intensity.as_str().to_string()),
            ),
            None => (None, None, None),
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO roadmaps
                (id, title, description, topic, duration_months, start_date,
                 end_date, mode, daily_minutes, rest_days, intensity,
                 error_message, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&ctx.run_id)
        .bind(&ctx.title)
        .bind(&ctx.description)
        .bind(&ctx.topic)
        .bind(ctx.duration_months as i64)
        .bind(ctx.start_date.to_string())
        .bind(end_date.to_string())
        .bind(ctx.mode.as_str())
        .bind(daily_minutes)
        .bind(rest_days)
        .bind(intensity)
        .bind(&ctx.error_message)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?;

        // Idempotent per run id: drop any children from a previous save
        for table in ["monthly_goals", "weekly_tasks", "daily_tasks"] {
            sqlx::query(&format!("DELETE FROM {} WHERE roadmap_id = ?", table))
                .bind(&ctx.run_id)
                .execute(&mut *tx)
                .await?;
        }

        for goal in &ctx.monthly_goals {
            sqlx::query(
                "INSERT INTO monthly_goals (roadmap_id, month_number, title, description) \
                 VALUES (?, ?, ?, ?)",
            )
            .bind(&ctx.run_id)
            .bind(goal.month_number as i64)
            .bind(&goal.title)
            .bind(&goal.description)
            .execute(&mut *tx)
            .await?;
        }

        for task in &ctx.weekly_tasks {
            sqlx::query(
                "INSERT INTO weekly_tasks (roadmap_id, month_number, week_number, title, description) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&ctx.run_id)
            .bind(task.month_number as i64)
            .bind(task.week_number as i64)
            .bind(&task.title)
            .bind(&task.description)
            .execute(&mut *tx)
            .await?;
        }

        for task in &ctx.daily_tasks {
            sqlx::query(
                "INSERT INTO daily_tasks (roadmap_id, month_number, week_number, day_number, ord, title, description) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&ctx.run_id)
            .bind(task.month_number as i64)
            .bind(task.week_number as i64)
            .bind(task.day_number as i64)
            .bind(task.order as i64)
            .bind(&task.title)
            .bind(&task.description)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(ctx.run_id.clone())
    }

    /// Load a roadmap with its full hierarchy
    pub async fn get_roadmap(&self, id: &str) -> Result<Roadmap> {
        let row = sqlx::query_as::<_, (
            String,
            String,
            String,
            String,
            i64,
            String,
            String,
            String,
            Option<i64>,
            Option<String>,
            Option<String>,
            Option<String>,
            String,
        )>(
            r#"
            SELECT id, title, description, topic, duration_months, start_date,
                   end_date, mode, daily_minutes, rest_days, intensity,
                   error_message, created_at
            FROM roadmaps
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .context("Roadmap not found")?;

        let schedule = match (row.8, &row.9, &row.10) {
            (Some(minutes), Some(days), Some(intensity)) => Some(ScheduleConstraints {
                daily_minutes: minutes as u32,
                rest_days: serde_json::from_str::<BTreeSet<u8>>(days)
                    .context("Invalid rest_days")?,
                intensity: serde_json::from_str(&format!("\"{}\"", intensity))
                    .context("Invalid intensity")?,
            }),
            _ => None,
        };

        let goals = sqlx::query_as::<_, (i64, String, String)>(
            "SELECT month_number, title, description FROM monthly_goals \
             WHERE roadmap_id = ? ORDER BY month_number",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let weeks = sqlx::query_as::<_, (i64, i64, String, String)>(
            "SELECT month_number, week_number, title, description FROM weekly_tasks \
             WHERE roadmap_id = ? ORDER BY month_number, week_number",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let days = sqlx::query_as::<_, (i64, i64, i64, i64, String, String)>(
            "SELECT month_number, week_number, day_number, ord, title, description \
             FROM daily_tasks WHERE roadmap_id = ? ORDER BY month_number, week_number, ord",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let monthly_goals = goals
            .into_iter()
            .map(|(month, title, description)| MonthlyGoal {
                month_number: month as u32,
                title,
                description,
                weekly_tasks: weeks
                    .iter()
                    .filter(|w| w.0 == month)
                    .map(|(_, week, title, description)| WeeklyTask {
                        week_number: *week as u32,
                        title: title.clone(),
                        description: description.clone(),
                        daily_tasks: days
                            .iter()
                            .filter(|d| d.0 == month && d.1 == *week)
                            .map(|(_, _, day, ord, title, description)| DailyTask {
                                day_number: *day as u32,
                                order: *ord as u32,
                                title: title.clone(),
                                description: description.clone(),
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        Ok(Roadmap {
            id: row.0,
            title: row.1,
            description: row.2,
            topic: row.3,
            duration_months: row.4 as u32,
            start_date: row.5.parse().context("Invalid start_date")?,
            end_date: row.6.parse().context("Invalid end_date")?,
            mode: row.7,
            schedule,
            error_message: row.11,
            created_at: row.12.parse().context("Invalid created_at")?,
            monthly_goals,
        })
    }

    pub async fn delete_roadmap(&self, id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for table in ["daily_tasks", "weekly_tasks", "monthly_goals"] {
            sqlx::query(&format!("DELETE FROM {} WHERE roadmap_id = ?", table))
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        sqlx::query("DELETE FROM roadmaps WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}

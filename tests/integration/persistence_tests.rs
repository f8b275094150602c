use super::common::*;
use anyhow::Result;
use std::collections::BTreeSet;

use learnpath::pipeline::context::{GenerationContext, Intensity, ScheduleConstraints};
use learnpath::pipeline::stages;

fn filled_context(run_id: &str, topic: &str, months: u32) -> GenerationContext {
    let mut ctx = GenerationContext::new(run_id.to_string(), run_request(topic, months));
    ctx.title = format!("{} Study Plan", topic);
    ctx.description = "A plan assembled for tests.".to_string();

    for m in 1..=months {
        ctx.monthly_goals
            .push(stages::fallback_monthly_goal(topic, m, months));
        for w in 1..=4 {
            ctx.weekly_tasks
                .push(stages::fallback_weekly_task(topic, m, w));
            for d in 1..=7 {
                ctx.daily_tasks
                    .push(stages::fallback_daily_task(topic, m, w, d));
            }
        }
    }

    ctx.validation_passed = true;
    ctx
}

#[tokio::test]
async fn test_save_and_reload_full_hierarchy() -> Result<()> {
    let test_db = temp_db().await?;

    let mut ctx = filled_context("run-save", "Rust", 3);
    ctx.schedule = Some(ScheduleConstraints {
        daily_minutes: 45,
        rest_days: BTreeSet::from([0, 6]),
        intensity: Intensity::Intense,
    });

    let id = test_db.db.save_roadmap(&ctx).await?;
    assert_eq!(id, "run-save");

    let roadmap = test_db.db.get_roadmap(&id).await?;
    assert_eq!(roadmap.title, "Rust Study Plan");
    assert_eq!(roadmap.topic, "Rust");
    assert_eq!(roadmap.duration_months, 3);
    assert_eq!(roadmap.mode, "planning");
    assert_eq!(
        roadmap.end_date,
        ctx.start_date.checked_add_months(chrono::Months::new(3)).unwrap()
    );

    let schedule = roadmap.schedule.expect("schedule persisted");
    assert_eq!(schedule.daily_minutes, 45);
    assert_eq!(schedule.rest_days, BTreeSet::from([0, 6]));
    assert_eq!(schedule.intensity, Intensity::Intense);

    assert_eq!(roadmap.monthly_goals.len(), 3);
    for (i, goal) in roadmap.monthly_goals.iter().enumerate() {
        assert_eq!(goal.month_number, i as u32 + 1);
        assert_eq!(goal.weekly_tasks.len(), 4);
        for week in &goal.weekly_tasks {
            assert_eq!(week.daily_tasks.len(), 7);
            let orders: Vec<u32> = week.daily_tasks.iter().map(|d| d.order).collect();
            assert_eq!(orders, vec![1, 2, 3, 4, 5, 6, 7]);
        }
    }

    Ok(())
}

#[tokio::test]
async fn test_resave_under_same_run_id_is_idempotent() -> Result<()> {
    let test_db = temp_db().await?;

    let mut ctx = filled_context("run-idem", "Go", 2);
    test_db.db.save_roadmap(&ctx).await?;

    // A re-driven run persists again under the same id
    ctx.title = "Go Study Plan (revised)".to_string();
    test_db.db.save_roadmap(&ctx).await?;

    let roadmap = test_db.db.get_roadmap("run-idem").await?;
    assert_eq!(roadmap.title, "Go Study Plan (revised)");
    assert_eq!(roadmap.monthly_goals.len(), 2);
    let weeks: usize = roadmap
        .monthly_goals
        .iter()
        .map(|g| g.weekly_tasks.len())
        .sum();
    assert_eq!(weeks, 8);

    Ok(())
}

#[tokio::test]
async fn test_error_message_survives_persistence() -> Result<()> {
    let test_db = temp_db().await?;

    let mut ctx = filled_context("run-degraded", "SQL", 1);
    ctx.error_message = Some("monthly generation failed: timed out".to_string());

    test_db.db.save_roadmap(&ctx).await?;
    let roadmap = test_db.db.get_roadmap("run-degraded").await?;

    assert_eq!(
        roadmap.error_message.as_deref(),
        Some("monthly generation failed: timed out")
    );

    Ok(())
}

#[tokio::test]
async fn test_delete_removes_the_whole_hierarchy() -> Result<()> {
    let test_db = temp_db().await?;

    let ctx = filled_context("run-del", "Python", 1);
    test_db.db.save_roadmap(&ctx).await?;
    assert!(test_db.db.get_roadmap("run-del").await.is_ok());

    test_db.db.delete_roadmap("run-del").await?;
    assert!(test_db.db.get_roadmap("run-del").await.is_err());

    Ok(())
}

#[tokio::test]
async fn test_unknown_roadmap_is_an_error() -> Result<()> {
    let test_db = temp_db().await?;
    assert!(test_db.db.get_roadmap("nope").await.is_err());
    Ok(())
}

//! Generation stages.
//!
//! Each stage mutates the run context and never fails: on gateway failure or
//! malformed structured output it populates deterministic templated content
//! and records the error, preferring forward progress with degraded quality
//! over a hard failure.

use serde::Deserialize;

use crate::llm::{GatewayError, LlmGateway};
use crate::prompts;
use crate::search::WebSearchProvider;

use super::context::{
    DailyTaskDraft, GenerationContext, MonthlyGoalDraft, WeeklyTaskDraft,
};
use super::validator::{DAYS_PER_WEEK, WEEKS_PER_MONTH};

#[derive(Debug, Deserialize)]
struct TitlePayload {
    title: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ItemPayload {
    title: String,
    #[serde(default)]
    description: String,
}

fn decode<T: serde::de::DeserializeOwned>(
    value: serde_json::Value,
) -> Result<T, GatewayError> {
    serde_json::from_value(value).map_err(|e| GatewayError::Parse(e.to_string()))
}

/// Optional research stage ahead of generation
pub async fn web_search(ctx: &mut GenerationContext, provider: &dyn WebSearchProvider) {
    let query = format!("{} study roadmap", ctx.topic);
    match provider.search(&query, 5).await {
        Ok(snippets) => {
            ctx.research_notes = snippets
                .into_iter()
                .map(|s| format!("{}: {}", s.title, s.snippet))
                .collect();
        }
        Err(e) => {
            tracing::warn!("web search failed, continuing without research: {}", e);
            ctx.record_error(&format!("web search failed: {}", e));
        }
    }
}

/// Title and description for the plan
pub async fn goal_analyzer(ctx: &mut GenerationContext, gateway: &dyn LlmGateway) {
    let result = gateway
        .invoke_structured(&prompts::title_prompt(ctx), 0.7)
        .await
        .and_then(decode::<TitlePayload>);

    match result {
        Ok(payload) => {
            ctx.title = payload.title;
            ctx.description = payload.description;
        }
        Err(e) => {
            tracing::warn!("goal analyzer fell back to template: {}", e);
            ctx.title = format!("{} Study Plan", ctx.topic);
            ctx.description = format!(
                "A {}-month {} plan for {}.",
                ctx.duration_months,
                ctx.mode.as_str(),
                ctx.topic
            );
            ctx.record_error(&format!("title generation failed: {}", e));
        }
    }
}

/// One goal per month for the whole run
pub async fn monthly_generator(ctx: &mut GenerationContext, gateway: &dyn LlmGateway) {
    let result = gateway
        .invoke_structured(&prompts::monthly_prompt(ctx), 0.7)
        .await
        .and_then(decode::<Vec<ItemPayload>>);

    match result {
        Ok(goals) => {
            ctx.monthly_goals = goals
                .into_iter()
                .enumerate()
                .map(|(i, goal)| MonthlyGoalDraft {
                    month_number: i as u32 + 1,
                    title: goal.title,
                    description: goal.description,
                })
                .collect();
        }
        Err(e) => {
            tracing::warn!("monthly generator fell back to template: {}", e);
            ctx.monthly_goals = (1..=ctx.duration_months)
                .map(|m| fallback_monthly_goal(&ctx.topic, m, ctx.duration_months))
                .collect();
            ctx.record_error(&format!("monthly generation failed: {}", e));
        }
    }
}

pub fn fallback_monthly_goal(topic: &str, month: u32, total: u32) -> MonthlyGoalDraft {
    let focus = if month == 1 {
        "basics"
    } else if month == total {
        "mastery"
    } else {
        "deep dive"
    };

    MonthlyGoalDraft {
        month_number: month,
        title: format!("Month {}: {} {}", month, topic, focus),
        description: format!("Work through the {} of {} this month.", focus, topic),
    }
}

/// Weekly tasks for one month
pub async fn weekly_generator(
    ctx: &mut GenerationContext,
    gateway: &dyn LlmGateway,
    month_number: u32,
) {
    let month_title = ctx
        .monthly_goals
        .iter()
        .find(|goal| goal.month_number == month_number)
        .map(|goal| goal.title.clone())
        .unwrap_or_default();

    let result = gateway
        .invoke_structured(&prompts::weekly_prompt(ctx, month_number, &month_title), 0.6)
        .await
        .and_then(decode::<Vec<ItemPayload>>);

    match result {
        Ok(tasks) => {
            ctx.weekly_tasks
                .extend(tasks.into_iter().enumerate().map(|(i, task)| WeeklyTaskDraft {
                    month_number,
                    week_number: i as u32 + 1,
                    title: task.title,
                    description: task.description,
                }));
        }
        Err(e) => {
            tracing::warn!(
                "weekly generator for month {} fell back to template: {}",
                month_number,
                e
            );
            let topic = ctx.topic.clone();
            ctx.weekly_tasks.extend(
                (1..=WEEKS_PER_MONTH as u32).map(|w| fallback_weekly_task(&topic, month_number, w)),
            );
            ctx.record_error(&format!(
                "weekly generation failed for month {}: {}",
                month_number, e
            ));
        }
    }
}

pub fn fallback_weekly_task(topic: &str, month_number: u32, week_number: u32) -> WeeklyTaskDraft {
    const FOCUS: [&str; WEEKS_PER_MONTH] = [
        "fundamentals",
        "guided practice",
        "applied work",
        "review and consolidation",
    ];
    let focus = FOCUS[(week_number as usize - 1) % WEEKS_PER_MONTH];

    WeeklyTaskDraft {
        month_number,
        week_number,
        title: format!("Week {}: {} {}", week_number, topic, focus),
        description: format!("Spend the week on {} {}.", topic, focus),
    }
}

/// Daily tasks for one week
pub async fn daily_generator(
    ctx: &mut GenerationContext,
    gateway: &dyn LlmGateway,
    month_number: u32,
    week_number: u32,
) {
    let week_title = ctx
        .daily_week_title(month_number, week_number)
        .unwrap_or_default();

    let result = gateway
        .invoke_structured(
            &prompts::daily_prompt(ctx, month_number, week_number, &week_title),
            0.6,
        )
        .await
        .and_then(decode::<Vec<ItemPayload>>);

    match result {
        Ok(tasks) => {
            ctx.daily_tasks
                .extend(tasks.into_iter().enumerate().map(|(i, task)| DailyTaskDraft {
                    month_number,
                    week_number,
                    day_number: i as u32 + 1,
                    order: i as u32 + 1,
                    title: task.title,
                    description: task.description,
                }));
        }
        Err(e) => {
            tracing::warn!(
                "daily generator for month {} week {} fell back to template: {}",
                month_number,
                week_number,
                e
            );
            let topic = ctx.topic.clone();
            ctx.daily_tasks.extend(
                (1..=DAYS_PER_WEEK as u32)
                    .map(|d| fallback_daily_task(&topic, month_number, week_number, d)),
            );
            ctx.record_error(&format!(
                "daily generation failed for month {} week {}: {}",
                month_number, week_number, e
            ));
        }
    }
}

pub fn fallback_daily_task(
    topic: &str,
    month_number: u32,
    week_number: u32,
    day_number: u32,
) -> DailyTaskDraft {
    DailyTaskDraft {
        month_number,
        week_number,
        day_number,
        order: day_number,
        title: format!("Day {}: {} session", day_number, topic),
        description: format!(
            "A focused {} session for day {} of week {}.",
            topic, day_number, week_number
        ),
    }
}

impl GenerationContext {
    fn daily_week_title(&self, month_number: u32, week_number: u32) -> Option<String> {
        self.weekly_tasks_for(month_number)
            .find(|task| task.week_number == week_number)
            .map(|task| task.title.clone())
    }
}

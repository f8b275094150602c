//! Structural validation of generated content.
//!
//! Checks cardinality only (months per plan, weeks per month, days per
//! week). Semantic quality is never re-verified here.

use super::context::GenerationContext;

pub const WEEKS_PER_MONTH: usize = 4;
pub const DAYS_PER_WEEK: usize = 7;

/// Validator outcome consumed by the executor's conditional retry edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Retry { reason: String },
}

pub fn check_cardinality(ctx: &GenerationContext) -> Verdict {
    let mut problems = Vec::new();

    if ctx.monthly_goals.len() != ctx.duration_months as usize {
        problems.push(format!(
            "expected {} monthly goals, found {}",
            ctx.duration_months,
            ctx.monthly_goals.len()
        ));
    }

    for goal in &ctx.monthly_goals {
        let weeks = ctx.weekly_tasks_for(goal.month_number).count();
        if weeks != WEEKS_PER_MONTH {
            problems.push(format!(
                "month {} has {} weekly tasks, expected {}",
                goal.month_number, weeks, WEEKS_PER_MONTH
            ));
            continue;
        }

        for week_number in 1..=WEEKS_PER_MONTH as u32 {
            let days = ctx.daily_tasks_for(goal.month_number, week_number).count();
            if days != DAYS_PER_WEEK {
                problems.push(format!(
                    "month {} week {} has {} daily tasks, expected {}",
                    goal.month_number, week_number, days, DAYS_PER_WEEK
                ));
            }
        }
    }

    if problems.is_empty() {
        Verdict::Accept
    } else {
        Verdict::Retry {
            reason: problems.join("; "),
        }
    }
}

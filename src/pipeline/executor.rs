//! Pipeline executor.
//!
//! Drives the fixed stage order [optional WebSearch] → GoalAnalyzer →
//! MonthlyGenerator → WeeklyGenerator → DailyGenerator → Validator, with one
//! conditional edge: a failed validation re-enters at the monthly generator
//! while the retry budget lasts. Once the budget is spent the last generated
//! result is accepted as-is. Stage events are sent over an injected channel
//! after each stage completes.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::llm::LlmGateway;
use crate::search::WebSearchProvider;

use super::context::GenerationContext;
use super::validator::{self, Verdict};
use super::stages;

/// Events emitted while a run progresses, consumed by the streaming
/// coordinator
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    TitleReady {
        title: String,
        description: String,
    },
    MonthReady {
        month_number: u32,
        title: String,
    },
    WeeksReady {
        month_number: u32,
    },
    Warning {
        message: String,
    },
}

pub struct PipelineExecutor {
    gateway: Arc<dyn LlmGateway>,
    search: Option<Arc<dyn WebSearchProvider>>,
    retry_cap: u32,
    event_tx: mpsc::UnboundedSender<PipelineEvent>,
}

impl PipelineExecutor {
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        search: Option<Arc<dyn WebSearchProvider>>,
        retry_cap: u32,
        event_tx: mpsc::UnboundedSender<PipelineEvent>,
    ) -> Self {
        Self {
            gateway,
            search,
            retry_cap,
            event_tx,
        }
    }

    /// Run the pipeline to a terminal state. Never fails: stage errors are
    /// recorded in the context and degraded content is carried forward.
    pub async fn run(&self, ctx: &mut GenerationContext) {
        if let Some(search) = &self.search {
            stages::web_search(ctx, search.as_ref()).await;
        }

        stages::goal_analyzer(ctx, self.gateway.as_ref()).await;
        let _ = self.event_tx.send(PipelineEvent::TitleReady {
            title: ctx.title.clone(),
            description: ctx.description.clone(),
        });

        loop {
            stages::monthly_generator(ctx, self.gateway.as_ref()).await;

            let months: Vec<(u32, String)> = ctx
                .monthly_goals
                .iter()
                .map(|goal| (goal.month_number, goal.title.clone()))
                .collect();

            for (month_number, title) in months {
                let _ = self.event_tx.send(PipelineEvent::MonthReady {
                    month_number,
                    title,
                });

                stages::weekly_generator(ctx, self.gateway.as_ref(), month_number).await;

                let weeks: Vec<u32> = ctx
                    .weekly_tasks_for(month_number)
                    .map(|task| task.week_number)
                    .collect();
                for week_number in weeks {
                    stages::daily_generator(
                        ctx,
                        self.gateway.as_ref(),
                        month_number,
                        week_number,
                    )
                    .await;
                }

                let _ = self
                    .event_tx
                    .send(PipelineEvent::WeeksReady { month_number });
            }

            match validator::check_cardinality(ctx) {
                Verdict::Accept => {
                    ctx.validation_passed = true;
                    break;
                }
                Verdict::Retry { reason } if ctx.retry_count < self.retry_cap => {
                    ctx.retry_count += 1;
                    tracing::info!(
                        "validation failed ({}), regenerating (attempt {}/{})",
                        reason,
                        ctx.retry_count,
                        self.retry_cap
                    );
                    let _ = self.event_tx.send(PipelineEvent::Warning {
                        message: format!(
                            "plan structure was off ({}), regenerating",
                            reason
                        ),
                    });
                    ctx.clear_generated();
                }
                Verdict::Retry { reason } => {
                    // Retry budget spent: accept the last result as-is
                    tracing::warn!("accepting plan despite failed validation: {}", reason);
                    ctx.record_error(&format!(
                        "validation failed after {} retries: {}",
                        self.retry_cap, reason
                    ));
                    let _ = self.event_tx.send(PipelineEvent::Warning {
                        message: "accepting plan despite a structural mismatch".to_string(),
                    });
                    break;
                }
            }
        }
    }
}

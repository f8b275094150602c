use super::common::*;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

use learnpath::config::PolicyConfig;
use learnpath::coordinator::{StreamEventKind, StreamingCoordinator, WorkerPool};
use learnpath::llm::scripted::ScriptedGateway;
use learnpath::pipeline::context::GenerationContext;
use learnpath::pipeline::executor::PipelineExecutor;

#[tokio::test]
async fn test_accepted_runs_have_exact_cardinality_for_all_durations() {
    for months in 1..=6u32 {
        let gateway = Arc::new(structured_gateway(months as usize));
        let (tx, _rx) = mpsc::unbounded_channel();
        let executor = PipelineExecutor::new(gateway, None, 2, tx);

        let mut ctx = GenerationContext::new(format!("run-{}", months), run_request("Rust", months));
        executor.run(&mut ctx).await;

        assert!(ctx.validation_passed, "months={}", months);
        assert!(ctx.error_message.is_none(), "months={}", months);
        assert_eq!(ctx.monthly_goals.len(), months as usize);
        for m in 1..=months {
            assert_eq!(ctx.weekly_tasks_for(m).count(), 4, "month {}", m);
            for w in 1..=4 {
                assert_eq!(ctx.daily_tasks_for(m, w).count(), 7, "month {} week {}", m, w);
            }
        }
    }
}

#[tokio::test]
async fn test_dead_gateway_degrades_but_never_raises() {
    let gateway = Arc::new(ScriptedGateway::failing());
    let (tx, _rx) = mpsc::unbounded_channel();
    let executor = PipelineExecutor::new(gateway, None, 2, tx);

    let mut ctx = GenerationContext::new("run-dead".to_string(), run_request("Kubernetes", 4));
    executor.run(&mut ctx).await;

    // Every stage fell back to templated content; the run still terminated
    // with a structurally complete plan and a populated error message.
    assert!(ctx.validation_passed);
    assert!(ctx.error_message.is_some());
    assert_eq!(ctx.monthly_goals.len(), 4);
    assert_eq!(ctx.monthly_goals[0].title, "Month 1: Kubernetes basics");
    assert_eq!(ctx.monthly_goals[3].title, "Month 4: Kubernetes mastery");
    assert_eq!(ctx.weekly_tasks.len(), 16);
    assert_eq!(ctx.daily_tasks.len(), 112);
}

#[tokio::test]
async fn test_retry_count_never_exceeds_cap() {
    // Weekly generation keeps returning 3 tasks instead of 4, so every
    // validation fails; after the capped retries the result is accepted.
    let gateway = Arc::new(
        ScriptedGateway::new()
            .respond_when(
                "concise title",
                r#"{"title": "SQL Plan", "description": "d"}"#,
            )
            .respond_when("monthly goals", &items_json(2, "Goal"))
            .respond_when("weekly tasks", &items_json(3, "Short week"))
            .respond_when("daily tasks", &items_json(7, "Day")),
    );
    let (tx, _rx) = mpsc::unbounded_channel();
    let executor = PipelineExecutor::new(gateway, None, 2, tx);

    let mut ctx = GenerationContext::new("run-retry".to_string(), run_request("SQL", 2));
    executor.run(&mut ctx).await;

    assert!(!ctx.validation_passed);
    assert_eq!(ctx.retry_count, 2);
    assert_eq!(ctx.weekly_tasks_for(1).count(), 3);
    assert!(ctx
        .error_message
        .as_deref()
        .expect("error recorded")
        .contains("validation failed after 2 retries"));
}

#[tokio::test]
async fn test_scenario_event_sequence_for_single_month_run() -> Result<()> {
    let test_db = temp_db().await?;
    let gateway = Arc::new(structured_gateway(1));
    let coordinator = StreamingCoordinator::new(
        gateway,
        None,
        Arc::clone(&test_db.db),
        PolicyConfig::default(),
        WorkerPool::new(2),
    );

    let (events_tx, events_rx) = broadcast::channel(256);
    coordinator.spawn_run(
        "run-scenario".to_string(),
        run_request("Python basics", 1),
        events_tx,
    );

    let events = collect_events(events_rx).await;
    let kinds: Vec<StreamEventKind> = events.iter().map(|e| e.kind).collect();

    assert_eq!(
        kinds,
        vec![
            StreamEventKind::Start,
            StreamEventKind::TitleReady,
            StreamEventKind::MonthReady,
            StreamEventKind::WeeksReady,
            StreamEventKind::Complete,
        ]
    );

    // Exactly one terminal event, carrying the persisted identifier
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    let complete = events.last().expect("events not empty");
    let roadmap_id = complete.data.as_ref().expect("complete carries data")["roadmap_id"]
        .as_str()
        .expect("roadmap_id is a string")
        .to_string();
    assert_eq!(roadmap_id, "run-scenario");
    assert_eq!(complete.progress, Some(100));

    // Progress is monotonically non-decreasing across the stream
    let progress: Vec<u8> = events.iter().filter_map(|e| e.progress).collect();
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));

    // The persisted hierarchy matches the accepted run
    let roadmap = test_db.db.get_roadmap(&roadmap_id).await?;
    assert_eq!(roadmap.monthly_goals.len(), 1);
    assert_eq!(roadmap.monthly_goals[0].weekly_tasks.len(), 4);
    assert_eq!(roadmap.monthly_goals[0].weekly_tasks[0].daily_tasks.len(), 7);

    Ok(())
}

#[tokio::test]
async fn test_independent_runs_complete_concurrently() -> Result<()> {
    let test_db = temp_db().await?;
    let gateway = Arc::new(structured_gateway(2));
    let coordinator = StreamingCoordinator::new(
        gateway,
        None,
        Arc::clone(&test_db.db),
        PolicyConfig::default(),
        WorkerPool::new(2),
    );

    let (tx_a, rx_a) = broadcast::channel(256);
    let (tx_b, rx_b) = broadcast::channel(256);
    coordinator.spawn_run("run-a".to_string(), run_request("Rust", 2), tx_a);
    coordinator.spawn_run("run-b".to_string(), run_request("Go", 2), tx_b);

    let (events_a, events_b) = tokio::join!(collect_events(rx_a), collect_events(rx_b));

    for events in [&events_a, &events_b] {
        let last = events.last().expect("terminal event");
        assert_eq!(last.kind, StreamEventKind::Complete);
    }

    assert!(test_db.db.get_roadmap("run-a").await.is_ok());
    assert!(test_db.db.get_roadmap("run-b").await.is_ok());

    Ok(())
}

#[tokio::test]
async fn test_month_and_week_events_pair_up_for_longer_runs() -> Result<()> {
    let test_db = temp_db().await?;
    let gateway = Arc::new(structured_gateway(3));
    let coordinator = StreamingCoordinator::new(
        gateway,
        None,
        Arc::clone(&test_db.db),
        PolicyConfig::default(),
        WorkerPool::new(2),
    );

    let (events_tx, events_rx) = broadcast::channel(256);
    coordinator.spawn_run("run-pairs".to_string(), run_request("Rust", 3), events_tx);

    let events = collect_events(events_rx).await;
    let pairs: Vec<StreamEventKind> = events
        .iter()
        .filter(|e| {
            matches!(
                e.kind,
                StreamEventKind::MonthReady | StreamEventKind::WeeksReady
            )
        })
        .map(|e| e.kind)
        .collect();

    assert_eq!(
        pairs,
        vec![
            StreamEventKind::MonthReady,
            StreamEventKind::WeeksReady,
            StreamEventKind::MonthReady,
            StreamEventKind::WeeksReady,
            StreamEventKind::MonthReady,
            StreamEventKind::WeeksReady,
        ]
    );

    Ok(())
}

//! Server-Sent Events endpoint for run progress.
//!
//! Consumers must tolerate idle gaps (individual LLM calls can take
//! seconds); the keep-alive covers them.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use tokio_stream::StreamExt;

use crate::coordinator::StreamEvent;
use crate::server::state::AppState;

/// GET /api/roadmaps/:id/events - SSE event stream for one run
pub async fn run_events(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.subscribe_events(&run_id).await;

    let stream = tokio_stream::wrappers::BroadcastStream::new(rx)
        .filter_map(|result| match result {
            Ok(event) => Some(event),
            Err(_) => None, // Skip lagged messages
        })
        .map(|event: StreamEvent| {
            let json = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());
            Ok::<_, Infallible>(Event::default().event(event.kind.as_str()).data(json))
        });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

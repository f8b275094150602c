//! The externally observable event envelope.
//!
//! One JSON object per event: `{type, message, data?, progress?}`. Exactly
//! one of `complete` | `error` terminates a stream.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamEventKind {
    Start,
    Progress,
    TitleReady,
    MonthReady,
    WeeksReady,
    Warning,
    Complete,
    Error,
}

impl StreamEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamEventKind::Start => "start",
            StreamEventKind::Progress => "progress",
            StreamEventKind::TitleReady => "title_ready",
            StreamEventKind::MonthReady => "month_ready",
            StreamEventKind::WeeksReady => "weeks_ready",
            StreamEventKind::Warning => "warning",
            StreamEventKind::Complete => "complete",
            StreamEventKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StreamEvent {
    #[serde(rename = "type")]
    pub kind: StreamEventKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
}

impl StreamEvent {
    pub fn new(kind: StreamEventKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            data: None,
            progress: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress.min(100));
        self
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, StreamEventKind::Complete | StreamEventKind::Error)
    }
}

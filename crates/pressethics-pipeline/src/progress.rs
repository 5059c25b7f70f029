//! Stage progress events.
//!
//! The orchestrator emits one `Started` and one terminal event per stage, in
//! order. Front-ends implement [`ProgressSink`] to drive their five
//! indicators; the run report keeps its own copy of every event.

use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Fetch,
    Describe,
    Retrieve,
    Draft,
    Review,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Fetch,
        Stage::Describe,
        Stage::Retrieve,
        Stage::Draft,
        Stage::Review,
    ];

    /// Korean label shown next to the progress indicator.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Fetch => "기사 수집",
            Stage::Describe => "이미지 분석",
            Stage::Retrieve => "유사 사례 검색",
            Stage::Draft => "심의문 작성",
            Stage::Review => "심의문 검토",
        }
    }

    /// 1-based position in the run.
    pub fn position(self) -> usize {
        Self::ALL.iter().position(|s| *s == self).unwrap_or(0) + 1
    }

    /// Stages that run after this one.
    pub fn following(self) -> &'static [Stage] {
        &Self::ALL[self.position()..]
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetch => "fetch",
            Stage::Describe => "describe",
            Stage::Retrieve => "retrieve",
            Stage::Draft => "draft",
            Stage::Review => "review",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Started,
    Completed,
    /// Nothing to do (no images), or never reached after an earlier failure.
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageEvent {
    pub stage: Stage,
    pub status: StageStatus,
    pub detail: Option<String>,
    pub at: DateTime<Utc>,
}

impl StageEvent {
    pub fn new(stage: Stage, status: StageStatus, detail: Option<String>) -> Self {
        Self {
            stage,
            status,
            detail,
            at: Utc::now(),
        }
    }
}

/// Receives stage events as they happen.
pub trait ProgressSink: Send + Sync {
    fn on_event(&self, event: &StageEvent);
}

/// Sink that ignores all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpSink;

impl ProgressSink for NoOpSink {
    fn on_event(&self, _event: &StageEvent) {}
}

/// Sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<StageEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<StageEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ProgressSink for RecordingSink {
    fn on_event(&self, event: &StageEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_order() {
        assert_eq!(Stage::Fetch.position(), 1);
        assert_eq!(Stage::Review.position(), 5);
        assert_eq!(
            Stage::Retrieve.following(),
            &[Stage::Draft, Stage::Review][..]
        );
        assert!(Stage::Review.following().is_empty());
    }

    #[test]
    fn recording_sink_keeps_order() {
        let sink = RecordingSink::default();
        sink.on_event(&StageEvent::new(Stage::Fetch, StageStatus::Started, None));
        sink.on_event(&StageEvent::new(
            Stage::Fetch,
            StageStatus::Completed,
            Some("ok".into()),
        ));
        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].status, StageStatus::Completed);
        assert_eq!(events[1].detail.as_deref(), Some("ok"));
    }

    #[test]
    fn event_serialises_snake_case() {
        let event = StageEvent::new(Stage::Retrieve, StageStatus::Skipped, None);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["stage"], "retrieve");
        assert_eq!(json["status"], "skipped");
    }
}

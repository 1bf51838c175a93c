//! Per-attempt LLM call metrics.
//!
//! `record` never fails and never waits on I/O. Sinks that buffer are
//! drained with `shutdown`.

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Value of `source` for planner calls
pub const UIPLAN_SOURCE: &str = "uiplan";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    /// Output passed structural validation
    Success,
    /// Output failed structural validation
    Invalid,
    /// Transport or provider failure
    Error,
}

/// One metrics event per planner attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallMetrics {
    pub timestamp: String,
    pub model: String,
    pub duration_ms: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub source: String,
    pub status: CallStatus,
}

#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// Never blocks and never fails
    fn record(&self, event: CallMetrics);

    /// Wait until every recorded event has been written
    async fn shutdown(&self) {}
}

/// Time source for timestamps and durations
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that advances by a fixed step on every read
#[derive(Debug)]
pub struct SteppingClock {
    current: Mutex<DateTime<Utc>>,
    step: Duration,
}

impl SteppingClock {
    pub fn new(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            current: Mutex::new(start),
            step,
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        let now = *current;
        *current = now + self.step;
        now
    }
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn elapsed_ms(start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    (end - start).num_milliseconds().max(0) as u64
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetricsSink;

#[async_trait]
impl MetricsSink for NoopMetricsSink {
    fn record(&self, _event: CallMetrics) {}
}

/// Emits each event as a structured `tracing` event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMetricsSink;

#[async_trait]
impl MetricsSink for TracingMetricsSink {
    fn record(&self, event: CallMetrics) {
        info!(
            target: "uispec::metrics",
            timestamp = %event.timestamp,
            model = %event.model,
            duration_ms = event.duration_ms,
            prompt_tokens = event.prompt_tokens,
            completion_tokens = event.completion_tokens,
            source = %event.source,
            status = ?event.status,
            "llm call"
        );
    }
}

/// Keeps events in memory (evaluation harnesses, tests)
#[derive(Debug, Default, Clone)]
pub struct RecordingMetricsSink {
    events: Arc<Mutex<Vec<CallMetrics>>>,
}

impl RecordingMetricsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CallMetrics> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }
}

#[async_trait]
impl MetricsSink for RecordingMetricsSink {
    fn record(&self, event: CallMetrics) {
        let mut events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        events.push(event);
    }
}

/// Appends events as JSON lines from a single writer task.
///
/// Events are written in the order they were recorded. Call [`shutdown`]
/// before the runtime goes away so queued events reach the file.
///
/// [`shutdown`]: MetricsSink::shutdown
#[derive(Debug)]
pub struct JsonlMetricsSink {
    sender: Mutex<Option<mpsc::UnboundedSender<CallMetrics>>>,
    writer: Mutex<Option<JoinHandle<()>>>,
}

impl JsonlMetricsSink {
    /// Start the writer task on the current runtime. Outside a runtime the
    /// sink drops every event with a warning.
    pub fn spawn(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(path = %path.display(), "no async runtime; metrics events will be dropped");
            return Self { sender: Mutex::new(None), writer: Mutex::new(None) };
        };

        let (sender, receiver) = mpsc::unbounded_channel();
        let writer = handle.spawn(Self::write_all(path, receiver));
        Self {
            sender: Mutex::new(Some(sender)),
            writer: Mutex::new(Some(writer)),
        }
    }

    async fn write_all(path: PathBuf, mut receiver: mpsc::UnboundedReceiver<CallMetrics>) {
        let mut file = match tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to open metrics file");
                return;
            }
        };

        while let Some(event) = receiver.recv().await {
            let line = match serde_json::to_string(&event) {
                Ok(json) => format!("{}\n", json),
                Err(e) => {
                    warn!(error = %e, "failed to encode metrics event");
                    continue;
                }
            };
            if let Err(e) = file.write_all(line.as_bytes()).await {
                warn!(path = %path.display(), error = %e, "failed to write metrics event");
            }
        }

        if let Err(e) = file.flush().await {
            warn!(path = %path.display(), error = %e, "failed to flush metrics file");
        }
    }
}

#[async_trait]
impl MetricsSink for JsonlMetricsSink {
    fn record(&self, event: CallMetrics) {
        let sender = self.sender.lock().unwrap_or_else(|e| e.into_inner());
        match sender.as_ref() {
            Some(sender) => {
                if sender.send(event).is_err() {
                    warn!("metrics writer stopped; dropping event");
                }
            }
            None => debug!("metrics sink closed; dropping event"),
        }
    }

    async fn shutdown(&self) {
        // closing the channel lets the writer drain and exit
        drop(self.sender.lock().unwrap_or_else(|e| e.into_inner()).take());
        let writer = self.writer.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(writer) = writer {
            if let Err(e) = writer.await {
                warn!(error = %e, "metrics writer task failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(status: CallStatus) -> CallMetrics {
        CallMetrics {
            timestamp: "2024-01-01T00:00:00.000Z".into(),
            model: "test-model".into(),
            duration_ms: 5,
            prompt_tokens: 10,
            completion_tokens: 20,
            source: UIPLAN_SOURCE.into(),
            status,
        }
    }

    #[test]
    fn event_uses_wire_field_names() {
        let v = serde_json::to_value(event(CallStatus::Invalid)).unwrap();
        assert_eq!(v["duration_ms"], 5);
        assert_eq!(v["prompt_tokens"], 10);
        assert_eq!(v["status"], "invalid");
        assert_eq!(v["source"], "uiplan");
    }

    #[test]
    fn stepping_clock_advances() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = SteppingClock::new(start, Duration::milliseconds(250));
        let a = clock.now();
        let b = clock.now();
        assert_eq!(elapsed_ms(a, b), 250);
        assert_eq!(format_timestamp(a), "2024-01-01T00:00:00.000Z");
    }

    #[test]
    fn recording_sink_keeps_order() {
        let sink = RecordingMetricsSink::new();
        sink.record(event(CallStatus::Invalid));
        sink.record(event(CallStatus::Success));
        let statuses: Vec<_> = sink.events().into_iter().map(|e| e.status).collect();
        assert_eq!(statuses, vec![CallStatus::Invalid, CallStatus::Success]);
    }

    #[tokio::test]
    async fn jsonl_sink_writes_every_event_in_order_before_shutdown_returns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.jsonl");
        let sink = JsonlMetricsSink::spawn(&path);
        sink.record(event(CallStatus::Invalid));
        sink.record(event(CallStatus::Error));
        sink.record(event(CallStatus::Success));
        sink.shutdown().await;

        let content = std::fs::read_to_string(&path).unwrap();
        let statuses: Vec<_> = content
            .lines()
            .map(|line| serde_json::from_str::<CallMetrics>(line).unwrap().status)
            .collect();
        assert_eq!(statuses, vec![CallStatus::Invalid, CallStatus::Error, CallStatus::Success]);

        // closed sinks drop quietly
        sink.record(event(CallStatus::Success));
        sink.shutdown().await;
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 3);
    }

    #[test]
    fn jsonl_sink_keeps_events_across_a_runtime_teardown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.jsonl");

        let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build().unwrap();
        runtime.block_on(async {
            let sink = JsonlMetricsSink::spawn(&path);
            sink.record(event(CallStatus::Invalid));
            sink.record(event(CallStatus::Invalid));
            sink.record(event(CallStatus::Success));
            sink.shutdown().await;
        });
        drop(runtime);

        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 3);
    }

    #[test]
    fn jsonl_sink_without_runtime_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        JsonlMetricsSink::spawn(dir.path().join("m.jsonl")).record(event(CallStatus::Error));
    }
}

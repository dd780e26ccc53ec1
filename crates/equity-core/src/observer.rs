//! Reporting of recoverable pipeline problems.
//!
//! The engine never logs through a global; it reports to a
//! [`PipelineObserver`] passed in by the caller.

use std::fmt::Debug;
use std::sync::Mutex;

use tracing::warn;

use crate::error::{MergeError, RowRejection};

/// Receives recoverable problems found while processing one symbol.
pub trait PipelineObserver: Send + Sync + Debug {
    /// A raw price row was dropped.
    fn row_rejected(&self, rejection: &RowRejection);

    /// A fundamentals report date could not be parsed and was skipped.
    fn report_date_dropped(&self, label: &str);

    /// The fundamentals report could not be merged.
    fn merge_failed(&self, error: &MergeError);
}

/// Observer that forwards everything to `tracing` at warn level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn row_rejected(&self, rejection: &RowRejection) {
        warn!(index = rejection.index, reason = %rejection.reason, "Dropping invalid price row");
    }

    fn report_date_dropped(&self, label: &str) {
        warn!(label, "Dropping fundamentals report with unparsable date");
    }

    fn merge_failed(&self, error: &MergeError) {
        warn!(error = %error, "Could not merge fundamentals");
    }
}

/// Something a [`RecordingObserver`] saw.
#[derive(Debug, Clone, PartialEq)]
pub enum ObservedEvent {
    /// See [`PipelineObserver::row_rejected`].
    RowRejected(RowRejection),
    /// See [`PipelineObserver::report_date_dropped`].
    ReportDateDropped(String),
    /// See [`PipelineObserver::merge_failed`].
    MergeFailed(MergeError),
}

/// Observer that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObservedEvent>>,
}

impl RecordingObserver {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<ObservedEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    fn record(&self, event: ObservedEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl PipelineObserver for RecordingObserver {
    fn row_rejected(&self, rejection: &RowRejection) {
        self.record(ObservedEvent::RowRejected(rejection.clone()));
    }

    fn report_date_dropped(&self, label: &str) {
        self.record(ObservedEvent::ReportDateDropped(label.to_string()));
    }

    fn merge_failed(&self, error: &MergeError) {
        self.record(ObservedEvent::MergeFailed(error.clone()));
    }
}

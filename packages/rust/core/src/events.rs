//! Where pipeline output goes: progress text, streamed records, and the
//! terminal event.

use tokio::sync::mpsc::UnboundedSender;

use oddsboard_shared::Record;

use crate::pipeline::PipelineRun;

/// Consumer of pipeline events. Called from the pipeline task.
pub trait EventSink: Send + Sync {
    /// Human-readable status line.
    fn progress(&self, message: &str);
    /// One record, emitted after filtering and again after each pass.
    fn record(&self, record: &Record);
    /// The run completed or degraded. Not called for cancelled runs.
    fn finished(&self, run: &PipelineRun);
}

/// No-op sink for headless/test usage.
pub struct SilentSink;

impl EventSink for SilentSink {
    fn progress(&self, _message: &str) {}
    fn record(&self, _record: &Record) {}
    fn finished(&self, _run: &PipelineRun) {}
}

/// Messages sent by [`ChannelSink`].
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    Progress(String),
    Record(Box<Record>),
    Finished(Box<PipelineRun>),
    /// Unrecoverable setup failure; no further events follow.
    Failed(String),
}

/// Forwards events over an unbounded channel to an interactive front end.
///
/// Sends to a closed channel are dropped: the receiver going away is how a
/// front end stops listening.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: UnboundedSender<PipelineEvent>,
}

impl ChannelSink {
    pub fn new(tx: UnboundedSender<PipelineEvent>) -> Self {
        Self { tx }
    }

    pub fn failed(&self, message: impl Into<String>) {
        let _ = self.tx.send(PipelineEvent::Failed(message.into()));
    }
}

impl EventSink for ChannelSink {
    fn progress(&self, message: &str) {
        let _ = self.tx.send(PipelineEvent::Progress(message.to_string()));
    }

    fn record(&self, record: &Record) {
        let _ = self.tx.send(PipelineEvent::Record(Box::new(record.clone())));
    }

    fn finished(&self, run: &PipelineRun) {
        let _ = self.tx.send(PipelineEvent::Finished(Box::new(run.clone())));
    }
}

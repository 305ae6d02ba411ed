//! Invocation entry point.
//!
//! A [`Handler`] is built once per process with its store and job, then
//! invoked once per delivered envelope. The store is injected, so whatever
//! client or connection it wraps is reused across invocations.

use crate::envelope::NotificationEnvelope;
use crate::processor::{BatchProcessor, BatchReport, ProcessOptions};
use crate::store::ImageStore;
use crate::summary::{ResultSummary, aggregate};
use crate::transform::{Job, Transform};

/// Per-invocation context supplied by whatever delivers the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    pub request_id: String,
}

impl InvocationContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
        }
    }
}

/// Result of one invocation: the summary returned to the caller plus the
/// full diagnostics behind it.
#[derive(Debug)]
pub struct Invocation {
    pub summary: ResultSummary,
    pub report: BatchReport,
}

pub struct Handler<S> {
    store: S,
    job: Job,
    transform: Box<dyn Transform + Send + Sync>,
    options: ProcessOptions,
}

impl<S: ImageStore> Handler<S> {
    pub fn new(store: S, job: Job, options: ProcessOptions) -> Self {
        Self {
            store,
            job,
            transform: job.transform(),
            options,
        }
    }

    pub fn job(&self) -> Job {
        self.job
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Process an envelope and return only the summary.
    pub fn invoke(
        &self,
        envelope: &NotificationEnvelope,
        context: &InvocationContext,
    ) -> ResultSummary {
        self.handle(envelope, context).summary
    }

    /// Process an envelope, keeping per-item diagnostics.
    pub fn handle(&self, envelope: &NotificationEnvelope, context: &InvocationContext) -> Invocation {
        let span = tracing::info_span!(
            "invocation",
            request_id = %context.request_id,
            job = %self.job,
        );
        let _guard = span.enter();

        tracing::info!(records = envelope.records.len(), "invocation started");
        let report =
            BatchProcessor::new(&self.store, self.transform.as_ref(), self.options).process(envelope);
        let summary = aggregate(report.outcome);
        tracing::info!(
            status = summary.status_code,
            processed = summary.processed,
            failed = summary.failed,
            "invocation finished"
        );

        Invocation { summary, report }
    }
}

//! Report worker: drives one message through normalize, render and write.
//!
//! Each delivery is an independent unit of work with no shared mutable
//! state, so deliveries are handled concurrently on the blocking pool,
//! bounded by a semaphore. Failures are logged with the doctor name and
//! stage and never retried here; redelivery belongs to the bus.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use uuid::Uuid;

use crate::bus::Subscription;
use crate::report::{
    normalize_all, render_rows, DocumentWriter, FailureKind, ReportError, ReportMessage,
    ReportSink,
};

/// Pipeline stage a message is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Normalizing,
    Rendering,
    Writing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Normalizing => "normalizing",
            Self::Rendering => "rendering",
            Self::Writing => "writing",
        };
        f.write_str(name)
    }
}

/// A report that could not be produced.
#[derive(Debug, Error)]
#[error("report for doctor '{doctor_name}' failed while {stage}: {source}")]
pub struct WorkerError {
    pub doctor_name: String,
    pub stage: Stage,
    #[source]
    pub source: ReportError,
}

impl WorkerError {
    fn new(doctor_name: &str, source: ReportError) -> Self {
        let stage = match source.kind() {
            FailureKind::Render => Stage::Rendering,
            FailureKind::Io => Stage::Writing,
        };
        Self {
            doctor_name: doctor_name.to_string(),
            stage,
            source,
        }
    }
}

/// Outcome counts of a [`ReportWorker::run`] loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// Deliveries that never reached the pipeline (decode or validation errors).
    pub rejected: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: Result<bool, JoinError>) {
        match outcome {
            Ok(true) => self.succeeded += 1,
            Ok(false) => self.failed += 1,
            Err(e) => {
                log::error!("Report handler crashed: {}", e);
                self.failed += 1;
            }
        }
    }
}

#[derive(Clone)]
pub struct ReportWorker {
    sink: Arc<dyn ReportSink + Send + Sync>,
}

impl ReportWorker {
    pub fn new(sink: Arc<dyn ReportSink + Send + Sync>) -> Self {
        Self { sink }
    }

    pub fn with_writer(writer: DocumentWriter) -> Self {
        Self::new(Arc::new(writer))
    }

    /// Handle one message, stamping the file with the current local time.
    pub fn handle(&self, message: &ReportMessage) -> Result<PathBuf, WorkerError> {
        self.handle_at(message, Local::now().naive_local())
    }

    /// Handle one message with an explicit generation time.
    pub fn handle_at(
        &self,
        message: &ReportMessage,
        now: NaiveDateTime,
    ) -> Result<PathBuf, WorkerError> {
        self.handle_job(Uuid::new_v4(), message, now)
    }

    fn handle_job(
        &self,
        job: Uuid,
        message: &ReportMessage,
        now: NaiveDateTime,
    ) -> Result<PathBuf, WorkerError> {
        let doctor = message.doctor_name.as_str();
        log::info!("[{}] Received report for doctor: {}", job, doctor);

        log::debug!("[{}] {}", job, Stage::Normalizing);
        let rows = normalize_all(&message.patient_details);
        if let Some((given, listed)) = message.total_mismatch() {
            log::warn!(
                "[{}] Report for {} states {} patients but lists {}; using the stated total",
                job,
                doctor,
                given,
                listed
            );
        }

        log::debug!("[{}] {}", job, Stage::Rendering);
        let document = render_rows(message, &rows);

        log::debug!("[{}] {}", job, Stage::Writing);
        match self.sink.persist(&document, doctor, now) {
            Ok(path) => {
                log::info!("[{}] Report saved: {}", job, path.display());
                Ok(path)
            }
            Err(source) => {
                let error = WorkerError::new(doctor, source);
                log::error!("[{}] {}", job, error);
                Err(error)
            }
        }
    }

    /// Consume `subscription` until it ends.
    pub async fn run<S>(&self, subscription: S, concurrency: usize) -> RunSummary
    where
        S: Subscription,
    {
        self.run_until(subscription, concurrency, std::future::pending())
            .await
    }

    /// Consume `subscription` until it ends or `shutdown` resolves.
    ///
    /// Reports already in progress always run to completion.
    pub async fn run_until<S, F>(
        &self,
        mut subscription: S,
        concurrency: usize,
        shutdown: F,
    ) -> RunSummary
    where
        S: Subscription,
        F: Future<Output = ()>,
    {
        log::info!("Report worker started (concurrency {})", concurrency);

        let limiter = Arc::new(Semaphore::new(concurrency.max(1)));
        let mut tasks = JoinSet::new();
        let mut summary = RunSummary::default();
        tokio::pin!(shutdown);

        loop {
            let delivery = tokio::select! {
                delivery = subscription.next_message() => delivery,
                _ = &mut shutdown => {
                    log::info!("Shutdown requested, finishing reports in progress");
                    None
                }
            };
            let Some(delivery) = delivery else {
                break;
            };

            while let Some(done) = tasks.try_join_next() {
                summary.record(done);
            }

            let message = match delivery {
                Ok(message) => message,
                Err(e) => {
                    log::warn!("Rejected report delivery: {}", e);
                    summary.rejected += 1;
                    continue;
                }
            };

            let permit = tokio::select! {
                permit = Arc::clone(&limiter).acquire_owned() => permit,
                _ = &mut shutdown => {
                    log::info!(
                        "Shutdown requested, report for {} was not started",
                        message.doctor_name
                    );
                    break;
                }
            };
            let Ok(permit) = permit else {
                break;
            };
            let worker = self.clone();
            tasks.spawn_blocking(move || {
                let _permit = permit;
                let now = Local::now().naive_local();
                worker.handle_job(Uuid::new_v4(), &message, now).is_ok()
            });
        }

        while let Some(done) = tasks.join_next().await {
            summary.record(done);
        }

        log::info!(
            "Report worker stopped ({} saved, {} failed, {} rejected)",
            summary.succeeded,
            summary.failed,
            summary.rejected
        );
        summary
    }
}

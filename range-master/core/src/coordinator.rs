// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{
    CoordinatorConfig, CoordinatorError, Job, JobDelivery, JobDispatcher, JobId, JobReport,
    JobStatus, ResultSink, WorkItem, WorkerHandle, WorkerId, WorkerRegistry,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

/// Master coordinator: owns worker membership and runs jobs over it.
///
/// Two delivery modes coexist on purpose:
/// - [`submit_blocking`](Self::submit_blocking) waits until the caller's
///   target worker count is reached, then returns the merged result.
/// - [`submit_async`](Self::submit_async) uses whatever workers are
///   registered right now, never waits for more, and pushes the result to a
///   [`ResultSink`] from a background task.
pub struct Coordinator {
    config: CoordinatorConfig,
    registry: WorkerRegistry,
    dispatcher: JobDispatcher,
    next_job_id: AtomicU64,
    background: TaskTracker,
    background_slots: Arc<Semaphore>,
    /// Held while admitting async submissions and while closing the pool,
    /// so nothing is spawned after shutdown has started waiting.
    admission: Mutex<()>,
    /// Rejects new submissions and releases barrier waiters.
    shutdown: CancellationToken,
    /// Cancels fan-ins still in flight.
    abort: CancellationToken,
}

impl Coordinator {
    pub fn new(config: CoordinatorConfig) -> Self {
        let dispatcher = JobDispatcher::new(config.worker_timeout());
        let background_slots = Arc::new(Semaphore::new(config.max_background_jobs.max(1)));
        Self {
            config,
            registry: WorkerRegistry::new(),
            dispatcher,
            next_job_id: AtomicU64::new(0),
            background: TaskTracker::new(),
            background_slots,
            admission: Mutex::new(()),
            shutdown: CancellationToken::new(),
            abort: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Returns a clone of the shutdown token for external control
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn register(&self, handle: WorkerHandle) -> WorkerId {
        self.registry.register(handle)
    }

    pub fn deregister(&self, id: WorkerId) -> Result<(), CoordinatorError> {
        self.registry.deregister(id)
    }

    pub fn worker_count(&self) -> usize {
        self.registry.size()
    }

    /// Runs a job once `desired_workers` workers are present and returns the
    /// merged result.
    pub async fn submit_blocking(
        &self,
        total: WorkItem,
        desired_workers: usize,
    ) -> Result<Vec<i64>, CoordinatorError> {
        self.run_blocking(total, desired_workers)
            .await
            .map(|report| report.numbers)
    }

    /// Blocking submission that also reports lost partitions and timing.
    pub async fn run_blocking(
        &self,
        total: WorkItem,
        desired_workers: usize,
    ) -> Result<JobReport, CoordinatorError> {
        if self.shutdown.is_cancelled() {
            return Err(CoordinatorError::ShuttingDown);
        }

        let started = Instant::now();
        let mut job = Job::new(self.next_job_id(), total, desired_workers);
        info!(
            job_id = %job.id(),
            min = job.total().min,
            max = job.total().max,
            desired_workers = job.desired_workers(),
            registered = self.registry.size(),
            "Waiting for workers"
        );

        let workers = match self
            .registry
            .wait_for_workers(job.desired_workers(), &self.shutdown)
            .await
        {
            Ok(workers) => workers,
            Err(e) => {
                job.fail(&e);
                return Err(e);
            }
        };

        job.assign(workers)?;
        let outcome = self.dispatcher.dispatch(&mut job, &self.abort).await?;
        job.complete();

        let elapsed = started.elapsed();
        info!(job_id = %job.id(), found = outcome.numbers.len(), elapsed_ms = elapsed.as_millis() as u64, "Job completed");
        Ok(JobReport {
            job_id: job.id(),
            status: job.status(),
            numbers: outcome.numbers,
            failures: outcome.failures,
            elapsed,
        })
    }

    /// Starts a job over the workers registered right now and returns without
    /// waiting for it. The sink receives the result once when the job
    /// completes; with no workers registered it receives `([], 0)` straight
    /// away. A forced shutdown cancels the job or its delivery, whichever is
    /// in progress.
    pub fn submit_async<S: ResultSink>(
        &self,
        total: WorkItem,
        sink: S,
    ) -> Result<JobId, CoordinatorError> {
        let _admission = self.admission.lock().unwrap_or_else(|e| e.into_inner());
        if self.shutdown.is_cancelled() {
            return Err(CoordinatorError::ShuttingDown);
        }

        let started = Instant::now();
        let job_id = self.next_job_id();
        let workers = self.registry.snapshot();
        let abort = self.abort.clone();

        if workers.is_empty() {
            warn!(%job_id, "No workers available, delivering empty result");
            self.background.spawn(deliver(
                sink,
                JobDelivery {
                    job_id,
                    numbers: Vec::new(),
                    elapsed: Duration::ZERO,
                },
                abort,
            ));
            return Ok(job_id);
        }

        let mut job = Job::new(job_id, total, workers.len());
        info!(
            %job_id,
            min = job.total().min,
            max = job.total().max,
            workers = workers.len(),
            "Accepted async job"
        );
        job.assign(workers)?;

        let dispatcher = self.dispatcher.clone();
        let slots = self.background_slots.clone();
        self.background.spawn(async move {
            let slot = tokio::select! {
                slot = slots.acquire_owned() => match slot {
                    Ok(slot) => slot,
                    Err(_) => return,
                },
                _ = abort.cancelled() => {
                    job.fail(&CoordinatorError::SubmissionCancelled);
                    return;
                }
            };

            let dispatched = dispatcher.dispatch(&mut job, &abort).await;
            // The slot bounds computation only; a slow sink must not hold it.
            drop(slot);

            match dispatched {
                Ok(outcome) => {
                    job.complete();
                    let elapsed = started.elapsed();
                    info!(%job_id, found = outcome.numbers.len(), elapsed_ms = elapsed.as_millis() as u64, "Async job completed");
                    deliver(
                        sink,
                        JobDelivery {
                            job_id,
                            numbers: outcome.numbers,
                            elapsed,
                        },
                        abort,
                    )
                    .await;
                }
                Err(e) => {
                    debug_assert_eq!(job.status(), JobStatus::Failed);
                    warn!(%job_id, error = %e, "Async job dropped without delivery");
                }
            }
        });

        Ok(job_id)
    }

    /// Number of async submissions queued or running.
    pub fn pending_async_jobs(&self) -> usize {
        self.background.len()
    }

    /// Stops accepting work, releases blocked submitters and drains async
    /// submissions. If they do not finish within the configured grace period
    /// they are cancelled.
    pub async fn shutdown(&self) {
        info!(pending = self.background.len(), "Coordinator shutting down");
        {
            let _admission = self.admission.lock().unwrap_or_else(|e| e.into_inner());
            self.shutdown.cancel();
            self.background.close();
        }

        let grace = self.config.shutdown_grace();
        if tokio::time::timeout(grace, self.background.wait())
            .await
            .is_err()
        {
            warn!(
                pending = self.background.len(),
                grace_ms = grace.as_millis() as u64,
                "Async jobs did not drain in time, cancelling them"
            );
            self.abort.cancel();
            self.background.wait().await;
        }

        self.abort.cancel();
        info!("Coordinator stopped");
    }

    fn next_job_id(&self) -> JobId {
        JobId(self.next_job_id.fetch_add(1, Ordering::Relaxed))
    }
}

/// Hands the result to the sink unless the pool is being force-cancelled.
async fn deliver<S: ResultSink>(sink: S, delivery: JobDelivery, abort: CancellationToken) {
    let job_id = delivery.job_id;
    tokio::select! {
        _ = sink.on_result(delivery) => {}
        _ = abort.cancelled() => {
            warn!(%job_id, "Result delivery cancelled by shutdown");
        }
    }
}

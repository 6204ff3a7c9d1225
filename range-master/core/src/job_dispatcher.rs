// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{CoordinatorError, Job, WorkItem, WorkerError, WorkerFailure, WorkerHandle, WorkerId};
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tokio_util::task::AbortOnDropHandle;
use tracing::{debug, info, warn};

/// Merged output of one fan-out/fan-in round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Worker results concatenated in registration order.
    pub numbers: Vec<i64>,
    pub failures: Vec<WorkerFailure>,
}

/// Sends every sub-range of a job to its worker concurrently and joins them.
#[derive(Debug, Clone)]
pub struct JobDispatcher {
    worker_timeout: Duration,
}

impl JobDispatcher {
    pub fn new(worker_timeout: Duration) -> Self {
        Self { worker_timeout }
    }

    /// Fans the job out, then waits for every invocation to succeed or fail.
    ///
    /// A failed, timed-out or panicked invocation contributes an empty result
    /// and is recorded in [`DispatchOutcome::failures`]; it never fails the
    /// job. Only cancelling `cancel` does, in which case the invocations still
    /// in flight are aborted.
    pub async fn dispatch(
        &self,
        job: &mut Job,
        cancel: &CancellationToken,
    ) -> Result<DispatchOutcome, CoordinatorError> {
        let job_id = job.id();
        info!(
            %job_id,
            workers = job.assigned_workers().len(),
            "Dispatching sub-ranges"
        );

        // Every invocation is spawned before any is awaited.
        let mut in_flight: Vec<(WorkerId, WorkItem, AbortOnDropHandle<_>)> = job
            .assignments()
            .map(|(record, item)| {
                debug!(%job_id, worker_id = %record.id, min = item.min, max = item.max, "Sending sub-range");
                let task = tokio::spawn(invoke(record.handle.clone(), item, self.worker_timeout));
                (record.id, item, AbortOnDropHandle::new(task))
            })
            .collect();
        job.start_collecting();

        let mut outcome = DispatchOutcome::default();
        for (worker_id, item, task) in in_flight.iter_mut() {
            let joined = tokio::select! {
                joined = task => joined,
                _ = cancel.cancelled() => {
                    warn!(%job_id, "Fan-in cancelled, aborting outstanding invocations");
                    job.fail(&CoordinatorError::SubmissionCancelled);
                    return Err(CoordinatorError::SubmissionCancelled);
                }
            };

            let result = joined.unwrap_or_else(|e| Err(WorkerError::Panicked(e.to_string())));
            match result {
                Ok(partial) => {
                    debug!(%job_id, %worker_id, found = partial.len(), "Worker finished");
                    outcome.numbers.extend(partial);
                }
                Err(error) => {
                    warn!(
                        %job_id,
                        %worker_id,
                        min = item.min,
                        max = item.max,
                        %error,
                        "Worker invocation failed, partition contributes no results"
                    );
                    outcome.failures.push(WorkerFailure {
                        worker_id: *worker_id,
                        item: *item,
                        error,
                    });
                }
            }
        }

        info!(
            %job_id,
            found = outcome.numbers.len(),
            failed_workers = outcome.failures.len(),
            "All workers finished"
        );
        Ok(outcome)
    }
}

async fn invoke(
    worker: WorkerHandle,
    item: WorkItem,
    limit: Duration,
) -> Result<Vec<i64>, WorkerError> {
    // Nothing to compute, and some workers treat reversed bounds as a range.
    if item.is_empty() {
        return Ok(Vec::new());
    }

    match timeout(limit, worker.compute(item)).await {
        Ok(result) => result,
        Err(_) => Err(WorkerError::Timeout(limit)),
    }
}

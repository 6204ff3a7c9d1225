// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{split_range, CoordinatorError, JobId, WorkItem, WorkerFailure, WorkerRecord};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    AwaitingWorkers,
    Dispatching,
    Collecting,
    Completed,
    Failed,
}

/// One submission's partition/dispatch/aggregate lifecycle.
///
/// Owned by exactly one submission and dropped once its result is delivered.
#[derive(Debug)]
pub struct Job {
    id: JobId,
    total: WorkItem,
    desired_workers: usize,
    assigned: Vec<WorkerRecord>,
    sub_ranges: Vec<WorkItem>,
    status: JobStatus,
}

impl Job {
    pub fn new(id: JobId, total: WorkItem, desired_workers: usize) -> Self {
        Self {
            id,
            total: WorkItem::new(total.min, total.max),
            desired_workers,
            assigned: Vec::new(),
            sub_ranges: Vec::new(),
            status: JobStatus::AwaitingWorkers,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn total(&self) -> WorkItem {
        self.total
    }

    pub fn desired_workers(&self) -> usize {
        self.desired_workers
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn sub_ranges(&self) -> &[WorkItem] {
        &self.sub_ranges
    }

    pub fn assigned_workers(&self) -> &[WorkerRecord] {
        &self.assigned
    }

    /// Fixes the worker snapshot for this job and partitions the range over
    /// it. The snapshot is never refreshed afterwards.
    pub fn assign(&mut self, workers: Vec<WorkerRecord>) -> Result<(), CoordinatorError> {
        self.transition(JobStatus::Dispatching);
        if workers.is_empty() {
            self.fail(&CoordinatorError::NoWorkersAvailable);
            return Err(CoordinatorError::NoWorkersAvailable);
        }

        self.sub_ranges = split_range(self.total, workers.len());
        self.assigned = workers;
        debug_assert_eq!(self.sub_ranges.len(), self.assigned.len());
        Ok(())
    }

    /// `(worker, sub-range)` pairs in registration order.
    pub fn assignments(&self) -> impl Iterator<Item = (&WorkerRecord, WorkItem)> + '_ {
        self.assigned.iter().zip(self.sub_ranges.iter().copied())
    }

    pub(crate) fn start_collecting(&mut self) {
        self.transition(JobStatus::Collecting);
    }

    pub(crate) fn complete(&mut self) {
        self.transition(JobStatus::Completed);
    }

    pub(crate) fn fail(&mut self, reason: &CoordinatorError) {
        warn!(job_id = %self.id, error = %reason, "Job failed");
        self.transition(JobStatus::Failed);
    }

    fn transition(&mut self, next: JobStatus) {
        debug!(job_id = %self.id, from = ?self.status, to = ?next, "Job state change");
        self.status = next;
    }
}

/// Outcome of a blocking submission.
#[derive(Debug, Clone)]
pub struct JobReport {
    pub job_id: JobId,
    pub status: JobStatus,
    pub numbers: Vec<i64>,
    /// Partitions whose worker failed; they contributed nothing to `numbers`.
    pub failures: Vec<WorkerFailure>,
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RemoteWorker, WorkerError, WorkerId};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct NoopWorker;

    #[async_trait]
    impl RemoteWorker for NoopWorker {
        async fn compute(&self, _item: WorkItem) -> Result<Vec<i64>, WorkerError> {
            Ok(Vec::new())
        }
    }

    fn records(n: u64) -> Vec<WorkerRecord> {
        (0..n)
            .map(|id| WorkerRecord {
                id: WorkerId(id),
                handle: Arc::new(NoopWorker),
            })
            .collect()
    }

    #[test]
    fn test_new_job_awaits_workers() {
        let job = Job::new(JobId(1), WorkItem::new(10, 1), 3);
        assert_eq!(job.status(), JobStatus::AwaitingWorkers);
        assert_eq!(job.total(), WorkItem { min: 1, max: 10 });
        assert_eq!(job.desired_workers(), 3);
    }

    #[test]
    fn test_assign_pairs_each_worker_with_one_sub_range() {
        let mut job = Job::new(JobId(1), WorkItem::new(1, 28), 3);
        job.assign(records(3)).unwrap();

        assert_eq!(job.status(), JobStatus::Dispatching);
        assert_eq!(job.sub_ranges().len(), job.assigned_workers().len());

        let pairs: Vec<_> = job.assignments().map(|(r, item)| (r.id, item)).collect();
        assert_eq!(
            pairs,
            vec![
                (WorkerId(0), WorkItem { min: 1, max: 9 }),
                (WorkerId(1), WorkItem { min: 10, max: 18 }),
                (WorkerId(2), WorkItem { min: 19, max: 28 }),
            ]
        );
    }

    #[test]
    fn test_assign_without_workers_fails_the_job() {
        let mut job = Job::new(JobId(1), WorkItem::new(1, 28), 0);
        assert_eq!(
            job.assign(Vec::new()),
            Err(CoordinatorError::NoWorkersAvailable)
        );
        assert_eq!(job.status(), JobStatus::Failed);
        assert!(job.sub_ranges().is_empty());
    }
}

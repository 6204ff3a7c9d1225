// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{CoordinatorError, WorkerHandle, WorkerId};
use std::fmt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// A joined worker.
#[derive(Clone)]
pub struct WorkerRecord {
    pub id: WorkerId,
    pub handle: WorkerHandle,
}

impl fmt::Debug for WorkerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerRecord").field("id", &self.id).finish()
    }
}

#[derive(Default)]
struct Membership {
    next_id: u64,
    // Registration order; ids are increasing along it.
    workers: Vec<WorkerRecord>,
}

/// Membership bookkeeping plus the readiness signal jobs wait on.
///
/// The membership lives inside a `watch` channel: mutations take its write
/// lock and bump the version, so size checks, snapshots and change
/// notifications all go through the same synchronization.
pub struct WorkerRegistry {
    membership: watch::Sender<Membership>,
}

impl Default for WorkerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerRegistry {
    pub fn new() -> Self {
        let (membership, _) = watch::channel(Membership::default());
        Self { membership }
    }

    /// Stores the handle under the next unused id and wakes any waiters.
    pub fn register(&self, handle: WorkerHandle) -> WorkerId {
        let mut assigned = WorkerId(0);
        let mut size = 0;
        self.membership.send_modify(|membership| {
            assigned = WorkerId(membership.next_id);
            membership.next_id += 1;
            membership.workers.push(WorkerRecord {
                id: assigned,
                handle,
            });
            size = membership.workers.len();
        });
        info!(worker_id = %assigned, workers = size, "Worker registered");
        assigned
    }

    /// Removes a worker. Jobs that already snapshotted it are unaffected.
    pub fn deregister(&self, id: WorkerId) -> Result<(), CoordinatorError> {
        let mut size = 0;
        let removed = self.membership.send_if_modified(|membership| {
            let Some(index) = membership.workers.iter().position(|r| r.id == id) else {
                return false;
            };
            membership.workers.remove(index);
            size = membership.workers.len();
            true
        });

        if removed {
            info!(worker_id = %id, workers = size, "Worker deregistered");
            Ok(())
        } else {
            debug!(worker_id = %id, "Deregistration of unknown worker");
            Err(CoordinatorError::UnknownWorker(id))
        }
    }

    pub fn size(&self) -> usize {
        self.membership.borrow().workers.len()
    }

    /// Current membership in registration order.
    pub fn snapshot(&self) -> Vec<WorkerRecord> {
        self.membership.borrow().workers.clone()
    }

    /// Waits until at least `desired` workers are registered and returns the
    /// membership observed at that moment.
    ///
    /// The predicate is re-checked on every membership change; a wake-up is
    /// never taken as proof on its own. Cancelling `cancel` releases the
    /// waiter with [`CoordinatorError::SubmissionCancelled`].
    pub async fn wait_for_workers(
        &self,
        desired: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<WorkerRecord>, CoordinatorError> {
        let mut changes = self.membership.subscribe();
        loop {
            {
                let membership = changes.borrow_and_update();
                if membership.workers.len() >= desired {
                    return Ok(membership.workers.clone());
                }
                debug!(
                    workers = membership.workers.len(),
                    desired, "Waiting for more workers"
                );
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(CoordinatorError::SubmissionCancelled),
                changed = changes.changed() => {
                    if changed.is_err() {
                        return Err(CoordinatorError::SubmissionCancelled);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RemoteWorker, WorkItem, WorkerError};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    struct NoopWorker;

    #[async_trait]
    impl RemoteWorker for NoopWorker {
        async fn compute(&self, _item: WorkItem) -> Result<Vec<i64>, WorkerError> {
            Ok(Vec::new())
        }
    }

    fn handle() -> WorkerHandle {
        Arc::new(NoopWorker)
    }

    #[test]
    fn test_ids_are_monotonic_and_never_reused() {
        let registry = WorkerRegistry::new();
        let a = registry.register(handle());
        let b = registry.register(handle());
        registry.deregister(b).unwrap();
        let c = registry.register(handle());

        assert_eq!(a, WorkerId(0));
        assert_eq!(b, WorkerId(1));
        assert_eq!(c, WorkerId(2));
    }

    #[test]
    fn test_snapshot_preserves_registration_order() {
        let registry = WorkerRegistry::new();
        let ids: Vec<_> = (0..4).map(|_| registry.register(handle())).collect();
        registry.deregister(ids[1]).unwrap();

        let snapshot: Vec<_> = registry.snapshot().iter().map(|r| r.id).collect();
        assert_eq!(snapshot, vec![ids[0], ids[2], ids[3]]);
    }

    #[test]
    fn test_double_deregistration_reports_unknown_worker() {
        let registry = WorkerRegistry::new();
        let id = registry.register(handle());
        registry.register(handle());

        assert_eq!(registry.deregister(id), Ok(()));
        assert_eq!(
            registry.deregister(id),
            Err(CoordinatorError::UnknownWorker(id))
        );
        assert_eq!(registry.size(), 1);
    }

    #[test]
    fn test_deregistering_never_registered_id() {
        let registry = WorkerRegistry::new();
        assert_eq!(
            registry.deregister(WorkerId(42)),
            Err(CoordinatorError::UnknownWorker(WorkerId(42)))
        );
        assert_eq!(registry.size(), 0);
    }

    #[test]
    fn test_snapshot_is_detached_from_later_changes() {
        let registry = WorkerRegistry::new();
        let id = registry.register(handle());
        let snapshot = registry.snapshot();

        registry.deregister(id).unwrap();
        registry.register(handle());
        registry.register(handle());

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, id);
    }

    #[tokio::test]
    async fn test_wait_returns_immediately_when_already_satisfied() {
        let registry = WorkerRegistry::new();
        registry.register(handle());
        registry.register(handle());

        let workers = registry
            .wait_for_workers(2, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(workers.len(), 2);
    }

    #[tokio::test]
    async fn test_wait_is_released_by_registration() {
        let registry = Arc::new(WorkerRegistry::new());
        let waiter = {
            let registry = registry.clone();
            tokio::spawn(async move {
                registry
                    .wait_for_workers(2, &CancellationToken::new())
                    .await
            })
        };

        registry.register(handle());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished(), "One worker must not satisfy a barrier of two");

        registry.register(handle());
        let workers = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake up")
            .unwrap()
            .unwrap();
        assert_eq!(workers.len(), 2);
    }

    #[tokio::test]
    async fn test_wait_rechecks_after_deregistration() {
        let registry = Arc::new(WorkerRegistry::new());
        let first = registry.register(handle());

        let waiter = {
            let registry = registry.clone();
            tokio::spawn(async move {
                registry
                    .wait_for_workers(2, &CancellationToken::new())
                    .await
            })
        };

        // Membership changes but the predicate stays false.
        registry.deregister(first).unwrap();
        registry.register(handle());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        registry.register(handle());
        let workers = waiter.await.unwrap().unwrap();
        assert_eq!(workers.len(), 2);
        assert!(workers.iter().all(|r| r.id != first));
    }

    #[tokio::test]
    async fn test_wait_is_cancellable() {
        let registry = WorkerRegistry::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = registry.wait_for_workers(1, &cancel).await;
        assert_eq!(result.unwrap_err(), CoordinatorError::SubmissionCancelled);
    }
}

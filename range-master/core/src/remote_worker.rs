// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{WorkItem, WorkerError};
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for abstracting a remote unit of computation
/// Different implementations for in-process tasks, TCP, etc.
///
/// Implementations must tolerate concurrent calls: the same worker can be
/// handed sub-ranges from several jobs at once.
#[async_trait]
pub trait RemoteWorker: Send + Sync + 'static {
    /// Compute the result set for one sub-range.
    /// The returned values are expected in ascending order.
    async fn compute(&self, item: WorkItem) -> Result<Vec<i64>, WorkerError>;
}

/// Shared handle stored by the registry and cloned into every job snapshot.
pub type WorkerHandle = Arc<dyn RemoteWorker>;

// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use async_trait::async_trait;
use range_master_core::{RangeScan, RemoteWorker, WorkItem, WorkerError};
use std::sync::Arc;

/// In-process worker: runs the scan on tokio's blocking pool.
pub struct LocalWorker<S: RangeScan> {
    scan: Arc<S>,
}

impl<S: RangeScan> LocalWorker<S> {
    pub fn new(scan: S) -> Self {
        Self {
            scan: Arc::new(scan),
        }
    }
}

impl<S: RangeScan> Clone for LocalWorker<S> {
    fn clone(&self) -> Self {
        Self {
            scan: self.scan.clone(),
        }
    }
}

#[async_trait]
impl<S: RangeScan> RemoteWorker for LocalWorker<S> {
    async fn compute(&self, item: WorkItem) -> Result<Vec<i64>, WorkerError> {
        let scan = self.scan.clone();
        tokio::task::spawn_blocking(move || scan.scan(item))
            .await
            .map_err(|e| WorkerError::Panicked(e.to_string()))
    }
}

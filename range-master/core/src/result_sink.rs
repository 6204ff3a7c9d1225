// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::JobId;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::oneshot;

/// Final result of an async submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDelivery {
    pub job_id: JobId,
    pub numbers: Vec<i64>,
    pub elapsed: Duration,
}

impl JobDelivery {
    pub fn elapsed_millis(&self) -> u64 {
        self.elapsed.as_millis().min(u64::MAX as u128) as u64
    }
}

/// Trait for delivering an async job's result back to whoever asked for it
///
/// Takes `self` by value so a sink can only ever be fired once.
#[async_trait]
pub trait ResultSink: Send + 'static {
    async fn on_result(self, delivery: JobDelivery);
}

#[async_trait]
impl ResultSink for oneshot::Sender<JobDelivery> {
    async fn on_result(self, delivery: JobDelivery) {
        let job_id = delivery.job_id;
        if self.send(delivery).is_err() {
            tracing::debug!(%job_id, "Result receiver dropped before delivery");
        }
    }
}

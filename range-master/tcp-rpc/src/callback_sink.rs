// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::protocol::{framed, send_message, JobNotification};
use crate::RpcError;
use async_trait::async_trait;
use range_master_core::{JobDelivery, ResultSink};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{info, warn};

const DELIVERY_ATTEMPTS: usize = 5;
const RETRY_DELAY: Duration = Duration::from_millis(100);

/// Pushes an async job's result to the address the client left with the
/// submission.
///
/// Every attempt (connect plus send) is bounded by `attempt_timeout`, so a
/// delivery gives up after at most
/// `DELIVERY_ATTEMPTS * (attempt_timeout + RETRY_DELAY)`.
#[derive(Debug, Clone)]
pub struct CallbackSink {
    address: SocketAddr,
    attempt_timeout: Duration,
}

impl CallbackSink {
    pub fn new(address: SocketAddr, attempt_timeout: Duration) -> Self {
        Self {
            address,
            attempt_timeout,
        }
    }

    async fn push(&self, notification: &JobNotification) -> Result<(), RpcError> {
        tokio::time::timeout(self.attempt_timeout, self.send_once(notification))
            .await
            .map_err(|_| RpcError::Timeout(self.attempt_timeout))?
    }

    async fn send_once(&self, notification: &JobNotification) -> Result<(), RpcError> {
        let stream = TcpStream::connect(self.address).await?;
        let mut framed = framed(stream);
        send_message(&mut framed, notification).await
    }
}

#[async_trait]
impl ResultSink for CallbackSink {
    async fn on_result(self, delivery: JobDelivery) {
        let notification = JobNotification {
            job_id: delivery.job_id,
            elapsed_ms: delivery.elapsed_millis(),
            numbers: delivery.numbers,
        };

        for attempt in 1..=DELIVERY_ATTEMPTS {
            match self.push(&notification).await {
                Ok(()) => {
                    info!(job_id = %notification.job_id, callback = %self.address, "Delivered job result");
                    return;
                }
                Err(e) => {
                    warn!(job_id = %notification.job_id, callback = %self.address, attempt, error = %e, "Failed to deliver job result");
                    if attempt < DELIVERY_ATTEMPTS {
                        tokio::time::sleep(RETRY_DELAY).await;
                    }
                }
            }
        }
        warn!(job_id = %notification.job_id, callback = %self.address, "Giving up on job result delivery");
    }
}

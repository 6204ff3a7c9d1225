// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::protocol::{call, WorkerRequest, WorkerResponse};
use async_trait::async_trait;
use range_master_core::{RemoteWorker, WorkItem, WorkerError};
use std::net::SocketAddr;

/// Master-side handle to a worker process. Each call opens its own
/// connection, so an unreachable worker only fails the calls made to it.
#[derive(Debug, Clone)]
pub struct TcpWorker {
    address: SocketAddr,
}

impl TcpWorker {
    pub fn new(address: SocketAddr) -> Self {
        Self { address }
    }
}

#[async_trait]
impl RemoteWorker for TcpWorker {
    async fn compute(&self, item: WorkItem) -> Result<Vec<i64>, WorkerError> {
        let request = WorkerRequest::Compute {
            min: item.min,
            max: item.max,
        };
        let reply = call(self.address, &request)
            .await
            .map_err(|e| WorkerError::Transport(format!("{}: {}", self.address, e)))?;

        match reply {
            WorkerResponse::Numbers(numbers) => Ok(numbers),
            WorkerResponse::Error(message) => Err(WorkerError::Remote(message)),
        }
    }
}

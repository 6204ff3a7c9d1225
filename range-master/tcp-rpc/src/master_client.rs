// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::protocol::{call, framed, recv_message, JobNotification, MasterRequest, MasterResponse};
use crate::RpcError;
use range_master_core::{JobId, WorkItem, WorkerId};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::warn;

/// Reply to a blocking submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub job_id: JobId,
    pub numbers: Vec<i64>,
    pub elapsed_ms: u64,
    pub failed_workers: usize,
}

/// Talks to a master: used by workers to join and leave, and by clients to
/// submit jobs.
#[derive(Debug, Clone)]
pub struct MasterClient {
    master: SocketAddr,
}

impl MasterClient {
    pub fn new(master: SocketAddr) -> Self {
        Self { master }
    }

    async fn request(&self, request: MasterRequest) -> Result<MasterResponse, RpcError> {
        match call(self.master, &request).await? {
            MasterResponse::Error(message) => Err(RpcError::Remote(message)),
            response => Ok(response),
        }
    }

    pub async fn register_worker(&self, address: SocketAddr) -> Result<WorkerId, RpcError> {
        match self.request(MasterRequest::RegisterWorker { address }).await? {
            MasterResponse::Registered { id } => Ok(id),
            other => Err(unexpected(other)),
        }
    }

    pub async fn deregister_worker(&self, id: WorkerId) -> Result<(), RpcError> {
        match self.request(MasterRequest::DeregisterWorker { id }).await? {
            MasterResponse::Deregistered => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    pub async fn worker_count(&self) -> Result<usize, RpcError> {
        match self.request(MasterRequest::WorkerCount).await? {
            MasterResponse::WorkerCount { count } => Ok(count),
            other => Err(unexpected(other)),
        }
    }

    /// Blocks until `workers` workers have joined the master and the job has
    /// finished.
    pub async fn submit(&self, total: WorkItem, workers: usize) -> Result<JobOutcome, RpcError> {
        let request = MasterRequest::SubmitJob {
            min: total.min,
            max: total.max,
            workers,
        };
        match self.request(request).await? {
            MasterResponse::JobResult {
                job_id,
                numbers,
                elapsed_ms,
                failed_workers,
            } => Ok(JobOutcome {
                job_id,
                numbers,
                elapsed_ms,
                failed_workers,
            }),
            other => Err(unexpected(other)),
        }
    }

    /// Submits an async job. A listener is bound on `callback` before the
    /// request goes out, so the result cannot arrive before anyone is
    /// listening for it.
    pub async fn submit_async(
        &self,
        total: WorkItem,
        callback: SocketAddr,
    ) -> Result<PendingJob, RpcError> {
        let listener = TcpListener::bind(callback).await?;
        let callback = listener.local_addr()?;
        let request = MasterRequest::SubmitJobAsync {
            min: total.min,
            max: total.max,
            callback,
        };
        match self.request(request).await? {
            MasterResponse::Accepted { job_id } => Ok(PendingJob { job_id, listener }),
            other => Err(unexpected(other)),
        }
    }
}

/// An accepted async job whose result has not been received yet.
pub struct PendingJob {
    job_id: JobId,
    listener: TcpListener,
}

impl PendingJob {
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Waits for the master to push this job's result.
    pub async fn wait(self) -> Result<JobNotification, RpcError> {
        loop {
            let (stream, peer) = self.listener.accept().await?;
            let mut framed = framed(stream);
            match recv_message::<JobNotification>(&mut framed).await {
                Ok(notification) if notification.job_id == self.job_id => return Ok(notification),
                Ok(notification) => {
                    warn!(expected = %self.job_id, received = %notification.job_id, "Ignoring result for another job")
                }
                Err(e) => warn!(%peer, error = %e, "Ignoring malformed callback"),
            }
        }
    }
}

fn unexpected(response: MasterResponse) -> RpcError {
    RpcError::UnexpectedReply(format!("{:?}", response))
}

/// Parses user-supplied bounds, rejecting anything that is not an integer.
pub fn parse_range(min: &str, max: &str) -> Result<WorkItem, RpcError> {
    Ok(WorkItem::parse(min, max)?)
}

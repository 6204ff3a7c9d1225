// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::protocol::{framed, next_message, send_message, WorkerRequest, WorkerResponse};
use crate::{MasterClient, RpcError};
use range_master_core::{RangeScan, WorkItem};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Serves `Compute` requests by running a [`RangeScan`] on the blocking pool.
pub struct WorkerServer<S: RangeScan> {
    listener: TcpListener,
    scan: Arc<S>,
}

impl<S: RangeScan> WorkerServer<S> {
    pub async fn bind(address: SocketAddr, scan: S) -> Result<Self, RpcError> {
        let listener = TcpListener::bind(address).await?;
        Ok(Self {
            listener,
            scan: Arc::new(scan),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, RpcError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections until `shutdown` fires.
    pub async fn run(self, shutdown: CancellationToken) {
        loop {
            let accepted = tokio::select! {
                accepted = self.listener.accept() => accepted,
                _ = shutdown.cancelled() => break,
            };

            match accepted {
                Ok((stream, peer)) => {
                    let scan = self.scan.clone();
                    tokio::spawn(async move {
                        if let Err(e) = serve_connection(stream, scan).await {
                            warn!(%peer, error = %e, "Worker connection failed");
                        }
                    });
                }
                Err(e) => warn!(error = %e, "Failed to accept connection"),
            }
        }
        debug!("Worker server stopped");
    }
}

async fn serve_connection<S: RangeScan>(stream: TcpStream, scan: Arc<S>) -> Result<(), RpcError> {
    let mut framed = framed(stream);
    while let Some(request) = next_message::<WorkerRequest>(&mut framed).await {
        let response = match request {
            Ok(WorkerRequest::Compute { min, max }) => compute(&scan, WorkItem::new(min, max)).await,
            Err(RpcError::Serde(e)) => WorkerResponse::Error(format!("Invalid request: {}", e)),
            Err(e) => return Err(e),
        };
        send_message(&mut framed, &response).await?;
    }
    Ok(())
}

async fn compute<S: RangeScan>(scan: &Arc<S>, item: WorkItem) -> WorkerResponse {
    let scan = scan.clone();
    match tokio::task::spawn_blocking(move || scan.scan(item)).await {
        Ok(numbers) => {
            debug!(%item, found = numbers.len(), "Computed sub-range");
            WorkerResponse::Numbers(numbers)
        }
        Err(e) => WorkerResponse::Error(format!("Scan of {} failed: {}", item, e)),
    }
}

/// Runs a worker process: serves on `listen`, joins the master, and leaves
/// again once `shutdown` fires.
///
/// `advertise` is the address the master should dial; it defaults to the
/// bound address.
pub async fn run_worker<S: RangeScan>(
    master: SocketAddr,
    listen: SocketAddr,
    advertise: Option<SocketAddr>,
    scan: S,
    shutdown: CancellationToken,
) -> Result<(), RpcError> {
    let server = WorkerServer::bind(listen, scan).await?;
    let address = match advertise {
        Some(address) => address,
        None => server.local_addr()?,
    };
    let server_task = tokio::spawn(server.run(shutdown.clone()));

    let client = MasterClient::new(master);
    let id = match client.register_worker(address).await {
        Ok(id) => id,
        Err(e) => {
            shutdown.cancel();
            let _ = server_task.await;
            return Err(e);
        }
    };
    info!(worker_id = %id, %address, %master, "Joined master");

    shutdown.cancelled().await;

    match client.deregister_worker(id).await {
        Ok(()) => info!(worker_id = %id, "Left master"),
        Err(e) => warn!(worker_id = %id, error = %e, "Failed to deregister from master"),
    }
    let _ = server_task.await;
    Ok(())
}

// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::protocol::{framed, next_message, send_message, MasterRequest, MasterResponse};
use crate::{CallbackSink, RpcError, TcpWorker};
use futures::StreamExt;
use range_master_core::{Coordinator, WorkItem};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Network front of a [`Coordinator`]: one task per client connection.
pub struct MasterServer {
    listener: TcpListener,
    coordinator: Arc<Coordinator>,
}

impl MasterServer {
    pub async fn bind(address: SocketAddr, coordinator: Arc<Coordinator>) -> Result<Self, RpcError> {
        let listener = TcpListener::bind(address).await?;
        Ok(Self {
            listener,
            coordinator,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, RpcError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections until `shutdown` fires, then shuts the
    /// coordinator down.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(address = ?self.listener.local_addr().ok(), "Master listening");
        loop {
            let accepted = tokio::select! {
                accepted = self.listener.accept() => accepted,
                _ = shutdown.cancelled() => break,
            };

            match accepted {
                Ok((stream, peer)) => {
                    let coordinator = self.coordinator.clone();
                    tokio::spawn(async move {
                        if let Err(e) = serve_connection(stream, coordinator).await {
                            warn!(%peer, error = %e, "Client connection failed");
                        }
                    });
                }
                Err(e) => warn!(error = %e, "Failed to accept connection"),
            }
        }

        self.coordinator.shutdown().await;
    }
}

async fn serve_connection(stream: TcpStream, coordinator: Arc<Coordinator>) -> Result<(), RpcError> {
    let mut framed = framed(stream);
    while let Some(request) = next_message::<MasterRequest>(&mut framed).await {
        let response = match request {
            // Anything read mid-request means the client left or broke lockstep.
            Ok(request) => tokio::select! {
                response = handle_request(&coordinator, request) => response,
                frame = framed.next() => {
                    return match frame {
                        None | Some(Err(_)) => {
                            debug!("Client disconnected, abandoning request");
                            Ok(())
                        }
                        Some(Ok(_)) => Err(RpcError::UnexpectedReply(
                            "request sent before the previous reply".to_string(),
                        )),
                    };
                }
            },
            Err(RpcError::Serde(e)) => MasterResponse::Error(format!("Invalid request: {}", e)),
            Err(e) => return Err(e),
        };
        send_message(&mut framed, &response).await?;
    }
    Ok(())
}

pub async fn handle_request(coordinator: &Coordinator, request: MasterRequest) -> MasterResponse {
    debug!(?request, "Handling request");
    match request {
        MasterRequest::RegisterWorker { address } => {
            let id = coordinator.register(Arc::new(TcpWorker::new(address)));
            MasterResponse::Registered { id }
        }
        MasterRequest::DeregisterWorker { id } => match coordinator.deregister(id) {
            Ok(()) => MasterResponse::Deregistered,
            Err(e) => MasterResponse::Error(e.to_string()),
        },
        MasterRequest::WorkerCount => MasterResponse::WorkerCount {
            count: coordinator.worker_count(),
        },
        MasterRequest::SubmitJob { min, max, workers } => {
            match coordinator.run_blocking(WorkItem::new(min, max), workers).await {
                Ok(report) => MasterResponse::JobResult {
                    job_id: report.job_id,
                    elapsed_ms: report.elapsed.as_millis().min(u64::MAX as u128) as u64,
                    failed_workers: report.failures.len(),
                    numbers: report.numbers,
                },
                Err(e) => MasterResponse::Error(e.to_string()),
            }
        }
        MasterRequest::SubmitJobAsync { min, max, callback } => {
            let sink = CallbackSink::new(callback, coordinator.config().delivery_timeout());
            match coordinator.submit_async(WorkItem::new(min, max), sink) {
                Ok(job_id) => MasterResponse::Accepted { job_id },
                Err(e) => MasterResponse::Error(e.to_string()),
            }
        }
    }
}

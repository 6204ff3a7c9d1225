// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Wire messages and framing.
//!
//! Every message is a JSON document in a length-delimited frame. A
//! connection carries requests and their replies in lockstep; the callback
//! connection from master to client carries a single [`JobNotification`].

use crate::RpcError;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use range_master_core::{JobId, WorkerId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

/// Requests understood by the master.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum MasterRequest {
    /// A worker joins; `address` is where it serves [`WorkerRequest`]s.
    RegisterWorker { address: SocketAddr },
    DeregisterWorker { id: WorkerId },
    WorkerCount,
    /// Blocking job: the reply is sent once `workers` workers have joined
    /// and the job has finished.
    SubmitJob { min: i64, max: i64, workers: usize },
    /// Async job over the current workers. Replied to with `Accepted`; the
    /// result is pushed to `callback` later.
    SubmitJobAsync {
        min: i64,
        max: i64,
        callback: SocketAddr,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum MasterResponse {
    Registered {
        id: WorkerId,
    },
    Deregistered,
    WorkerCount {
        count: usize,
    },
    JobResult {
        job_id: JobId,
        numbers: Vec<i64>,
        elapsed_ms: u64,
        failed_workers: usize,
    },
    Accepted {
        job_id: JobId,
    },
    Error(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum WorkerRequest {
    Compute { min: i64, max: i64 },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum WorkerResponse {
    Numbers(Vec<i64>),
    Error(String),
}

/// Result of an async job, pushed from the master to the client.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct JobNotification {
    pub job_id: JobId,
    pub numbers: Vec<i64>,
    pub elapsed_ms: u64,
}

pub type FramedStream = Framed<TcpStream, LengthDelimitedCodec>;

pub fn framed(stream: TcpStream) -> FramedStream {
    Framed::new(stream, LengthDelimitedCodec::new())
}

pub async fn send_message<T: Serialize>(
    framed: &mut FramedStream,
    message: &T,
) -> Result<(), RpcError> {
    let body = serde_json::to_vec(message)?;
    framed.send(Bytes::from(body)).await?;
    Ok(())
}

/// Reads the next message; `None` once the peer has closed the connection.
pub async fn next_message<T: DeserializeOwned>(
    framed: &mut FramedStream,
) -> Option<Result<T, RpcError>> {
    let frame = framed.next().await?;
    Some(
        frame
            .map_err(RpcError::from)
            .and_then(|bytes| serde_json::from_slice(&bytes).map_err(RpcError::from)),
    )
}

pub async fn recv_message<T: DeserializeOwned>(framed: &mut FramedStream) -> Result<T, RpcError> {
    next_message(framed).await.unwrap_or(Err(RpcError::ConnectionClosed))
}

/// One request/reply exchange on a fresh connection.
pub async fn call<Req, Resp>(address: SocketAddr, request: &Req) -> Result<Resp, RpcError>
where
    Req: Serialize,
    Resp: DeserializeOwned,
{
    let stream = TcpStream::connect(address).await?;
    let mut framed = framed(stream);
    send_message(&mut framed, request).await?;
    recv_message(&mut framed).await
}

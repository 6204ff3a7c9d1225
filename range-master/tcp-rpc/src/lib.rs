// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

mod rpc_error;
pub use rpc_error::RpcError;

pub mod protocol;
pub use protocol::{JobNotification, MasterRequest, MasterResponse, WorkerRequest, WorkerResponse};

mod tcp_worker;
pub use tcp_worker::TcpWorker;

mod callback_sink;
pub use callback_sink::CallbackSink;

mod master_client;
pub use master_client::{parse_range, JobOutcome, MasterClient, PendingJob};

mod master_server;
pub use master_server::{handle_request, MasterServer};

mod worker_server;
pub use worker_server::{run_worker, WorkerServer};

pub mod shutdown;

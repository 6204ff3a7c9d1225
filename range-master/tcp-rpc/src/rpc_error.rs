// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use range_master_core::CoordinatorError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed message: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Connection closed before a reply was received")]
    ConnectionClosed,

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Unexpected reply: {0}")]
    UnexpectedReply(String),

    #[error("Master reported an error: {0}")]
    Remote(String),

    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),
}

// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{WorkItem, WorkerId};
use std::time::Duration;
use thiserror::Error;

/// Why a single worker invocation produced no result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("worker reported an error: {0}")]
    Remote(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("invocation panicked: {0}")]
    Panicked(String),
}

/// A lost partition: which worker, which sub-range, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerFailure {
    pub worker_id: WorkerId,
    pub item: WorkItem,
    pub error: WorkerError,
}

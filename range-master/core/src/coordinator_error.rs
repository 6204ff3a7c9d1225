// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::WorkerId;
use thiserror::Error;

/// Job-level and membership-level failures reported to callers.
///
/// Per-worker failures are not in here: they are recovered inside the
/// dispatcher and show up as [`WorkerFailure`](crate::WorkerFailure)s.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    #[error("Unknown worker: {0}")]
    UnknownWorker(WorkerId),

    #[error("No workers available")]
    NoWorkersAvailable,

    #[error("Submission cancelled")]
    SubmissionCancelled,

    #[error("Coordinator is shutting down")]
    ShuttingDown,

    #[error("Invalid range: {0}")]
    InvalidRange(String),
}

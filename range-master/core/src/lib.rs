// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

mod ids;
pub use ids::{JobId, WorkerId};

mod work_item;
pub use work_item::WorkItem;

mod coordinator_error;
pub use coordinator_error::CoordinatorError;

mod worker_error;
pub use worker_error::{WorkerError, WorkerFailure};

pub mod remote_worker;
pub use remote_worker::{RemoteWorker, WorkerHandle};

pub mod range_scan;
pub use range_scan::RangeScan;

pub mod result_sink;
pub use result_sink::{JobDelivery, ResultSink};

mod worker_registry;
pub use worker_registry::{WorkerRecord, WorkerRegistry};

pub mod range_partitioner;
pub use range_partitioner::split_range;

mod job;
pub use job::{Job, JobReport, JobStatus};

mod job_dispatcher;
pub use job_dispatcher::{DispatchOutcome, JobDispatcher};

mod coordinator_config;
pub use coordinator_config::{ConfigError, CoordinatorConfig};

mod coordinator;
pub use coordinator::Coordinator;

// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::WorkItem;

/// The work function a worker runs over its sub-range.
///
/// Must be pure and deterministic: the coordinator relies on
/// `scan(a) ++ scan(b) == scan(a ∪ b)` for adjacent `a`, `b`.
pub trait RangeScan: Send + Sync + 'static {
    /// Returns the matching values of `item` in ascending order.
    fn scan(&self, item: WorkItem) -> Vec<i64>;
}

impl<F> RangeScan for F
where
    F: Fn(WorkItem) -> Vec<i64> + Send + Sync + 'static,
{
    fn scan(&self, item: WorkItem) -> Vec<i64> {
        (self)(item)
    }
}

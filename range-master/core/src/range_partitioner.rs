// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::WorkItem;

/// Splits `total` into `parts` contiguous sub-ranges, one per worker.
///
/// With `delta = (max - min) / parts`, part `i` covers
/// `[min + i*delta, min + (i+1)*delta)` and the last part covers
/// `[min + (parts-1)*delta, max]`, absorbing the division remainder.
/// The parts are pairwise disjoint and their union is exactly `total`.
///
/// Returns an empty vector when `parts == 0`; callers must treat that as
/// "no workers", not as an empty result.
pub fn split_range(total: WorkItem, parts: usize) -> Vec<WorkItem> {
    if parts == 0 {
        return Vec::new();
    }

    let total = WorkItem::new(total.min, total.max);
    // i128 keeps (max - min) representable for the full i64 domain
    let min = total.min as i128;
    let max = total.max as i128;
    let parts = parts as i128;
    let delta = (max - min) / parts;

    (0..parts)
        .map(|i| {
            let start = min + i * delta;
            let end = if i == parts - 1 {
                max
            } else {
                min + (i + 1) * delta - 1
            };

            // start and end both lie inside [min, max] unless the part is empty
            if end < start {
                WorkItem::empty_at(start as i64)
            } else {
                WorkItem {
                    min: start as i64,
                    max: end as i64,
                }
            }
        })
        .collect()
}

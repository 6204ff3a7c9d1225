// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use range_master_core::{RangeScan, WorkItem};

/// Scans a range for perfect numbers: positive integers equal to the sum of
/// their proper divisors.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerfectNumbers;

impl RangeScan for PerfectNumbers {
    fn scan(&self, item: WorkItem) -> Vec<i64> {
        if item.is_empty() {
            return Vec::new();
        }
        (item.min.max(2)..=item.max).filter(|&n| is_perfect(n)).collect()
    }
}

/// Divisor pairs are summed up to `sqrt(n)`, bailing out as soon as the sum
/// exceeds `n`.
pub fn is_perfect(n: i64) -> bool {
    if n < 2 {
        return false;
    }

    let n = n as u64;
    let mut sum = 1u64;
    let mut divisor = 2u64;
    while divisor * divisor <= n {
        if n % divisor == 0 {
            let pair = n / divisor;
            sum += divisor;
            if pair != divisor {
                sum += pair;
            }
            if sum > n {
                return false;
            }
        }
        divisor += 1;
    }
    sum == n
}

// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::CoordinatorError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed integer interval `[min, max]` assigned to one worker.
///
/// An item with `max < min` is empty. Empty items only come out of
/// [`split_range`](crate::split_range) when a range holds fewer integers
/// than there are workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkItem {
    pub min: i64,
    pub max: i64,
}

impl WorkItem {
    /// Builds an item from two bounds given in either order.
    pub fn new(a: i64, b: i64) -> Self {
        if a <= b {
            Self { min: a, max: b }
        } else {
            Self { min: b, max: a }
        }
    }

    /// Empty item positioned at `start`, i.e. the half-open `[start, start)`.
    pub fn empty_at(start: i64) -> Self {
        match start.checked_sub(1) {
            Some(max) => Self { min: start, max },
            // [MIN, MIN) has no predecessor to use as max
            None => Self {
                min: start + 1,
                max: start,
            },
        }
    }

    /// Parses user-supplied bounds, rejecting anything that is not an integer.
    pub fn parse(min: &str, max: &str) -> Result<Self, CoordinatorError> {
        let parse_bound = |raw: &str| {
            raw.trim().parse::<i64>().map_err(|_| {
                CoordinatorError::InvalidRange(format!("'{}' is not an integer", raw.trim()))
            })
        };
        Ok(Self::new(parse_bound(min)?, parse_bound(max)?))
    }

    pub fn is_empty(&self) -> bool {
        self.max < self.min
    }

    /// Number of integers covered.
    pub fn len(&self) -> u128 {
        if self.is_empty() {
            0
        } else {
            (self.max as i128 - self.min as i128 + 1) as u128
        }
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "[{}, {})", self.min, self.min)
        } else {
            write!(f, "[{}, {}]", self.min, self.max)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_reversed_bounds() {
        assert_eq!(WorkItem::new(28, 1), WorkItem { min: 1, max: 28 });
        assert_eq!(WorkItem::new(1, 28), WorkItem { min: 1, max: 28 });
    }

    #[test]
    fn test_single_value_item_is_not_empty() {
        let item = WorkItem::new(7, 7);
        assert!(!item.is_empty());
        assert_eq!(item.len(), 1);
    }

    #[test]
    fn test_empty_at_covers_nothing() {
        let item = WorkItem::empty_at(10);
        assert!(item.is_empty());
        assert_eq!(item.len(), 0);
        assert_eq!(item.to_string(), "[10, 10)");

        let edge = WorkItem::empty_at(i64::MIN);
        assert!(edge.is_empty());
        assert_eq!(edge.len(), 0);
    }

    #[test]
    fn test_len_of_full_domain_does_not_overflow() {
        let item = WorkItem::new(i64::MIN, i64::MAX);
        assert_eq!(item.len(), 1u128 << 64);
    }

    #[test]
    fn test_parse_accepts_padded_integers() {
        let item = WorkItem::parse(" 1000", "1 ").unwrap();
        assert_eq!(item, WorkItem { min: 1, max: 1000 });
    }

    #[test]
    fn test_parse_rejects_non_numeric_bounds() {
        let err = WorkItem::parse("1", "ten").unwrap_err();
        assert_eq!(
            err,
            CoordinatorError::InvalidRange("'ten' is not an integer".to_string())
        );
        assert!(matches!(
            WorkItem::parse("", "5"),
            Err(CoordinatorError::InvalidRange(_))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(WorkItem::new(1, 9).to_string(), "[1, 9]");
        assert_eq!(WorkItem::empty_at(4).to_string(), "[4, 4)");
    }
}

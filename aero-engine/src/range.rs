//! Operating-point range resolution
//!
//! A polar declares one or more value ranges; the resolver concatenates the
//! active ones, sorts ascending and collapses near-duplicates so overlapping
//! ranges never solve the same point twice.

use serde::{Deserialize, Serialize};

/// Absolute tolerance under which two consecutive sorted values are
/// considered the same operating point.
pub const RANGE_TOLERANCE: f64 = 1e-6;

/// A declared sweep range.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Range {
    /// Inactive ranges are ignored by the resolver
    pub active: bool,
    /// Sweep values, in any order
    pub values: Vec<f64>,
}

impl Range {
    /// An active range over the given values.
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            active: true,
            values,
        }
    }

    /// Evenly spaced values from `start` to `end` inclusive.
    pub fn spaced(start: f64, end: f64, n: usize) -> Self {
        if n <= 1 {
            return Self::new(vec![start]);
        }
        let step = (end - start) / (n - 1) as f64;
        Self::new((0..n).map(|i| start + i as f64 * step).collect())
    }
}

/// Merge the active ranges into one ascending, deduplicated value list.
///
/// Each sorted value is compared to its accepted predecessor; values within
/// `RANGE_TOLERANCE` collapse onto the first one seen. All ranges inactive
/// or empty yields an empty list.
pub fn resolve_ranges(ranges: &[Range]) -> Vec<f64> {
    let mut values: Vec<f64> = ranges
        .iter()
        .filter(|r| r.active)
        .flat_map(|r| r.values.iter().copied())
        .filter(|v| v.is_finite())
        .collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mut resolved = Vec::with_capacity(values.len());
    let mut last = f64::NEG_INFINITY;
    for v in values {
        if (v - last).abs() > RANGE_TOLERANCE {
            resolved.push(v);
            last = v;
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sorts_and_merges() {
        let ranges = [
            Range::new(vec![2.0, 0.0, 4.0]),
            Range::new(vec![1.0, 3.0]),
        ];
        assert_eq!(resolve_ranges(&ranges), vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_inactive_and_empty() {
        assert!(resolve_ranges(&[]).is_empty());
        let inactive = Range {
            active: false,
            values: vec![1.0, 2.0],
        };
        assert!(resolve_ranges(&[inactive]).is_empty());
        assert!(resolve_ranges(&[Range::new(vec![])]).is_empty());
    }

    #[test]
    fn test_near_duplicates_collapse_to_first_seen() {
        let ranges = [Range::new(vec![1.0, 1.0 + 5e-7, 2.0])];
        let resolved = resolve_ranges(&ranges);
        assert_eq!(resolved.len(), 2);
        assert_relative_eq!(resolved[0], 1.0);
        assert_relative_eq!(resolved[1], 2.0);
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let ranges = [Range::new(vec![0.0, 1e-7, 2e-7, 5.0, 5.0])];
        let once = resolve_ranges(&ranges);
        let twice = resolve_ranges(&[Range::new(once.clone())]);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_spaced_range() {
        let r = Range::spaced(-4.0, 4.0, 5);
        assert_eq!(r.values, vec![-4.0, -2.0, 0.0, 2.0, 4.0]);
    }
}

//! Key batching helpers.
//!
//! Query engines cap the number of bound parameters per statement, so an
//! unbounded key list is split into consecutive chunks before being bound
//! into `IN (...)` predicates.

use std::collections::HashSet;
use std::ops::Range;

use crate::value::Value;

/// Default ceiling on keys bound into a single statement.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1500;

/// Compute the index ranges of each batch for a key list of `len` keys.
///
/// A list that fits under `max_batch_size` yields exactly one range. Longer
/// lists yield consecutive, non-overlapping ranges of at most
/// `max_batch_size` keys in original order; only the last one may be short.
/// An empty list yields no ranges. A ceiling of zero is treated as one.
pub fn compute_batch_ranges(len: usize, max_batch_size: usize) -> Vec<Range<usize>> {
    if len == 0 {
        return vec![];
    }

    let limit = max_batch_size.max(1);
    if len <= limit {
        return vec![0..len];
    }

    let mut ranges = Vec::with_capacity(len.div_ceil(limit));
    let mut start = 0usize;
    while start < len {
        let end = std::cmp::min(start + limit, len);
        ranges.push(start..end);
        start = end;
    }
    ranges
}

/// Collect the non-null values of `field` from `rows`, in row order.
///
/// Rows where the field is absent or `Null` are skipped.
pub fn extract_keys<'a, I>(rows: I, field: &str) -> Vec<Value>
where
    I: IntoIterator<Item = &'a crate::table::Row>,
{
    rows.into_iter()
        .filter_map(|row| row.get(field))
        .filter(|v| !v.is_null())
        .cloned()
        .collect()
}

/// Drop repeated keys, keeping the first occurrence of each.
///
/// Fetching a duplicated key in two different batches would return the same
/// secondary rows twice, so the fetch list is deduplicated before chunking.
pub fn dedup_keys(keys: &[Value]) -> Vec<Value> {
    let mut seen = HashSet::with_capacity(keys.len());
    keys.iter()
        .filter(|k| k.key().is_some_and(|repr| seen.insert(repr)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Row;

    #[test]
    fn test_batch_ranges_empty() {
        assert_eq!(compute_batch_ranges(0, 1500), vec![]);
    }

    #[test]
    fn test_batch_ranges_under_limit_is_single_batch() {
        assert_eq!(compute_batch_ranges(2, 1500), vec![0..2]);
    }

    #[test]
    fn test_batch_ranges_exact_limit_is_single_batch() {
        assert_eq!(compute_batch_ranges(1500, 1500), vec![0..1500]);
    }

    #[test]
    fn test_batch_ranges_one_over_limit() {
        assert_eq!(compute_batch_ranges(1501, 1500), vec![0..1500, 1500..1501]);
    }

    #[test]
    fn test_batch_ranges_partition_in_order() {
        let ranges = compute_batch_ranges(10, 3);
        assert_eq!(ranges, vec![0..3, 3..6, 6..9, 9..10]);
    }

    #[test]
    fn test_batch_ranges_cover_every_key_once() {
        for (len, limit) in [(1, 1), (7, 2), (4000, 1500), (3000, 1500), (17, 5)] {
            let ranges = compute_batch_ranges(len, limit);
            let expected = if len <= limit { 1 } else { len.div_ceil(limit) };
            assert_eq!(ranges.len(), expected, "len={} limit={}", len, limit);
            let mut next = 0;
            for r in &ranges {
                assert_eq!(r.start, next);
                assert!(r.len() <= limit);
                next = r.end;
            }
            assert_eq!(next, len);
        }
    }

    #[test]
    fn test_batch_ranges_zero_limit_clamped() {
        assert_eq!(compute_batch_ranges(3, 0), vec![0..1, 1..2, 2..3]);
    }

    #[test]
    fn test_extract_keys_skips_null_and_absent() {
        let rows = vec![
            Row::new().with("id", 1),
            Row::new().with("id", Value::Null),
            Row::new().with("other", 5),
            Row::new().with("id", 2),
        ];
        assert_eq!(extract_keys(&rows, "id"), vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn test_dedup_keys_keeps_first_occurrence() {
        let keys = vec![Value::Int(3), Value::Int(1), Value::Float(3.0), Value::Int(2), Value::Int(1)];
        assert_eq!(dedup_keys(&keys), vec![Value::Int(3), Value::Int(1), Value::Int(2)]);
    }
}

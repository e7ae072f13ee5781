/// Largest number of closed `(start, end)` intervals covering any one frame.
///
/// Sweep-line over intervals ordered by start, keeping the end frames of
/// open intervals sorted. Each new interval first evicts every open one
/// ending before its start. This matches the sweep's own retirement rule,
/// so a pool of this size is never exhausted.
pub fn max_concurrency<I>(intervals: I) -> usize
where
    I: IntoIterator<Item = (i64, i64)>,
{
    let mut intervals: Vec<(i64, i64)> = intervals.into_iter().collect();
    intervals.sort_by_key(|&(start, _)| start);

    let mut open_ends: Vec<i64> = Vec::new();
    let mut max = 0;
    for (start, end) in intervals {
        let ended = open_ends.partition_point(|&e| e < start);
        open_ends.drain(..ended);

        let at = open_ends.partition_point(|&e| e <= end);
        open_ends.insert(at, end);
        max = max.max(open_ends.len());
    }
    max
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_concurrency_examples() {
        assert_eq!(max_concurrency([(0, 5), (2, 6), (4, 8), (10, 12)]), 3);
        assert_eq!(max_concurrency([(0, 1), (2, 3)]), 1);
        assert_eq!(max_concurrency(std::iter::empty()), 0);
    }

    #[test]
    fn touching_endpoints_overlap() {
        assert_eq!(max_concurrency([(0, 4), (4, 8)]), 2);
    }

    #[test]
    fn input_order_does_not_matter() {
        assert_eq!(max_concurrency([(10, 12), (4, 8), (0, 5), (2, 6)]), 3);
    }

    #[test]
    fn long_interval_spans_many_short_ones() {
        let intervals = [(0, 100), (1, 2), (3, 4), (5, 6), (5, 7)];
        assert_eq!(max_concurrency(intervals), 3);
    }
}

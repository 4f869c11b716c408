// Copyright 2025 Tomoki Hayashi
// MIT License (https://opensource.org/licenses/MIT)

//! Sorted, non-overlapping closed intervals over global frame indices.
//!
//! Adjacent runs are merged only when building from flags; afterwards an
//! interval sharing an endpoint with a new one is kept as a separate entry.

/// Inclusive range `[start, end]` of global indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interval {
    pub start: usize,
    pub end: usize,
}

impl Interval {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "interval start {start} > end {end}");
        Self { start, end }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index <= self.end
    }

    /// Strict containment: shared endpoints do not count.
    fn strictly_inside(&self, outer: &Interval) -> bool {
        self.start > outer.start && self.end < outer.end
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IntervalSet {
    intervals: Vec<Interval>,
}

impl IntervalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build runs of consecutive `true` flags, left to right.
    pub fn from_flags<I>(flags: I) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        let mut intervals: Vec<Interval> = Vec::new();
        for (i, flag) in flags.into_iter().enumerate() {
            if !flag {
                continue;
            }
            match intervals.last_mut() {
                Some(last) if last.end + 1 == i => last.end = i,
                _ => intervals.push(Interval::new(i, i)),
            }
        }
        Self { intervals }
    }

    pub fn single(interval: Interval) -> Self {
        Self {
            intervals: vec![interval],
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.intervals.iter().any(|r| r.contains(index))
    }

    /// Insert `new`, dropping every existing interval strictly inside it.
    pub fn insert_merging(&mut self, new: Interval) {
        self.intervals.retain(|r| !r.strictly_inside(&new));
        let at = self.intervals.partition_point(|r| r.start <= new.start);
        self.intervals.insert(at, new);
    }

    /// Remove every interval covering `index` as a whole (no split).
    pub fn remove_containing(&mut self, index: usize) {
        self.intervals.retain(|r| !r.contains(index));
    }

    pub fn clear(&mut self) {
        self.intervals.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn as_slice(&self) -> &[Interval] {
        &self.intervals
    }

    /// Number of indices covered.
    pub fn covered(&self) -> usize {
        self.intervals.iter().map(|r| r.end - r.start + 1).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ranges: &[(usize, usize)]) -> IntervalSet {
        let mut s = IntervalSet::new();
        for &(a, b) in ranges {
            s.insert_merging(Interval::new(a, b));
        }
        s
    }

    fn pairs(s: &IntervalSet) -> Vec<(usize, usize)> {
        s.as_slice().iter().map(|r| (r.start, r.end)).collect()
    }

    #[test]
    fn test_contains_inclusive_bounds() {
        let s = set(&[(2, 4)]);
        assert!(!s.contains(1));
        assert!(s.contains(2));
        assert!(s.contains(4));
        assert!(!s.contains(5));
    }

    #[test]
    fn test_from_flags_builds_runs() {
        let s = IntervalSet::from_flags([true, true, false, true, false, false, true, true, true]);
        assert_eq!(pairs(&s), vec![(0, 1), (3, 3), (6, 8)]);
    }

    #[test]
    fn test_from_flags_reproduces_flags() {
        let flags = [false, true, true, true, false, true, false, false, true, true];
        let s = IntervalSet::from_flags(flags);
        for (i, f) in flags.iter().enumerate() {
            assert_eq!(s.contains(i), *f, "index {i}");
        }
    }

    #[test]
    fn test_from_flags_empty() {
        assert!(IntervalSet::from_flags([false, false]).is_empty());
        assert!(IntervalSet::from_flags(Vec::<bool>::new()).is_empty());
    }

    #[test]
    fn test_insert_absorbs_strictly_contained() {
        let mut s = set(&[(1, 3), (7, 8)]);
        s.insert_merging(Interval::new(0, 5));
        assert_eq!(pairs(&s), vec![(0, 5), (7, 8)]);
    }

    #[test]
    fn test_insert_keeps_interval_sharing_endpoint() {
        let mut s = set(&[(2, 4)]);
        s.insert_merging(Interval::new(2, 9));
        assert_eq!(pairs(&s), vec![(2, 4), (2, 9)]);

        let mut s = set(&[(5, 9)]);
        s.insert_merging(Interval::new(0, 9));
        assert_eq!(pairs(&s), vec![(0, 9), (5, 9)]);
    }

    #[test]
    fn test_insert_keeps_sorted_order() {
        let s = set(&[(10, 12), (0, 1), (5, 6)]);
        assert_eq!(pairs(&s), vec![(0, 1), (5, 6), (10, 12)]);
    }

    #[test]
    fn test_remove_containing_drops_whole_interval() {
        let mut s = set(&[(2, 9), (12, 14)]);
        s.remove_containing(5);
        assert_eq!(pairs(&s), vec![(12, 14)]);
    }

    #[test]
    fn test_remove_uncovered_is_noop() {
        let mut s = set(&[(2, 3)]);
        s.remove_containing(7);
        assert_eq!(pairs(&s), vec![(2, 3)]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut once = set(&[(0, 2), (4, 6)]);
        once.remove_containing(5);
        let mut twice = once.clone();
        twice.remove_containing(5);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_covered_counts_indices() {
        let s = set(&[(0, 2), (5, 5)]);
        assert_eq!(s.covered(), 4);
    }
}

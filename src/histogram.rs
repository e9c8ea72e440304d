extern crate alloc;
use alloc::collections::BTreeMap;

use crate::color::WideRgb;

/// Population counts for every distinct color still alive in a clustering run.
///
/// Counts are the weights for the weighted-average merge. The sum of all
/// counts always equals the number of pixels recorded; merging never changes
/// the total, only the number of distinct entries.
#[derive(Debug, Default)]
pub struct ColorHistogram {
    counts: BTreeMap<WideRgb, u32>,
}

impl ColorHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one pixel of `color`. Returns `true` on the first sighting so
    /// the caller knows to insert the color into the spatial index; repeat
    /// occurrences only add weight.
    pub fn record(&mut self, color: WideRgb) -> bool {
        match self.counts.get_mut(&color) {
            Some(count) => {
                *count += 1;
                false
            }
            None => {
                self.counts.insert(color, 1);
                true
            }
        }
    }

    /// Merge `a` and `b` into their population-weighted average.
    ///
    /// Each channel is `round(a·wA + b·wB)` with `wA = countA / (countA +
    /// countB)`, rounded half-up back into the widened range. Both inputs are
    /// removed; the merged color absorbs their combined count, summing into
    /// any identical color that already exists.
    pub fn merge(&mut self, a: WideRgb, b: WideRgb) -> WideRgb {
        let a_count = self.counts.remove(&a).unwrap_or(0);
        let b_count = self.counts.remove(&b).unwrap_or(0);
        let merged_count = a_count + b_count;
        let a_ratio = a_count as f64 / merged_count as f64;
        let b_ratio = b_count as f64 / merged_count as f64;

        let avg = |ac: u16, bc: u16| (ac as f64 * a_ratio + bc as f64 * b_ratio + 0.5) as u16;
        let merged = WideRgb::new(avg(a.r, b.r), avg(a.g, b.g), avg(a.b, b.b));

        *self.counts.entry(merged).or_insert(0) += merged_count;
        merged
    }

    /// Current count for a color, if it is still alive.
    pub fn count_of(&self, color: WideRgb) -> Option<u32> {
        self.counts.get(&color).copied()
    }

    /// Number of distinct colors still alive.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total pixels recorded (sum of all counts).
    pub fn total(&self) -> u64 {
        self.counts.values().map(|&c| c as u64).sum()
    }

    /// The single surviving color after clustering has run to completion.
    ///
    /// Calling this with more than one (or zero) survivors means the merge
    /// loop is defective; that is a programming error, so it panics.
    pub fn last(&self) -> WideRgb {
        assert!(
            self.counts.len() == 1,
            "ColorHistogram::last called with {} surviving colors, expected exactly 1",
            self.counts.len()
        );
        *self.counts.keys().next().expect("len checked above")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_counts_duplicates() {
        let mut hist = ColorHistogram::new();
        let c = WideRgb::new(100, 200, 300);
        assert!(hist.record(c));
        assert!(!hist.record(c));
        assert!(!hist.record(c));
        assert_eq!(hist.len(), 1);
        assert_eq!(hist.count_of(c), Some(3));
        assert_eq!(hist.total(), 3);
    }

    #[test]
    fn total_equals_pixels_recorded() {
        let mut hist = ColorHistogram::new();
        for i in 0..100u16 {
            hist.record(WideRgb::new(i % 7, 0, 0));
        }
        assert_eq!(hist.total(), 100);
        assert_eq!(hist.len(), 7);
    }

    #[test]
    fn merge_equal_weights_is_midpoint() {
        let mut hist = ColorHistogram::new();
        let a = WideRgb::new(0, 0, 0);
        let b = WideRgb::new(100, 200, 301);
        hist.record(a);
        hist.record(b);
        let m = hist.merge(a, b);
        // Half-up rounding on the odd channel
        assert_eq!(m, WideRgb::new(50, 100, 151));
        assert_eq!(hist.len(), 1);
        assert_eq!(hist.count_of(m), Some(2));
    }

    #[test]
    fn merge_weights_by_population() {
        let mut hist = ColorHistogram::new();
        let a = WideRgb::new(0, 0, 0);
        let b = WideRgb::new(1000, 1000, 1000);
        hist.record(a);
        hist.record(a);
        hist.record(a);
        hist.record(b);
        let m = hist.merge(a, b);
        // 3:1 toward a
        assert_eq!(m, WideRgb::new(250, 250, 250));
        assert_eq!(hist.count_of(m), Some(4));
        assert_eq!(hist.total(), 4);
    }

    #[test]
    fn merge_collision_sums_counts() {
        let mut hist = ColorHistogram::new();
        let a = WideRgb::new(0, 0, 0);
        let b = WideRgb::new(2, 0, 0);
        let existing = WideRgb::new(1, 0, 0);
        hist.record(a);
        hist.record(b);
        for _ in 0..5 {
            hist.record(existing);
        }
        // Midpoint of a and b collides with `existing`
        let m = hist.merge(a, b);
        assert_eq!(m, existing);
        assert_eq!(hist.len(), 1);
        assert_eq!(hist.count_of(existing), Some(7));
    }

    #[test]
    fn merge_preserves_total() {
        let mut hist = ColorHistogram::new();
        let a = WideRgb::new(10, 20, 30);
        let b = WideRgb::new(40, 50, 60);
        for _ in 0..9 {
            hist.record(a);
        }
        hist.record(b);
        hist.merge(a, b);
        assert_eq!(hist.total(), 10);
    }

    #[test]
    fn last_returns_survivor() {
        let mut hist = ColorHistogram::new();
        let c = WideRgb::new(7, 8, 9);
        hist.record(c);
        assert_eq!(hist.last(), c);
    }

    #[test]
    #[should_panic(expected = "surviving colors")]
    fn last_panics_with_multiple_survivors() {
        let mut hist = ColorHistogram::new();
        hist.record(WideRgb::new(0, 0, 0));
        hist.record(WideRgb::new(1, 1, 1));
        hist.last();
    }
}

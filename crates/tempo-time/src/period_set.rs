use serde::{Deserialize, Serialize};
use tempo_value::{TemporalError, TemporalResult};

use crate::period::{Period, RelativePosition, Timestamp};

/// A normalized, non-empty set of pairwise-disjoint, non-adjacent periods in
/// ascending order — the time carrier for a sequence-set temporal value, and
/// the return type of `minus`/`union` over period collections generally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSet {
    periods: Vec<Period>,
}

impl PeriodSet {
    /// Builds a set from arbitrary (possibly overlapping, unordered) periods,
    /// sweeping left to right and merging any two that overlap or touch with
    /// at least one side inclusive (§3.2, §9).
    pub fn new(mut periods: Vec<Period>) -> TemporalResult<Self> {
        if periods.is_empty() {
            return Err(TemporalError::InvalidArgument("period set must be non-empty"));
        }
        periods.sort_by(|a, b| a.cmp_bounds(b));
        let mut merged: Vec<Period> = Vec::with_capacity(periods.len());
        for p in periods {
            match merged.last_mut() {
                Some(last) if last.mergeable(&p) => {
                    *last = last.super_union(&p);
                }
                _ => merged.push(p),
            }
        }
        Ok(PeriodSet { periods: merged })
    }

    /// Builds directly from periods already normalized (sorted, disjoint,
    /// non-adjacent) without re-sweeping. Used when a caller has already done
    /// the work, e.g. reconstructing from a wire form.
    pub fn from_normalized(periods: Vec<Period>) -> TemporalResult<Self> {
        if periods.is_empty() {
            return Err(TemporalError::InvalidArgument("period set must be non-empty"));
        }
        for w in periods.windows(2) {
            if w[0].cmp_bounds(&w[1]) != std::cmp::Ordering::Less || w[0].mergeable(&w[1]) {
                return Err(TemporalError::InvalidArgument("periods not normalized: disjoint/ordered/non-adjacent required"));
            }
        }
        Ok(PeriodSet { periods })
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub fn num_periods(&self) -> usize {
        self.periods.len()
    }

    pub fn start(&self) -> Timestamp {
        self.periods[0].lower
    }

    pub fn end(&self) -> Timestamp {
        self.periods.last().expect("non-empty").upper
    }

    pub fn span(&self) -> Period {
        let first = self.periods[0];
        let last = *self.periods.last().expect("non-empty");
        first.super_union(&last)
    }

    pub fn contains_timestamp(&self, t: Timestamp) -> bool {
        self.periods.iter().any(|p| p.contains_timestamp(t))
    }

    pub fn position_of_timestamp(&self, t: Timestamp) -> RelativePosition {
        if t < self.start() {
            return RelativePosition::Before;
        }
        if t > self.end() {
            return RelativePosition::After;
        }
        for p in &self.periods {
            match p.position_of_timestamp(t) {
                RelativePosition::During => return RelativePosition::During,
                RelativePosition::Before => return RelativePosition::Before, // sits in a gap before this period
                RelativePosition::After => continue,
            }
        }
        RelativePosition::Before
    }

    pub fn overlaps_period(&self, other: &Period) -> bool {
        self.periods.iter().any(|p| p.overlaps(other))
    }

    /// Union of two period sets, renormalized as a whole (merges across the
    /// set boundary too, not just within each input).
    pub fn union(&self, other: &Self) -> Self {
        let mut all = self.periods.clone();
        all.extend(other.periods.iter().copied());
        Self::new(all).expect("non-empty by construction from two non-empty sets")
    }

    /// Intersection of two period sets: pairwise period intersections,
    /// collected and renormalized.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let mut out = Vec::new();
        for a in &self.periods {
            for b in &other.periods {
                if let Some(i) = a.intersection(b) {
                    out.push(i);
                }
            }
        }
        if out.is_empty() { None } else { Some(Self::new(out).expect("non-empty")) }
    }

    /// `self \ other`, period by period.
    pub fn minus(&self, other: &Self) -> Option<Self> {
        let mut remaining = self.periods.clone();
        for b in &other.periods {
            remaining = remaining.iter().flat_map(|p| p.minus(b)).collect();
            if remaining.is_empty() {
                return None;
            }
        }
        Some(Self::new(remaining).expect("non-empty"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(lower: i64, upper: i64, li: bool, ui: bool) -> Period {
        Period::new(lower, upper, li, ui).unwrap()
    }

    #[test]
    fn merges_overlapping_and_touching_periods() {
        let set = PeriodSet::new(vec![p(0, 10, true, false), p(10, 20, true, false), p(30, 40, true, true)]).unwrap();
        assert_eq!(set.num_periods(), 2);
        assert_eq!(set.periods()[0], p(0, 20, true, false));
    }

    #[test]
    fn leaves_gap_when_both_sides_exclusive() {
        let set = PeriodSet::new(vec![p(0, 10, true, false), p(10, 20, false, false)]).unwrap();
        assert_eq!(set.num_periods(), 2);
    }

    #[test]
    fn contains_and_span() {
        let set = PeriodSet::new(vec![p(0, 10, true, true), p(20, 30, true, true)]).unwrap();
        assert!(set.contains_timestamp(5));
        assert!(!set.contains_timestamp(15));
        assert_eq!(set.span(), p(0, 30, true, true));
    }

    #[test]
    fn union_merges_across_sets() {
        let a = PeriodSet::new(vec![p(0, 10, true, false)]).unwrap();
        let b = PeriodSet::new(vec![p(10, 20, true, false)]).unwrap();
        let u = a.union(&b);
        assert_eq!(u.num_periods(), 1);
        assert_eq!(u.periods()[0], p(0, 20, true, false));
    }

    #[test]
    fn minus_removes_overlapping_span() {
        let a = PeriodSet::new(vec![p(0, 20, true, true)]).unwrap();
        let b = PeriodSet::new(vec![p(5, 10, true, true)]).unwrap();
        let diff = a.minus(&b).unwrap();
        assert_eq!(diff.num_periods(), 2);
    }

    #[test]
    fn minus_everything_yields_none() {
        let a = PeriodSet::new(vec![p(0, 10, true, true)]).unwrap();
        let b = PeriodSet::new(vec![p(0, 10, true, true)]).unwrap();
        assert!(a.minus(&b).is_none());
    }
}

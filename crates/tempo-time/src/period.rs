use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tempo_value::{TemporalError, TemporalResult};

/// Microsecond-resolution instant, matching the base `Timestamp` unit every
/// temporal value is indexed by.
pub type Timestamp = i64;

/// Where a timestamp or period sits relative to another period — the
/// primitive the skiplist (`tempo-skiplist`) descends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativePosition {
    Before,
    During,
    After,
}

/// A half-open/closed timestamp interval `(lower, upper, lower_inc, upper_inc)`.
/// `lower <= upper` always holds, and an instantaneous period (`lower ==
/// upper`) is always closed on both ends — there is no other way to denote a
/// single instant as a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub lower: Timestamp,
    pub upper: Timestamp,
    pub lower_inc: bool,
    pub upper_inc: bool,
}

impl Period {
    pub fn new(lower: Timestamp, upper: Timestamp, lower_inc: bool, upper_inc: bool) -> TemporalResult<Self> {
        if lower > upper {
            return Err(TemporalError::InvalidArgument("period lower bound after upper bound"));
        }
        if lower == upper && !(lower_inc && upper_inc) {
            return Err(TemporalError::InvalidArgument(
                "instantaneous period must be inclusive on both bounds",
            ));
        }
        Ok(Period { lower, upper, lower_inc, upper_inc })
    }

    /// The degenerate `[t, t]` period a lone instant is treated as (§3.3).
    pub fn instant(t: Timestamp) -> Self {
        Period { lower: t, upper: t, lower_inc: true, upper_inc: true }
    }

    pub fn is_instant(&self) -> bool {
        self.lower == self.upper
    }

    pub fn duration(&self) -> i64 {
        self.upper - self.lower
    }

    pub fn contains_timestamp(&self, t: Timestamp) -> bool {
        self.position_of_timestamp(t) == RelativePosition::During
    }

    pub fn position_of_timestamp(&self, t: Timestamp) -> RelativePosition {
        if t < self.lower || (t == self.lower && !self.lower_inc) {
            RelativePosition::Before
        } else if t > self.upper || (t == self.upper && !self.upper_inc) {
            RelativePosition::After
        } else {
            RelativePosition::During
        }
    }

    /// `self` ends strictly before `other` starts, with no shared instant.
    pub fn strictly_before(&self, other: &Self) -> bool {
        match self.upper.cmp(&other.lower) {
            Ordering::Less => true,
            Ordering::Equal => !(self.upper_inc && other.lower_inc),
            Ordering::Greater => false,
        }
    }

    pub fn strictly_after(&self, other: &Self) -> bool {
        other.strictly_before(self)
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        !self.strictly_before(other) && !self.strictly_after(other)
    }

    /// Position of `other` relative to `self`'s span, used by the skiplist
    /// to decide which elements a splice's period touches (§4.9).
    pub fn position_of_period(&self, other: &Self) -> RelativePosition {
        if other.strictly_before(self) {
            RelativePosition::Before
        } else if other.strictly_after(self) {
            RelativePosition::After
        } else {
            RelativePosition::During
        }
    }

    /// True iff the two periods touch at a single instant and are not
    /// already overlapping there — i.e. exactly one side is inclusive at the
    /// touching point (§4.1). Two periods touching with *both* sides
    /// exclusive leave a one-instant gap and are not adjacent.
    pub fn adjacent(&self, other: &Self) -> bool {
        let (left, right) = if self.upper <= other.lower { (self, other) } else { (other, self) };
        left.upper == right.lower && (left.upper_inc != right.lower_inc)
    }

    /// True when merging `self` and `other` into one period loses no
    /// information: they overlap, or they touch and at least one side is
    /// inclusive at the touching point. The only case that does *not*
    /// qualify is touching with both sides exclusive, which leaves a single
    /// excluded instant between them.
    pub fn mergeable(&self, other: &Self) -> bool {
        let (left, right) = if self.lower <= other.lower { (self, other) } else { (other, self) };
        if left.overlaps(right) {
            return true;
        }
        left.upper == right.lower && (left.upper_inc || right.lower_inc)
    }

    /// Smallest period containing both `self` and `other`; always defined.
    pub fn super_union(&self, other: &Self) -> Self {
        let (lower, lower_inc) = min_lower(self.lower, self.lower_inc, other.lower, other.lower_inc);
        let (upper, upper_inc) = max_upper(self.upper, self.upper_inc, other.upper, other.upper_inc);
        Period { lower, upper, lower_inc, upper_inc }
    }

    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let (lower, lower_inc) = max_lower(self.lower, self.lower_inc, other.lower, other.lower_inc);
        let (upper, upper_inc) = min_upper(self.upper, self.upper_inc, other.upper, other.upper_inc);
        Period::new(lower, upper, lower_inc, upper_inc).ok()
    }

    /// `self \ other`, as 0, 1 or 2 disjoint periods (§4.1).
    pub fn minus(&self, other: &Self) -> Vec<Self> {
        let int = match self.intersection(other) {
            None => return vec![*self],
            Some(int) => int,
        };
        let mut out = Vec::with_capacity(2);
        if cmp_lower_bound(self.lower, self.lower_inc, int.lower, int.lower_inc) == Ordering::Less {
            out.push(Period::new(self.lower, int.lower, self.lower_inc, !int.lower_inc).expect("left remainder"));
        }
        if cmp_upper_bound(self.upper, self.upper_inc, int.upper, int.upper_inc) == Ordering::Greater {
            out.push(Period::new(int.upper, self.upper, !int.upper_inc, self.upper_inc).expect("right remainder"));
        }
        out
    }

    /// True iff `self` fully contains `other`'s span (bound-inclusive).
    pub fn contains_period(&self, other: &Self) -> bool {
        cmp_lower_bound(self.lower, self.lower_inc, other.lower, other.lower_inc) != Ordering::Greater
            && cmp_upper_bound(other.upper, other.upper_inc, self.upper, self.upper_inc) != Ordering::Greater
    }

    /// `self`'s upper bound does not extend past `other`'s (PostgreSQL `&<`).
    pub fn upper_bound_leq(&self, other: &Self) -> bool {
        cmp_upper_bound(self.upper, self.upper_inc, other.upper, other.upper_inc) != Ordering::Greater
    }

    /// `self`'s lower bound does not start before `other`'s (PostgreSQL `&>`).
    pub fn lower_bound_geq(&self, other: &Self) -> bool {
        cmp_lower_bound(self.lower, self.lower_inc, other.lower, other.lower_inc) != Ordering::Less
    }

    /// The three-step lexicographic bound-comparison rule of §4.1:
    /// `(lower, lower_inc, upper, upper_inc)` with inclusive-beats-exclusive
    /// on the lower bound and exclusive-beats-inclusive on the upper bound.
    pub fn cmp_bounds(&self, other: &Self) -> Ordering {
        cmp_lower_bound(self.lower, self.lower_inc, other.lower, other.lower_inc)
            .then_with(|| cmp_upper_bound(self.upper, self.upper_inc, other.upper, other.upper_inc))
    }
}

impl PartialOrd for Period {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp_bounds(other))
    }
}

impl Ord for Period {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_bounds(other)
    }
}

pub(crate) fn cmp_lower_bound(t1: Timestamp, inc1: bool, t2: Timestamp, inc2: bool) -> Ordering {
    t1.cmp(&t2).then_with(|| match (inc1, inc2) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => Ordering::Equal,
    })
}

pub(crate) fn cmp_upper_bound(t1: Timestamp, inc1: bool, t2: Timestamp, inc2: bool) -> Ordering {
    t1.cmp(&t2).then_with(|| match (inc1, inc2) {
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        _ => Ordering::Equal,
    })
}

fn min_lower(t1: Timestamp, i1: bool, t2: Timestamp, i2: bool) -> (Timestamp, bool) {
    if cmp_lower_bound(t1, i1, t2, i2) != Ordering::Greater { (t1, i1) } else { (t2, i2) }
}

fn max_lower(t1: Timestamp, i1: bool, t2: Timestamp, i2: bool) -> (Timestamp, bool) {
    if cmp_lower_bound(t1, i1, t2, i2) == Ordering::Greater { (t1, i1) } else { (t2, i2) }
}

fn min_upper(t1: Timestamp, i1: bool, t2: Timestamp, i2: bool) -> (Timestamp, bool) {
    if cmp_upper_bound(t1, i1, t2, i2) != Ordering::Greater { (t1, i1) } else { (t2, i2) }
}

fn max_upper(t1: Timestamp, i1: bool, t2: Timestamp, i2: bool) -> (Timestamp, bool) {
    if cmp_upper_bound(t1, i1, t2, i2) == Ordering::Greater { (t1, i1) } else { (t2, i2) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lower_bound_inclusive_sorts_first() {
        assert_eq!(cmp_lower_bound(5, true, 5, false), Ordering::Less);
    }

    #[test]
    fn upper_bound_exclusive_sorts_first() {
        assert_eq!(cmp_upper_bound(5, false, 5, true), Ordering::Less);
    }

    #[test]
    fn instantaneous_period_must_be_closed() {
        assert!(Period::new(5, 5, true, false).is_err());
        assert!(Period::new(5, 5, true, true).is_ok());
    }

    #[test]
    fn overlap_and_strict_order() {
        let a = Period::new(0, 10, true, false).unwrap(); // [0, 10)
        let b = Period::new(10, 20, true, false).unwrap(); // [10, 20)
        assert!(a.strictly_before(&b));
        assert!(!a.overlaps(&b));
        let c = Period::new(10, 20, false, false).unwrap(); // (10, 20)
        assert!(a.strictly_before(&c));

        let d = Period::new(5, 15, true, true).unwrap();
        assert!(a.overlaps(&d));
    }

    #[test]
    fn adjacency_requires_exactly_one_inclusive_bound() {
        let a = Period::new(0, 10, true, false).unwrap(); // [0, 10)
        let b = Period::new(10, 20, true, false).unwrap(); // [10, 20)
        assert!(a.adjacent(&b)); // a excludes 10, b includes it

        let c = Period::new(0, 10, true, true).unwrap(); // [0, 10]
        let d = Period::new(10, 20, true, false).unwrap(); // [10, 20)
        assert!(!c.adjacent(&d)); // both include 10: overlap, not merely adjacent

        let e = Period::new(0, 10, true, false).unwrap();
        let f = Period::new(10, 20, false, false).unwrap(); // (10, 20): neither includes 10
        assert!(!e.adjacent(&f)); // gap at the single instant 10
    }

    #[test]
    fn mergeable_matches_overlap_or_inclusive_touch() {
        let a = Period::new(0, 10, true, false).unwrap();
        let b = Period::new(10, 20, true, false).unwrap();
        assert!(a.mergeable(&b));
        let c = Period::new(10, 20, false, false).unwrap();
        assert!(!a.mergeable(&c));
    }

    #[test]
    fn super_union_never_fails() {
        let a = Period::new(0, 5, true, true).unwrap();
        let b = Period::new(100, 200, false, true).unwrap();
        let u = a.super_union(&b);
        assert_eq!(u, Period::new(0, 200, true, true).unwrap());
    }

    #[test]
    fn intersection_empty_when_disjoint() {
        let a = Period::new(0, 5, true, false).unwrap();
        let b = Period::new(10, 20, true, false).unwrap();
        assert!(a.intersection(&b).is_none());
    }

    #[test]
    fn minus_splits_into_two_pieces() {
        let a = Period::new(0, 20, true, true).unwrap();
        let b = Period::new(5, 10, true, true).unwrap();
        let diff = a.minus(&b);
        assert_eq!(diff, vec![
            Period::new(0, 5, true, false).unwrap(),
            Period::new(10, 20, false, true).unwrap(),
        ]);
    }

    #[test]
    fn minus_single_point_leaves_touching_instant() {
        let a = Period::new(0, 10, true, true).unwrap();
        let b = Period::new(0, 5, true, false).unwrap();
        let diff = a.minus(&b);
        assert_eq!(diff, vec![Period::new(5, 10, true, true).unwrap()]);
    }

    #[test]
    fn minus_disjoint_returns_self() {
        let a = Period::new(0, 5, true, true).unwrap();
        let b = Period::new(10, 20, true, true).unwrap();
        assert_eq!(a.minus(&b), vec![a]);
    }

    #[test]
    fn contains_period_and_overbefore_overafter() {
        let outer = Period::new(0, 100, true, true).unwrap();
        let inner = Period::new(10, 20, true, true).unwrap();
        assert!(outer.contains_period(&inner));
        assert!(!inner.contains_period(&outer));
        assert!(inner.upper_bound_leq(&outer));
        assert!(inner.lower_bound_geq(&outer));
    }

    #[test]
    fn partition_roundtrip() {
        let a = Period::new(0, 20, true, true).unwrap();
        let b = Period::new(5, 10, true, false).unwrap();
        let at = a.intersection(&b);
        let minus = a.minus(&b);
        assert!(at.is_some());
        // at ∪ minus reconstitutes a's span (checked by endpoints here).
        let mut bounds: Vec<Timestamp> = minus.iter().flat_map(|p| [p.lower, p.upper]).collect();
        bounds.push(at.unwrap().lower);
        bounds.push(at.unwrap().upper);
        assert_eq!(*bounds.iter().min().unwrap(), a.lower);
        assert_eq!(*bounds.iter().max().unwrap(), a.upper);
    }
}

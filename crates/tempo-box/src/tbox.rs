use serde::{Deserialize, Serialize};
use tempo_time::Period;

use crate::value_range::ValueRange;

/// Axis-aligned box over `(value, time)`. Either axis may be absent, meaning
/// that axis is simply not tracked by this box (e.g. a purely temporal
/// aggregate state has no value axis) — not "unbounded", which is why
/// positional predicates treat a missing axis as automatically satisfied
/// rather than as `-inf..inf`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TBox {
    pub value_range: Option<ValueRange>,
    pub time_period: Option<Period>,
}

impl TBox {
    pub fn new(value_range: Option<ValueRange>, time_period: Option<Period>) -> Self {
        TBox { value_range, time_period }
    }

    pub fn value_only(range: ValueRange) -> Self {
        TBox { value_range: Some(range), time_period: None }
    }

    pub fn time_only(period: Period) -> Self {
        TBox { value_range: None, time_period: Some(period) }
    }

    pub fn point(value: f64, t: i64) -> Self {
        TBox {
            value_range: Some(ValueRange::singleton(value)),
            time_period: Some(Period::instant(t)),
        }
    }

    pub fn contains(&self, other: &Self) -> bool {
        axis_holds(&self.value_range, &other.value_range, ValueRange::contains_range)
            && axis_holds(&self.time_period, &other.time_period, |a, b| a.contains_period(b))
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        axis_holds(&self.value_range, &other.value_range, ValueRange::overlaps)
            && axis_holds(&self.time_period, &other.time_period, Period::overlaps)
    }

    pub fn same(&self, other: &Self) -> bool {
        self.value_range == other.value_range && self.time_period == other.time_period
    }

    /// Boxes meet on exactly one hyperface: one axis is adjacent (touches,
    /// no shared interior) while the other axis overlaps or also touches.
    pub fn adjacent(&self, other: &Self) -> bool {
        if self.overlaps(other) {
            return false;
        }
        let value_adjacent = match (&self.value_range, &other.value_range) {
            (Some(a), Some(b)) => a.adjacent(b),
            _ => false,
        };
        let time_adjacent = match (&self.time_period, &other.time_period) {
            (Some(a), Some(b)) => a.adjacent(b),
            _ => false,
        };
        let value_compatible = axis_holds(&self.value_range, &other.value_range, ValueRange::overlaps) || value_adjacent;
        let time_compatible = axis_holds(&self.time_period, &other.time_period, Period::overlaps) || time_adjacent;
        (value_adjacent && time_compatible) || (time_adjacent && value_compatible)
    }

    pub fn left(&self, other: &Self) -> bool {
        matches!((&self.value_range, &other.value_range), (Some(a), Some(b)) if a.left(b))
    }

    pub fn overleft(&self, other: &Self) -> bool {
        matches!((&self.value_range, &other.value_range), (Some(a), Some(b)) if a.overleft(b))
    }

    pub fn right(&self, other: &Self) -> bool {
        matches!((&self.value_range, &other.value_range), (Some(a), Some(b)) if a.right(b))
    }

    pub fn overright(&self, other: &Self) -> bool {
        matches!((&self.value_range, &other.value_range), (Some(a), Some(b)) if a.overright(b))
    }

    pub fn before(&self, other: &Self) -> bool {
        matches!((&self.time_period, &other.time_period), (Some(a), Some(b)) if a.strictly_before(b))
    }

    /// Does not extend past the end of `other` (PostgreSQL's `&<`).
    pub fn overbefore(&self, other: &Self) -> bool {
        matches!((&self.time_period, &other.time_period), (Some(a), Some(b)) if a.upper_bound_leq(b))
    }

    pub fn after(&self, other: &Self) -> bool {
        matches!((&self.time_period, &other.time_period), (Some(a), Some(b)) if a.strictly_after(b))
    }

    pub fn overafter(&self, other: &Self) -> bool {
        matches!((&self.time_period, &other.time_period), (Some(a), Some(b)) if a.lower_bound_geq(b))
    }

    pub fn union(&self, other: &Self) -> Self {
        TBox {
            value_range: union_opt(&self.value_range, &other.value_range, ValueRange::union),
            time_period: union_opt(&self.time_period, &other.time_period, Period::super_union),
        }
    }

    pub fn expand(&mut self, other: &Self) {
        *self = self.union(other);
    }

    /// NaN-safe area: a zero-width dimension always contributes zero, even
    /// if multiplied against an absent (conceptually infinite) axis.
    pub fn size(&self) -> f64 {
        let value_width = self.value_range.map(|r| r.width()).unwrap_or(f64::INFINITY);
        let time_width = self.time_period.map(|p| p.duration() as f64).unwrap_or(f64::INFINITY);
        safe_mul(value_width, time_width)
    }

    /// GiST-style insertion penalty: growth in `self`'s size from absorbing
    /// `other`, clamped to non-negative; `+inf` on any NaN coordinate.
    pub fn penalty(&self, other: &Self) -> f64 {
        if has_nan(self) || has_nan(other) {
            return f64::INFINITY;
        }
        (self.union(other).size() - self.size()).max(0.0)
    }
}

fn has_nan(b: &TBox) -> bool {
    b.value_range.map(|r| r.min.is_nan() || r.max.is_nan()).unwrap_or(false)
}

fn axis_holds<T: Copy>(a: &Option<T>, b: &Option<T>, f: impl Fn(&T, &T) -> bool) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => f(a, b),
        _ => true, // an axis neither side tracks imposes no constraint
    }
}

fn union_opt<T: Copy>(a: &Option<T>, b: &Option<T>, f: impl Fn(&T, &T) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(f(a, b)),
        (Some(a), None) => Some(*a),
        (None, Some(b)) => Some(*b),
        (None, None) => None,
    }
}

fn safe_mul(a: f64, b: f64) -> f64 {
    if a == 0.0 || b == 0.0 { 0.0 } else { a * b }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vr(min: f64, max: f64) -> ValueRange {
        ValueRange::new(min, max)
    }

    fn tp(lower: i64, upper: i64) -> Period {
        Period::new(lower, upper, true, true).unwrap()
    }

    #[test]
    fn contains_checks_both_axes() {
        let outer = TBox::new(Some(vr(0.0, 100.0)), Some(tp(0, 1000)));
        let inner = TBox::new(Some(vr(10.0, 20.0)), Some(tp(100, 200)));
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
    }

    #[test]
    fn missing_axis_is_not_a_constraint() {
        let time_only = TBox::time_only(tp(0, 10));
        let value_only = TBox::value_only(vr(0.0, 10.0));
        assert!(time_only.overlaps(&value_only));
    }

    #[test]
    fn zero_width_dimension_gives_zero_size_not_nan() {
        let b = TBox::point(5.0, 100);
        assert_eq!(b.size(), 0.0);
        let b = TBox::time_only(tp(5, 5));
        assert_eq!(b.size(), 0.0);
    }

    #[test]
    fn penalty_is_nonnegative_and_monotone() {
        let n = TBox::new(Some(vr(0.0, 10.0)), Some(tp(0, 10)));
        let b = TBox::new(Some(vr(5.0, 20.0)), Some(tp(5, 15)));
        let p = n.penalty(&b);
        assert!(p >= 0.0);
    }

    #[test]
    fn penalty_is_infinite_on_nan() {
        let n = TBox::new(Some(vr(f64::NAN, f64::NAN)), Some(tp(0, 10)));
        let b = TBox::new(Some(vr(0.0, 1.0)), Some(tp(0, 1)));
        assert_eq!(n.penalty(&b), f64::INFINITY);
    }

    #[test]
    fn adjacent_on_time_axis() {
        let a = TBox::new(Some(vr(0.0, 10.0)), Some(tp(0, 10)));
        let b = TBox::new(Some(vr(0.0, 10.0)), Some(Period::new(10, 20, false, true).unwrap()));
        assert!(a.adjacent(&b));
        assert!(!a.overlaps(&b));
    }
}

use serde::{Deserialize, Serialize};
use tempo_time::Period;

use crate::value_range::ValueRange;

/// Spatiotemporal box: `{x, y, z?}` extents plus an optional time period, an
/// SRID and a geodetic flag. Like `TBox`, a missing axis means untracked,
/// not unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct STBox {
    pub x: Option<ValueRange>,
    pub y: Option<ValueRange>,
    pub z: Option<ValueRange>,
    pub time_period: Option<Period>,
    pub srid: Option<i32>,
    pub geodetic: bool,
}

impl STBox {
    pub fn new(x: ValueRange, y: ValueRange, z: Option<ValueRange>, time_period: Option<Period>, srid: Option<i32>, geodetic: bool) -> Self {
        STBox { x: Some(x), y: Some(y), z, time_period, srid, geodetic }
    }

    pub fn contains(&self, other: &Self) -> bool {
        axis_holds(&self.x, &other.x, ValueRange::contains_range)
            && axis_holds(&self.y, &other.y, ValueRange::contains_range)
            && axis_holds(&self.z, &other.z, ValueRange::contains_range)
            && axis_holds(&self.time_period, &other.time_period, |a: &Period, b: &Period| a.contains_period(b))
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        axis_holds(&self.x, &other.x, ValueRange::overlaps)
            && axis_holds(&self.y, &other.y, ValueRange::overlaps)
            && axis_holds(&self.z, &other.z, ValueRange::overlaps)
            && axis_holds(&self.time_period, &other.time_period, Period::overlaps)
    }

    pub fn same(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y && self.z == other.z && self.time_period == other.time_period
    }

    /// Meets on exactly one hyperface: exactly one axis touches with no
    /// shared interior, while every other present axis overlaps or touches.
    pub fn adjacent(&self, other: &Self) -> bool {
        if self.overlaps(other) {
            return false;
        }
        let axes_adjacent = [
            axis_adjacent(&self.x, &other.x),
            axis_adjacent(&self.y, &other.y),
            axis_adjacent(&self.z, &other.z),
            match (&self.time_period, &other.time_period) {
                (Some(a), Some(b)) => a.adjacent(b),
                _ => false,
            },
        ];
        let axes_compatible = [
            axes_adjacent[0] || axis_holds(&self.x, &other.x, ValueRange::overlaps),
            axes_adjacent[1] || axis_holds(&self.y, &other.y, ValueRange::overlaps),
            axes_adjacent[2] || axis_holds(&self.z, &other.z, ValueRange::overlaps),
            axes_adjacent[3] || axis_holds(&self.time_period, &other.time_period, Period::overlaps),
        ];
        axes_adjacent.iter().any(|a| *a) && axes_compatible.iter().all(|c| *c)
    }

    pub fn left(&self, other: &Self) -> bool {
        matches!((&self.x, &other.x), (Some(a), Some(b)) if a.left(b))
    }

    pub fn overleft(&self, other: &Self) -> bool {
        matches!((&self.x, &other.x), (Some(a), Some(b)) if a.overleft(b))
    }

    pub fn right(&self, other: &Self) -> bool {
        matches!((&self.x, &other.x), (Some(a), Some(b)) if a.right(b))
    }

    pub fn overright(&self, other: &Self) -> bool {
        matches!((&self.x, &other.x), (Some(a), Some(b)) if a.overright(b))
    }

    pub fn below(&self, other: &Self) -> bool {
        matches!((&self.y, &other.y), (Some(a), Some(b)) if a.left(b))
    }

    pub fn overbelow(&self, other: &Self) -> bool {
        matches!((&self.y, &other.y), (Some(a), Some(b)) if a.overleft(b))
    }

    pub fn above(&self, other: &Self) -> bool {
        matches!((&self.y, &other.y), (Some(a), Some(b)) if a.right(b))
    }

    pub fn overabove(&self, other: &Self) -> bool {
        matches!((&self.y, &other.y), (Some(a), Some(b)) if a.overright(b))
    }

    pub fn front(&self, other: &Self) -> bool {
        matches!((&self.z, &other.z), (Some(a), Some(b)) if a.left(b))
    }

    pub fn overfront(&self, other: &Self) -> bool {
        matches!((&self.z, &other.z), (Some(a), Some(b)) if a.overleft(b))
    }

    pub fn back(&self, other: &Self) -> bool {
        matches!((&self.z, &other.z), (Some(a), Some(b)) if a.right(b))
    }

    pub fn overback(&self, other: &Self) -> bool {
        matches!((&self.z, &other.z), (Some(a), Some(b)) if a.overright(b))
    }

    pub fn before(&self, other: &Self) -> bool {
        matches!((&self.time_period, &other.time_period), (Some(a), Some(b)) if a.strictly_before(b))
    }

    pub fn after(&self, other: &Self) -> bool {
        matches!((&self.time_period, &other.time_period), (Some(a), Some(b)) if a.strictly_after(b))
    }

    pub fn union(&self, other: &Self) -> Self {
        STBox {
            x: union_opt(&self.x, &other.x, ValueRange::union),
            y: union_opt(&self.y, &other.y, ValueRange::union),
            z: union_opt(&self.z, &other.z, ValueRange::union),
            time_period: union_opt(&self.time_period, &other.time_period, Period::super_union),
            srid: self.srid.or(other.srid),
            geodetic: self.geodetic || other.geodetic,
        }
    }

    pub fn expand(&mut self, other: &Self) {
        *self = self.union(other);
    }

    /// Volume: x-width * y-width * z-width (1.0 if absent, so a flat 2D box
    /// still reports its planar area) * time-width, NaN-safe per axis.
    pub fn size(&self) -> f64 {
        let xw = self.x.map(|r| r.width()).unwrap_or(f64::INFINITY);
        let yw = self.y.map(|r| r.width()).unwrap_or(f64::INFINITY);
        let zw = self.z.map(|r| r.width()).unwrap_or(1.0);
        let tw = self.time_period.map(|p| p.duration() as f64).unwrap_or(f64::INFINITY);
        [xw, yw, zw, tw].into_iter().fold(1.0, safe_mul)
    }

    pub fn penalty(&self, other: &Self) -> f64 {
        if self.has_nan() || other.has_nan() {
            return f64::INFINITY;
        }
        (self.union(other).size() - self.size()).max(0.0)
    }

    fn has_nan(&self) -> bool {
        [self.x, self.y, self.z]
            .into_iter()
            .flatten()
            .any(|r| r.min.is_nan() || r.max.is_nan())
    }
}

fn axis_adjacent(a: &Option<ValueRange>, b: &Option<ValueRange>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a.adjacent(b))
}

fn axis_holds<T: Copy>(a: &Option<T>, b: &Option<T>, f: impl Fn(&T, &T) -> bool) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => f(a, b),
        _ => true,
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

    #[test]
    fn contains_checks_every_present_axis() {
        let outer = STBox::new(vr(0.0, 10.0), vr(0.0, 10.0), None, None, Some(4326), false);
        let inner = STBox::new(vr(1.0, 2.0), vr(1.0, 2.0), None, None, Some(4326), false);
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
    }

    #[test]
    fn adjacent_on_a_single_hyperface() {
        let a = STBox::new(vr(0.0, 10.0), vr(0.0, 10.0), None, None, None, false);
        let b = STBox::new(vr(10.0, 20.0), vr(0.0, 10.0), None, None, None, false);
        assert!(a.adjacent(&b));
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn size_treats_absent_z_as_flat() {
        let b = STBox::new(vr(0.0, 10.0), vr(0.0, 5.0), None, None, None, false);
        assert_eq!(b.size(), 50.0);
    }
}

//! The base value kit: the closed set of base types temporal values range
//! over, plus the handful of operations every subtype needs from them —
//! ordering, equality, interpolation and collinearity — factored out so the
//! core crate never has to special-case a base type by hand.

pub mod error;
pub mod point;

pub use error::{TemporalError, TemporalResult};
pub use point::Point;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// The process-wide tolerance used for collinearity, segment-value equality
/// and fractional-ratio boundary decisions. All float comparisons that could
/// be affected by IEEE-754 rounding go through this constant rather than a
/// bare `==`.
pub const EPSILON: f64 = 1e-5;

/// Tag identifying which base type a `BaseValue` carries, stored in the wire
/// form's `base_type_tag : u16` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum BaseType {
    Boolean = 0,
    Int = 1,
    Float = 2,
    Text = 3,
    Point = 4,
    Tuple2 = 5,
    Tuple3 = 6,
    Tuple4 = 7,
}

impl BaseType {
    /// Interpolable base types support `interpolate`/`interpolate_inverse`;
    /// the others (bool, int, text) only ever carry step interpolation.
    pub fn is_interpolable(self) -> bool {
        matches!(
            self,
            BaseType::Float | BaseType::Point | BaseType::Tuple2 | BaseType::Tuple3 | BaseType::Tuple4
        )
    }
}

/// A value of one of the engine's base types. `Point` covers 2D, 3D and
/// geodetic points alike (geodetic-ness is a property of the containing
/// temporal value, see `tempo-core`'s header flags); the `TupleN` variants
/// exist only as internal accumulator payloads (running sums, time-weighted
/// numerators) produced by lifted aggregate functions, never as user input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BaseValue {
    Boolean(bool),
    Int(i32),
    Float(f64),
    Text(String),
    Point(Point),
    Tuple2([f64; 2]),
    Tuple3([f64; 3]),
    Tuple4([f64; 4]),
}

impl BaseValue {
    pub fn base_type(&self) -> BaseType {
        match self {
            BaseValue::Boolean(_) => BaseType::Boolean,
            BaseValue::Int(_) => BaseType::Int,
            BaseValue::Float(_) => BaseType::Float,
            BaseValue::Text(_) => BaseType::Text,
            BaseValue::Point(_) => BaseType::Point,
            BaseValue::Tuple2(_) => BaseType::Tuple2,
            BaseValue::Tuple3(_) => BaseType::Tuple3,
            BaseValue::Tuple4(_) => BaseType::Tuple4,
        }
    }

    /// Total, NaN-aware order: for floats (and tuples/points built from
    /// floats) NaN sorts greatest, matching the engine-wide convention that
    /// every base type has *some* total order even when IEEE-754 doesn't
    /// give you one for free.
    pub fn cmp_value(&self, other: &Self) -> Ordering {
        match (self, other) {
            (BaseValue::Boolean(a), BaseValue::Boolean(b)) => a.cmp(b),
            (BaseValue::Int(a), BaseValue::Int(b)) => a.cmp(b),
            (BaseValue::Float(a), BaseValue::Float(b)) => OrderedFloat(*a).cmp(&OrderedFloat(*b)),
            (BaseValue::Text(a), BaseValue::Text(b)) => a.cmp(b),
            (BaseValue::Point(a), BaseValue::Point(b)) => a.cmp_ordered(b),
            (BaseValue::Tuple2(a), BaseValue::Tuple2(b)) => cmp_floats(a, b),
            (BaseValue::Tuple3(a), BaseValue::Tuple3(b)) => cmp_floats(a, b),
            (BaseValue::Tuple4(a), BaseValue::Tuple4(b)) => cmp_floats(a, b),
            _ => panic!("cmp_value called on mismatched base types"),
        }
    }

    pub fn eq_value(&self, other: &Self) -> bool {
        self.cmp_value(other) == Ordering::Equal
    }

    /// Equality within the engine-wide epsilon, used for normalization and
    /// segment-crossing decisions. Falls back to exact equality for
    /// non-float-bearing types.
    pub fn approx_eq(&self, other: &Self, eps: f64) -> bool {
        match (self, other) {
            (BaseValue::Float(a), BaseValue::Float(b)) => (a - b).abs() <= eps,
            (BaseValue::Point(a), BaseValue::Point(b)) => point_close(a, b, eps),
            (BaseValue::Tuple2(a), BaseValue::Tuple2(b)) => tuple_close(a, b, eps),
            (BaseValue::Tuple3(a), BaseValue::Tuple3(b)) => tuple_close(a, b, eps),
            (BaseValue::Tuple4(a), BaseValue::Tuple4(b)) => tuple_close(a, b, eps),
            _ => self.eq_value(other),
        }
    }

    /// `interpolate(a, b, r)`: the segment value at fractional offset
    /// `r ∈ [0, 1]` for an interpolable type. `None` for step-only types —
    /// callers are expected to special-case step interpolation themselves
    /// (it never calls into here).
    pub fn interpolate(a: &Self, b: &Self, r: f64, geodetic: bool) -> Option<Self> {
        match (a, b) {
            (BaseValue::Float(a), BaseValue::Float(b)) => Some(BaseValue::Float(a + (b - a) * r)),
            (BaseValue::Point(a), BaseValue::Point(b)) => Some(BaseValue::Point(if geodetic {
                Point::slerp_geodetic(a, b, r)
            } else {
                Point::lerp(a, b, r)
            })),
            (BaseValue::Tuple2(a), BaseValue::Tuple2(b)) => Some(BaseValue::Tuple2(lerp_floats(a, b, r))),
            (BaseValue::Tuple3(a), BaseValue::Tuple3(b)) => Some(BaseValue::Tuple3(lerp_floats(a, b, r))),
            (BaseValue::Tuple4(a), BaseValue::Tuple4(b)) => Some(BaseValue::Tuple4(lerp_floats(a, b, r))),
            _ => None,
        }
    }

    /// Inverse of `interpolate`: find `r` such that `interpolate(a, b, r) ==
    /// target` within `eps`, if it exists. Drives restrict-value on a linear
    /// segment (§4.3).
    pub fn interpolate_inverse(a: &Self, b: &Self, target: &Self, eps: f64) -> Option<f64> {
        match (a, b, target) {
            (BaseValue::Float(a), BaseValue::Float(b), BaseValue::Float(t)) => {
                if (b - a).abs() <= f64::EPSILON {
                    return if (a - t).abs() <= eps { Some(0.0) } else { None };
                }
                let r = (t - a) / (b - a);
                (-eps..=1.0 + eps).contains(&r).then(|| r.clamp(0.0, 1.0))
            }
            (BaseValue::Point(a), BaseValue::Point(b), BaseValue::Point(t)) => {
                Point::fractional_offset(t, a, b, eps)
            }
            _ => None,
        }
    }

    /// Parses a value of `base_type` from its text form (§6.1), the inverse
    /// of `Display`. Defers to the base type rather than trying every
    /// variant in turn, mirroring how the engine always knows the expected
    /// type from the surrounding temporal value's header.
    pub fn parse(base_type: BaseType, s: &str) -> Option<Self> {
        match base_type {
            BaseType::Boolean => s.parse().ok().map(BaseValue::Boolean),
            BaseType::Int => s.parse().ok().map(BaseValue::Int),
            BaseType::Float => s.parse().ok().map(BaseValue::Float),
            BaseType::Text => Some(BaseValue::Text(s.to_string())),
            BaseType::Point => Point::parse(s).map(BaseValue::Point),
            BaseType::Tuple2 | BaseType::Tuple3 | BaseType::Tuple4 => None,
        }
    }

    /// Three base values sampled at three strictly increasing timestamps are
    /// collinear iff interpolating the outer two at the inner one's relative
    /// position reproduces the middle value within `eps`. Used by the
    /// normalizer (§3.4) to detect a redundant interior instant.
    pub fn collinear(v0: &Self, t0: i64, v1: &Self, t1: i64, v2: &Self, t2: i64, eps: f64, geodetic: bool) -> bool {
        debug_assert!(t0 < t1 && t1 < t2);
        let r = (t1 - t0) as f64 / (t2 - t0) as f64;
        match Self::interpolate(v0, v2, r, geodetic) {
            Some(mid) => mid.approx_eq(v1, eps),
            None => false,
        }
    }
}

impl std::fmt::Display for BaseValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BaseValue::Boolean(b) => write!(f, "{b}"),
            BaseValue::Int(i) => write!(f, "{i}"),
            BaseValue::Float(v) => write!(f, "{v}"),
            BaseValue::Text(s) => write!(f, "{s}"),
            BaseValue::Point(p) => write!(f, "{p}"),
            BaseValue::Tuple2(t) => write!(f, "({}, {})", t[0], t[1]),
            BaseValue::Tuple3(t) => write!(f, "({}, {}, {})", t[0], t[1], t[2]),
            BaseValue::Tuple4(t) => write!(f, "({}, {}, {}, {})", t[0], t[1], t[2], t[3]),
        }
    }
}

fn cmp_floats<const N: usize>(a: &[f64; N], b: &[f64; N]) -> Ordering {
    for i in 0..N {
        let o = OrderedFloat(a[i]).cmp(&OrderedFloat(b[i]));
        if o != Ordering::Equal {
            return o;
        }
    }
    Ordering::Equal
}

fn tuple_close<const N: usize>(a: &[f64; N], b: &[f64; N], eps: f64) -> bool {
    (0..N).all(|i| (a[i] - b[i]).abs() <= eps)
}

fn lerp_floats<const N: usize>(a: &[f64; N], b: &[f64; N], r: f64) -> [f64; N] {
    let mut out = [0.0; N];
    for i in 0..N {
        out[i] = a[i] + (b[i] - a[i]) * r;
    }
    out
}

fn point_close(a: &Point, b: &Point, eps: f64) -> bool {
    (a.x - b.x).abs() <= eps
        && (a.y - b.y).abs() <= eps
        && match (a.z, b.z) {
            (Some(az), Some(bz)) => (az - bz).abs() <= eps,
            (None, None) => true,
            _ => false,
        }
}

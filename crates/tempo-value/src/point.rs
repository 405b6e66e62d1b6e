use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A point value, optionally carrying a Z coordinate. Geodetic-ness is not
/// stored here: it is a property of the *temporal value* that contains the
/// point (see the `is_geodetic` header flag in `tempo-core`), since every
/// point sampled by one temporal value shares the same interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

impl Point {
    pub fn xy(x: f64, y: f64) -> Self {
        Point { x, y, z: None }
    }

    pub fn xyz(x: f64, y: f64, z: f64) -> Self {
        Point { x, y, z: Some(z) }
    }

    pub fn has_z(&self) -> bool {
        self.z.is_some()
    }

    /// Parses the `POINT(x y)` / `POINT(x y z)` text form.
    pub fn parse(s: &str) -> Option<Self> {
        let inner = s.strip_prefix("POINT(")?.strip_suffix(')')?;
        let coords: Vec<&str> = inner.split_whitespace().collect();
        match coords.as_slice() {
            [x, y] => Some(Point::xy(x.parse().ok()?, y.parse().ok()?)),
            [x, y, z] => Some(Point::xyz(x.parse().ok()?, y.parse().ok()?, z.parse().ok()?)),
            _ => None,
        }
    }

    /// Lexicographic ordering on (x, y, z), NaN-aware via `OrderedFloat`.
    pub fn cmp_ordered(&self, other: &Self) -> Ordering {
        OrderedFloat(self.x)
            .cmp(&OrderedFloat(other.x))
            .then_with(|| OrderedFloat(self.y).cmp(&OrderedFloat(other.y)))
            .then_with(|| {
                let a = self.z.unwrap_or(0.0);
                let b = other.z.unwrap_or(0.0);
                OrderedFloat(a).cmp(&OrderedFloat(b))
            })
    }

    /// Planar (or flat-embedding, for the 3D case) Euclidean interpolation.
    /// Geodetic interpolation is handled by the caller via `slerp` instead.
    pub fn lerp(a: &Self, b: &Self, r: f64) -> Self {
        let z = match (a.z, b.z) {
            (Some(az), Some(bz)) => Some(az + (bz - az) * r),
            _ => None,
        };
        Point {
            x: a.x + (b.x - a.x) * r,
            y: a.y + (b.y - a.y) * r,
            z,
        }
    }

    /// Spherical linear interpolation between two points on a sphere, treating
    /// `(x, y)` as `(lon, lat)` in radians. Used for geodetic segments so that
    /// the interpolated path follows the great-circle edge rather than cutting
    /// a straight line through the sphere.
    pub fn slerp_geodetic(a: &Self, b: &Self, r: f64) -> Self {
        let (ax, ay, az) = lonlat_to_unit_xyz(a.x, a.y);
        let (bx, by, bz) = lonlat_to_unit_xyz(b.x, b.y);
        let dot = (ax * bx + ay * by + az * bz).clamp(-1.0, 1.0);
        let theta = dot.acos();
        if theta.abs() < 1e-12 {
            return *a;
        }
        let sin_theta = theta.sin();
        let w_a = ((1.0 - r) * theta).sin() / sin_theta;
        let w_b = (r * theta).sin() / sin_theta;
        let (px, py, pz) = (w_a * ax + w_b * bx, w_a * ay + w_b * by, w_a * az + w_b * bz);
        let (lon, lat) = unit_xyz_to_lonlat(px, py, pz);
        let z = match (a.z, b.z) {
            (Some(az), Some(bz)) => Some(az + (bz - az) * r),
            _ => None,
        };
        Point { x: lon, y: lat, z }
    }

    /// Perpendicular distance of `p` from the segment `a -> b` (planar).
    /// Returns `None` when `a == b` (degenerate segment).
    pub fn perpendicular_distance(p: &Self, a: &Self, b: &Self) -> Option<f64> {
        let (dx, dy) = (b.x - a.x, b.y - a.y);
        let len_sq = dx * dx + dy * dy;
        if len_sq <= f64::EPSILON {
            return None;
        }
        let num = (dy * p.x - dx * p.y + b.x * a.y - b.y * a.x).abs();
        Some(num / len_sq.sqrt())
    }

    /// Fractional offset `r` such that `lerp(a, b, r) == p`, if `p` lies on
    /// segment `a -> b` within `eps`. Used by the restriction engine to
    /// invert a linear point segment at a target value.
    pub fn fractional_offset(p: &Self, a: &Self, b: &Self, eps: f64) -> Option<f64> {
        let dist = Self::perpendicular_distance(p, a, b)?;
        if dist > eps {
            return None;
        }
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let r = if dx.abs() >= dy.abs() {
            if dx.abs() <= f64::EPSILON {
                return None;
            }
            (p.x - a.x) / dx
        } else {
            (p.y - a.y) / dy
        };
        if !(-eps..=1.0 + eps).contains(&r) {
            return None;
        }
        Some(r.clamp(0.0, 1.0))
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.z {
            Some(z) => write!(f, "POINT({} {} {})", self.x, self.y, z),
            None => write!(f, "POINT({} {})", self.x, self.y),
        }
    }
}

fn lonlat_to_unit_xyz(lon: f64, lat: f64) -> (f64, f64, f64) {
    let (lon, lat) = (lon.to_radians(), lat.to_radians());
    (lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin())
}

fn unit_xyz_to_lonlat(x: f64, y: f64, z: f64) -> (f64, f64) {
    let lat = z.clamp(-1.0, 1.0).asin();
    let lon = y.atan2(x);
    (lon.to_degrees(), lat.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_midpoint() {
        let a = Point::xy(0.0, 0.0);
        let b = Point::xy(10.0, 20.0);
        let m = Point::lerp(&a, &b, 0.5);
        assert_eq!(m, Point::xy(5.0, 10.0));
    }

    #[test]
    fn perpendicular_distance_on_segment() {
        let a = Point::xy(0.0, 0.0);
        let b = Point::xy(10.0, 0.0);
        let p = Point::xy(5.0, 0.0);
        assert_eq!(Point::perpendicular_distance(&p, &a, &b), Some(0.0));
        let off = Point::xy(5.0, 1.0);
        assert!((Point::perpendicular_distance(&off, &a, &b).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn fractional_offset_roundtrip() {
        let a = Point::xy(0.0, 0.0);
        let b = Point::xy(10.0, 10.0);
        let mid = Point::lerp(&a, &b, 0.3);
        let r = Point::fractional_offset(&mid, &a, &b, 1e-5).unwrap();
        assert!((r - 0.3).abs() < 1e-6);
    }

    #[test]
    fn slerp_endpoints() {
        let a = Point::xy(0.0, 0.0);
        let b = Point::xy(90.0, 0.0);
        let start = Point::slerp_geodetic(&a, &b, 0.0);
        assert!((start.x - a.x).abs() < 1e-6 && (start.y - a.y).abs() < 1e-6);
        let end = Point::slerp_geodetic(&a, &b, 1.0);
        assert!((end.x - b.x).abs() < 1e-6 && (end.y - b.y).abs() < 1e-6);
    }
}

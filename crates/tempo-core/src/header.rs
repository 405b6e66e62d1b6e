use serde::{Deserialize, Serialize};
use tempo_box::{STBox, TBox, ValueRange};
use tempo_time::{Period, Timestamp};
use tempo_value::{BaseType, BaseValue};

/// Step interpolation holds the last value until the next instant; linear
/// interpolates between consecutive instants. Meaningful only for
/// interpolable base types — non-interpolable ones are always `Step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interpolation {
    Step,
    Linear,
}

/// Flags shared by every subtype's header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags {
    pub interp: Interpolation,
    pub has_z: bool,
    pub is_geodetic: bool,
}

impl Flags {
    pub fn step() -> Self {
        Flags { interp: Interpolation::Step, has_z: false, is_geodetic: false }
    }

    pub fn linear() -> Self {
        Flags { interp: Interpolation::Linear, has_z: false, is_geodetic: false }
    }
}

/// The box stored in a temporal value's header: `TBox` for scalar base
/// types, `STBox` for points, computed once at construction (§3.5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BoundingBox {
    Scalar(TBox),
    Spatial(STBox),
}

impl BoundingBox {
    pub fn time_period(&self) -> Option<Period> {
        match self {
            BoundingBox::Scalar(b) => b.time_period,
            BoundingBox::Spatial(b) => b.time_period,
        }
    }

    pub fn value_range(&self) -> Option<ValueRange> {
        match self {
            BoundingBox::Scalar(b) => b.value_range,
            BoundingBox::Spatial(_) => None,
        }
    }
}

/// Computes the bounding box for a temporal value from its sampled
/// `(value, timestamp)` pairs, in construction order (not necessarily sorted
/// by time — only the time axis cares about ordering, which `union`/`super_union`
/// handle regardless).
pub fn compute_bbox(base_type: BaseType, flags: Flags, samples: &[(&BaseValue, Timestamp)]) -> BoundingBox {
    assert!(!samples.is_empty(), "bounding box requires at least one sample");
    let time_period = samples
        .iter()
        .map(|(_, t)| Period::instant(*t))
        .reduce(|a, b| a.super_union(&b))
        .expect("non-empty");

    match base_type {
        BaseType::Point => {
            let mut x = None;
            let mut y = None;
            let mut z = None;
            for (v, _) in samples {
                if let BaseValue::Point(p) = v {
                    x = Some(extend(x, p.x));
                    y = Some(extend(y, p.y));
                    if let Some(pz) = p.z {
                        z = Some(extend(z, pz));
                    }
                }
            }
            BoundingBox::Spatial(STBox {
                x,
                y,
                z,
                time_period: Some(time_period),
                srid: None,
                geodetic: flags.is_geodetic,
            })
        }
        BaseType::Int => {
            let range = samples
                .iter()
                .filter_map(|(v, _)| match v {
                    BaseValue::Int(i) => Some(ValueRange::singleton(*i as f64)),
                    _ => None,
                })
                .reduce(|a, b| a.union(&b));
            BoundingBox::Scalar(TBox::new(range, Some(time_period)))
        }
        BaseType::Float => {
            let range = samples
                .iter()
                .filter_map(|(v, _)| match v {
                    BaseValue::Float(f) => Some(ValueRange::singleton(*f)),
                    _ => None,
                })
                .reduce(|a, b| a.union(&b));
            BoundingBox::Scalar(TBox::new(range, Some(time_period)))
        }
        _ => BoundingBox::Scalar(TBox::time_only(time_period)),
    }
}

fn extend(current: Option<ValueRange>, v: f64) -> ValueRange {
    match current {
        Some(r) => r.union(&ValueRange::singleton(v)),
        None => ValueRange::singleton(v),
    }
}

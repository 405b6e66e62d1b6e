use tempo_box::{STBox, TBox, ValueRange};
use tempo_value::BaseValue;

use crate::header::BoundingBox;
use crate::restrict::{matches_anywhere, ValueWindow};
use crate::temporal::Temporal;

/// `ever_eq`/`always_eq` and friends: does `P` hold at some instant, or at
/// every instant, of `t` (§4.7-4.8). The bounding box is checked first —
/// a box miss proves the answer without walking a single instant.
pub fn ever(t: &Temporal, mut p: impl FnMut(&BaseValue) -> bool, prefilter: impl Fn(&BoundingBox) -> bool) -> bool {
    if !prefilter(&t.bbox()) {
        return false;
    }
    t.instants().into_iter().any(|i| p(&i.value))
}

pub fn always(t: &Temporal, mut p: impl FnMut(&BaseValue) -> bool, prefilter: impl Fn(&BoundingBox) -> bool) -> bool {
    if !prefilter(&t.bbox()) {
        return false;
    }
    t.instants().into_iter().all(|i| p(&i.value))
}

/// `ever_eq(t, v)`: bbox prefilter checks the box contains `v`'s point, then
/// `matches_anywhere` checks every segment for a match — including an
/// interior linear crossing that touches neither endpoint — rather than
/// only the sampled instants (§4.7).
pub fn ever_eq(t: &Temporal, value: &BaseValue) -> bool {
    if !bbox_contains_value(&t.bbox(), value) {
        return false;
    }
    matches_anywhere(t, &ValueWindow::exact(value)).unwrap_or(false)
}

pub fn always_eq(t: &Temporal, value: &BaseValue) -> bool {
    always(t, |v| v.eq_value(value), |bbox| bbox_contains_value(bbox, value))
}

/// `ever_lt`/`ever_le`/`ever_gt`/`ever_ge` share one bbox check: the value
/// range side of the box must itself satisfy the comparison for at least
/// one member, which a box overlap test captures directly. The actual
/// match is crossing-aware: a linear segment whose endpoints straddle
/// `bound` without either one being below it still counts (§4.7).
pub fn ever_less(t: &Temporal, bound: &BaseValue) -> bool {
    let prefilter_ok = match (t.bbox().value_range(), as_f64(bound)) {
        (Some(range), Some(b)) => range.min < b,
        _ => true,
    };
    if !prefilter_ok {
        return false;
    }
    let window = ValueWindow { lo: None, hi: Some(bound), lo_inc: true, hi_inc: false };
    matches_anywhere(t, &window).unwrap_or(false)
}

pub fn always_less(t: &Temporal, bound: &BaseValue) -> bool {
    always(t, |v| v.cmp_value(bound) == std::cmp::Ordering::Less, |bbox| match (bbox.value_range(), as_f64(bound)) {
        (Some(range), Some(bound)) => range.max < bound,
        _ => true,
    })
}

fn bbox_contains_value(bbox: &BoundingBox, value: &BaseValue) -> bool {
    match (bbox, value) {
        (BoundingBox::Scalar(TBox { value_range: Some(range), .. }), _) => match as_f64(value) {
            Some(v) => range.contains(v),
            None => true,
        },
        (BoundingBox::Spatial(STBox { x: Some(x), y: Some(y), z, .. }), BaseValue::Point(p)) => {
            x.contains(p.x) && y.contains(p.y) && point_z_in_range(z, p.z)
        }
        _ => true,
    }
}

fn point_z_in_range(range: &Option<ValueRange>, z: Option<f64>) -> bool {
    match (range, z) {
        (Some(r), Some(z)) => r.contains(z),
        (None, _) | (_, None) => true,
    }
}

fn as_f64(value: &BaseValue) -> Option<f64> {
    match value {
        BaseValue::Int(i) => Some(*i as f64),
        BaseValue::Float(f) => Some(*f),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Flags;
    use crate::instant::Instant;
    use crate::sequence::Sequence;
    use tempo_value::BaseType;

    fn seq(points: &[(i64, f64)]) -> Temporal {
        let instants = points.iter().map(|(t, v)| Instant::new(*t, BaseValue::Float(*v))).collect();
        Temporal::Sequence(Sequence::new(BaseType::Float, Flags::step(), instants, true, true).unwrap())
    }

    #[test]
    fn ever_eq_true_when_a_sample_matches() {
        let t = seq(&[(0, 1.0), (10, 5.0), (20, 9.0)]);
        assert!(ever_eq(&t, &BaseValue::Float(5.0)));
        assert!(!ever_eq(&t, &BaseValue::Float(42.0)));
    }

    #[test]
    fn always_eq_requires_every_sample_to_match() {
        let t = seq(&[(0, 5.0), (10, 5.0)]);
        assert!(always_eq(&t, &BaseValue::Float(5.0)));
        let t2 = seq(&[(0, 5.0), (10, 6.0)]);
        assert!(!always_eq(&t2, &BaseValue::Float(5.0)));
    }

    #[test]
    fn bbox_prefilter_rejects_out_of_range_value_without_scanning() {
        let t = seq(&[(0, 1.0), (10, 2.0), (20, 3.0)]);
        assert!(!ever_eq(&t, &BaseValue::Float(100.0)));
    }

    #[test]
    fn ever_less_and_always_less() {
        let t = seq(&[(0, 1.0), (10, 2.0), (20, 3.0)]);
        assert!(ever_less(&t, &BaseValue::Float(2.0)));
        assert!(!always_less(&t, &BaseValue::Float(2.0)));
        assert!(always_less(&t, &BaseValue::Float(10.0)));
    }

    fn linear_seq(points: &[(i64, f64)]) -> Temporal {
        let instants = points.iter().map(|(t, v)| Instant::new(*t, BaseValue::Float(*v))).collect();
        Temporal::Sequence(Sequence::new(BaseType::Float, Flags::linear(), instants, true, true).unwrap())
    }

    #[test]
    fn ever_eq_detects_an_interior_crossing_on_a_linear_segment() {
        let t = linear_seq(&[(0, 1.0), (10, 10.0)]);
        assert!(!t.instants().iter().any(|i| i.value.eq_value(&BaseValue::Float(5.0))));
        assert!(ever_eq(&t, &BaseValue::Float(5.0)));
        assert!(!ever_eq(&t, &BaseValue::Float(10.5)));
    }

    #[test]
    fn ever_less_detects_an_interior_crossing_on_a_linear_segment() {
        let t = linear_seq(&[(0, 5.0), (10, -5.0)]);
        assert!(!t.instants().iter().any(|i| i.value.cmp_value(&BaseValue::Float(0.0)) == std::cmp::Ordering::Less));
        assert!(ever_less(&t, &BaseValue::Float(0.0)));
    }
}

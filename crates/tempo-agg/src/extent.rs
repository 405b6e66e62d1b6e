use tempo_core::{BoundingBox, Temporal};

/// Running state for `extent`: no skiplist needed, since the result is
/// just the super-union of every input's bounding box (§4.10) — there is
/// nothing to synchronize or splice, only to widen.
#[derive(Debug, Clone, Default)]
pub struct ExtentState {
    bbox: Option<BoundingBox>,
}

impl ExtentState {
    pub fn new() -> Self {
        ExtentState { bbox: None }
    }

    pub fn add_temporal(&mut self, t: &Temporal) {
        self.add_bbox(t.bbox());
    }

    pub fn add_bbox(&mut self, bbox: BoundingBox) {
        self.bbox = Some(match self.bbox.take() {
            None => bbox,
            Some(existing) => union_bbox(existing, bbox),
        });
    }

    pub fn combine(&mut self, other: Self) {
        if let Some(b) = other.bbox {
            self.add_bbox(b);
        }
    }

    pub fn finalize(&self) -> Option<BoundingBox> {
        self.bbox.clone()
    }
}

/// Unions two boxes of the same kind. Mismatched `Scalar`/`Spatial` boxes
/// never arise in practice (every temporal value carries one bbox kind
/// fixed by its base type), so the first operand wins rather than panicking.
fn union_bbox(a: BoundingBox, b: BoundingBox) -> BoundingBox {
    match (a, b) {
        (BoundingBox::Scalar(a), BoundingBox::Scalar(b)) => BoundingBox::Scalar(a.union(&b)),
        (BoundingBox::Spatial(a), BoundingBox::Spatial(b)) => BoundingBox::Spatial(a.union(&b)),
        (a, _) => a,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempo_core::{Flags, Instant, Sequence};
    use tempo_value::{BaseType, BaseValue};

    fn seq_temporal(points: &[(i64, f64)]) -> Temporal {
        let instants: Vec<Instant> = points.iter().map(|(t, v)| Instant::new(*t, BaseValue::Float(*v))).collect();
        Temporal::Sequence(Sequence::new(BaseType::Float, Flags::linear(), instants, true, true).unwrap())
    }

    #[test]
    fn widens_across_inputs() {
        let mut state = ExtentState::new();
        state.add_temporal(&seq_temporal(&[(0, 0.0), (10, 5.0)]));
        state.add_temporal(&seq_temporal(&[(20, -5.0), (30, 2.0)]));
        let bbox = state.finalize().unwrap();
        let period = bbox.time_period().unwrap();
        assert_eq!((period.lower, period.upper), (0, 30));
        let range = bbox.value_range().unwrap();
        assert_eq!((range.min, range.max), (-5.0, 5.0));
    }

    #[test]
    fn empty_state_finalizes_to_none() {
        assert!(ExtentState::new().finalize().is_none());
    }

    #[test]
    fn combine_merges_two_partial_states() {
        let mut a = ExtentState::new();
        let mut b = ExtentState::new();
        a.add_temporal(&seq_temporal(&[(0, 0.0), (10, 1.0)]));
        b.add_temporal(&seq_temporal(&[(50, 9.0), (60, 9.0)]));
        a.combine(b);
        let period = a.finalize().unwrap().time_period().unwrap();
        assert_eq!((period.lower, period.upper), (0, 60));
    }
}

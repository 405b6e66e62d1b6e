use serde::{Deserialize, Serialize};
use tempo_box::{STBox, TBox};
use tempo_time::{Period, PeriodSet};
use tempo_value::{BaseType, TemporalError, TemporalResult};

use crate::header::{BoundingBox, Flags};
use crate::normalize::normalize_sequence_set;
use crate::sequence::Sequence;

/// A set of time-disjoint sequences (§3.3). Adjacent sequences whose shared
/// boundary carries the same value are merged into one at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceSet {
    pub base_type: BaseType,
    pub flags: Flags,
    pub bbox: BoundingBox,
    pub sequences: Vec<Sequence>,
}

impl SequenceSet {
    pub fn new(base_type: BaseType, flags: Flags, sequences: Vec<Sequence>) -> TemporalResult<Self> {
        if sequences.is_empty() {
            return Err(TemporalError::InvalidArgument("sequence set must be non-empty"));
        }
        if sequences.iter().any(|s| s.base_type != base_type) {
            return Err(TemporalError::InvalidArgument("sequence set members must share a base type"));
        }
        if sequences.iter().any(|s| s.flags.interp != flags.interp) {
            return Err(TemporalError::InvalidArgument("sequence set members must share an interpolation"));
        }
        let sequences = normalize_sequence_set(sequences);
        for w in sequences.windows(2) {
            if w[0].period.overlaps(&w[1].period) {
                return Err(TemporalError::InvalidArgument("sequence set members must be time-disjoint"));
            }
        }
        let bbox = union_bbox(&sequences);
        Ok(SequenceSet { base_type, flags, bbox, sequences })
    }

    pub fn num_sequences(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn span(&self) -> PeriodSet {
        let periods: Vec<Period> = self.sequences.iter().map(|s| s.period).collect();
        PeriodSet::new(periods).expect("sequence set is non-empty")
    }
}

fn union_bbox(sequences: &[Sequence]) -> BoundingBox {
    sequences
        .iter()
        .map(|s| s.bbox.clone())
        .reduce(|a, b| match (a, b) {
            (BoundingBox::Scalar(a), BoundingBox::Scalar(b)) => BoundingBox::Scalar(TBox::new(
                union_opt(a.value_range, b.value_range, |x, y| x.union(&y)),
                union_opt(a.time_period, b.time_period, |x, y| x.super_union(&y)),
            )),
            (BoundingBox::Spatial(a), BoundingBox::Spatial(b)) => BoundingBox::Spatial(STBox {
                x: union_opt(a.x, b.x, |x, y| x.union(&y)),
                y: union_opt(a.y, b.y, |x, y| x.union(&y)),
                z: union_opt(a.z, b.z, |x, y| x.union(&y)),
                time_period: union_opt(a.time_period, b.time_period, |x, y| x.super_union(&y)),
                srid: a.srid.or(b.srid),
                geodetic: a.geodetic || b.geodetic,
            }),
            (a, _) => a,
        })
        .expect("sequences is non-empty")
}

fn union_opt<T>(a: Option<T>, b: Option<T>, f: impl FnOnce(T, T) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(f(a, b)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instant::Instant;
    use tempo_value::BaseValue;

    fn i(t: i64, v: f64) -> Instant {
        Instant::new(t, BaseValue::Float(v))
    }

    fn seq(from: i64, to: i64, v0: f64, v1: f64, lower_inc: bool, upper_inc: bool) -> Sequence {
        Sequence::new(BaseType::Float, Flags::linear(), vec![i(from, v0), i(to, v1)], lower_inc, upper_inc).unwrap()
    }

    #[test]
    fn disjoint_sequences_stay_separate() {
        let set = SequenceSet::new(
            BaseType::Float,
            Flags::linear(),
            vec![seq(0, 10, 0.0, 1.0, true, true), seq(20, 30, 2.0, 3.0, true, true)],
        )
        .unwrap();
        assert_eq!(set.num_sequences(), 2);
    }

    #[test]
    fn adjacent_matching_boundary_merges() {
        let set = SequenceSet::new(
            BaseType::Float,
            Flags::linear(),
            vec![seq(0, 10, 0.0, 5.0, true, true), seq(10, 20, 5.0, 10.0, false, true)],
        )
        .unwrap();
        assert_eq!(set.num_sequences(), 1);
        assert_eq!(set.sequences[0].len(), 3);
    }

    #[test]
    fn mismatched_interpolation_is_rejected() {
        let step_seq = Sequence::new(BaseType::Float, Flags::step(), vec![i(0, 0.0), i(10, 1.0)], true, true).unwrap();
        let result = SequenceSet::new(BaseType::Float, Flags::linear(), vec![seq(20, 30, 2.0, 3.0, true, true), step_seq]);
        assert!(result.is_err());
    }

    #[test]
    fn overlapping_sequences_are_rejected() {
        let result = SequenceSet::new(
            BaseType::Float,
            Flags::linear(),
            vec![seq(0, 10, 0.0, 1.0, true, true), seq(5, 15, 2.0, 3.0, true, true)],
        );
        assert!(result.is_err());
    }
}

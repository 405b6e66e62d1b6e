use serde::{Deserialize, Serialize};
use tempo_value::{BaseType, TemporalError, TemporalResult};

use crate::header::{compute_bbox, BoundingBox, Flags};
use crate::instant::Instant;

/// An ordered, strictly-increasing-timestamp vector of instants. Redundant
/// instants (step interpolation, equal consecutive values) may be dropped at
/// construction (§3.3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstantSet {
    pub base_type: BaseType,
    pub flags: Flags,
    pub bbox: BoundingBox,
    pub instants: Vec<Instant>,
}

impl InstantSet {
    pub fn new(base_type: BaseType, flags: Flags, mut instants: Vec<Instant>) -> TemporalResult<Self> {
        if instants.is_empty() {
            return Err(TemporalError::InvalidArgument("instant set must be non-empty"));
        }
        if !instants.windows(2).all(|w| w[0].t < w[1].t) {
            return Err(TemporalError::InvalidArgument("instant set timestamps must be strictly increasing"));
        }
        if flags.interp == crate::header::Interpolation::Step {
            instants.dedup_by(|b, a| a.value.eq_value(&b.value));
        }
        let samples: Vec<_> = instants.iter().map(|i| (&i.value, i.t)).collect();
        let bbox = compute_bbox(base_type, flags, &samples);
        Ok(InstantSet { base_type, flags, bbox, instants })
    }

    pub fn len(&self) -> usize {
        self.instants.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempo_value::BaseValue;

    #[test]
    fn rejects_non_increasing_timestamps() {
        let instants = vec![Instant::new(1, BaseValue::Int(1)), Instant::new(1, BaseValue::Int(2))];
        assert!(InstantSet::new(BaseType::Int, Flags::step(), instants).is_err());
    }

    #[test]
    fn step_interpolation_drops_redundant_repeats() {
        let instants = vec![
            Instant::new(0, BaseValue::Int(1)),
            Instant::new(10, BaseValue::Int(1)),
            Instant::new(20, BaseValue::Int(2)),
        ];
        let set = InstantSet::new(BaseType::Int, Flags::step(), instants).unwrap();
        assert_eq!(set.len(), 2);
    }
}

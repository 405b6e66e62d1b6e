use serde::{Deserialize, Serialize};
use tempo_time::Period;
use tempo_value::{BaseType, TemporalError, TemporalResult};

use crate::header::{compute_bbox, BoundingBox, Flags, Interpolation};
use crate::instant::Instant;
use crate::normalize::normalize_sequence;

/// A time-contiguous run of instants sharing one interpolation. Exactly one
/// instant when the period is instantaneous; otherwise strictly increasing
/// timestamps and (subject to normalization) no redundant interior instant
/// (§3.3, §3.4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    pub base_type: BaseType,
    pub flags: Flags,
    pub bbox: BoundingBox,
    pub period: Period,
    pub instants: Vec<Instant>,
}

impl Sequence {
    pub fn new(
        base_type: BaseType,
        flags: Flags,
        mut instants: Vec<Instant>,
        lower_inc: bool,
        upper_inc: bool,
    ) -> TemporalResult<Self> {
        if instants.is_empty() {
            return Err(TemporalError::InvalidArgument("sequence must have at least one instant"));
        }
        if !instants.windows(2).all(|w| w[0].t < w[1].t) {
            return Err(TemporalError::InvalidArgument("sequence timestamps must be strictly increasing"));
        }

        // Step interpolation with an exclusive upper bound: the final
        // instant is never observed, so its value is forced to match the
        // penultimate one rather than rejected as an inconsistency.
        if flags.interp == Interpolation::Step && !upper_inc && instants.len() >= 2 {
            let len = instants.len();
            let carried = instants[len - 2].value.clone();
            instants[len - 1].value = carried;
        }

        let period = Period::new(
            instants.first().expect("checked non-empty").t,
            instants.last().expect("checked non-empty").t,
            lower_inc,
            upper_inc,
        )?;

        let instants = normalize_sequence(&instants, flags.interp, flags.is_geodetic);

        let samples: Vec<_> = instants.iter().map(|i| (&i.value, i.t)).collect();
        let bbox = compute_bbox(base_type, flags, &samples);

        Ok(Sequence { base_type, flags, bbox, period, instants })
    }

    pub fn len(&self) -> usize {
        self.instants.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn is_instant(&self) -> bool {
        self.period.is_instant()
    }

    /// Value held at `t`, or `None` if `t` falls outside the sequence's
    /// period. Step interpolation holds the last instant at or before `t`;
    /// linear interpolates between the bracketing pair.
    pub fn value_at(&self, t: tempo_time::Timestamp) -> Option<tempo_value::BaseValue> {
        if !self.period.contains_timestamp(t) {
            return None;
        }
        match self.instants.binary_search_by_key(&t, |i| i.t) {
            Ok(idx) => Some(self.instants[idx].value.clone()),
            Err(idx) => {
                if idx == 0 || idx == self.instants.len() {
                    return None;
                }
                let before = &self.instants[idx - 1];
                match self.flags.interp {
                    Interpolation::Step => Some(before.value.clone()),
                    Interpolation::Linear => {
                        let after = &self.instants[idx];
                        let r = (t - before.t) as f64 / (after.t - before.t) as f64;
                        tempo_value::BaseValue::interpolate(&before.value, &after.value, r, self.flags.is_geodetic)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempo_value::BaseValue;

    fn i(t: i64, v: f64) -> Instant {
        Instant::new(t, BaseValue::Float(v))
    }

    #[test]
    fn single_instant_forces_instantaneous_period() {
        let seq = Sequence::new(BaseType::Float, Flags::linear(), vec![i(5, 1.0)], true, true).unwrap();
        assert!(seq.is_instant());
        assert_eq!(seq.len(), 1);
    }

    #[test]
    fn step_with_exclusive_upper_forces_last_value() {
        let instants = vec![i(0, 1.0), i(10, 1.0), i(20, 99.0)];
        let seq = Sequence::new(BaseType::Float, Flags::step(), instants, true, false).unwrap();
        assert_eq!(seq.instants.last().unwrap().value, BaseValue::Float(1.0));
    }

    #[test]
    fn linear_normalizes_collinear_midpoint() {
        let instants = vec![i(0, 0.0), i(50, 5.0), i(100, 10.0)];
        let seq = Sequence::new(BaseType::Float, Flags::linear(), instants, true, true).unwrap();
        assert_eq!(seq.len(), 2);
    }

    #[test]
    fn value_at_interpolates_linear() {
        let instants = vec![i(0, 0.0), i(100, 10.0)];
        let seq = Sequence::new(BaseType::Float, Flags::linear(), instants, true, true).unwrap();
        assert_eq!(seq.value_at(25), Some(BaseValue::Float(2.5)));
    }

    #[test]
    fn value_at_holds_step() {
        let instants = vec![i(0, 1.0), i(100, 2.0)];
        let seq = Sequence::new(BaseType::Float, Flags::step(), instants, true, true).unwrap();
        assert_eq!(seq.value_at(50), Some(BaseValue::Float(1.0)));
    }

    #[test]
    fn value_at_outside_period_is_none() {
        let instants = vec![i(10, 1.0), i(20, 2.0)];
        let seq = Sequence::new(BaseType::Float, Flags::step(), instants, true, true).unwrap();
        assert_eq!(seq.value_at(5), None);
    }

    #[test]
    fn rejects_non_increasing_timestamps() {
        let instants = vec![i(10, 1.0), i(10, 2.0)];
        assert!(Sequence::new(BaseType::Float, Flags::step(), instants, true, true).is_err());
    }
}

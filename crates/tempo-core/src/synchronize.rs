use tempo_time::{Period, PeriodSet, Timestamp};
use tempo_value::{BaseValue, TemporalResult};

use crate::header::Flags;
use crate::instant::Instant;
use crate::restrict::{self, Mode};
use crate::sequence::Sequence;
use crate::sequence_set::SequenceSet;
use crate::temporal::Temporal;

/// How two temporal values are brought onto a common time domain (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Clip both operands to their overlapping time domain; no instant
    /// synthesis beyond what restriction already does.
    Intersect,
    /// Additionally synthesize matching instants at every timestamp either
    /// side samples, so both operands carry the exact same instant grid.
    /// Only meaningful when both operands are continuous (`Sequence` or
    /// `SequenceSet`) — discrete operands fall back to `Intersect`, since
    /// there is nothing to interpolate between their samples.
    Synchronize,
    /// Like `Synchronize`, plus insert a synthesized instant at every point
    /// where two linear segments cross in value.
    SynchronizeWithCrossings,
}

/// Brings `a` and `b` onto a common time domain. Returns `None` when their
/// time spans don't overlap at all.
pub fn synchronize(a: &Temporal, b: &Temporal, mode: SyncMode) -> TemporalResult<Option<(Temporal, Temporal)>> {
    let overlap = match a.time_span().intersection(&b.time_span()) {
        Some(o) => o,
        None => return Ok(None),
    };

    let continuous = a.is_temporally_continuous() && b.is_temporally_continuous();
    if mode == SyncMode::Intersect || !continuous {
        let a_clipped = restrict::restrict_period_set(a, &overlap, Mode::At)?;
        let b_clipped = restrict::restrict_period_set(b, &overlap, Mode::At)?;
        return Ok(match (a_clipped, b_clipped) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        });
    }

    let with_crossings = mode == SyncMode::SynchronizeWithCrossings;
    let mut a_pieces = Vec::new();
    let mut b_pieces = Vec::new();
    for p in overlap.periods() {
        if let Some((ap, bp)) = synchronize_period(a, b, p, with_crossings) {
            a_pieces.push(ap);
            b_pieces.push(bp);
        }
    }
    if a_pieces.is_empty() {
        return Ok(None);
    }
    Ok(Some((collapse(a.base_type(), a.flags().unwrap_or_else(Flags::step), a_pieces)?, collapse(b.base_type(), b.flags().unwrap_or_else(Flags::step), b_pieces)?)))
}

fn synchronize_period(a: &Temporal, b: &Temporal, period: &Period, with_crossings: bool) -> Option<(Sequence, Sequence)> {
    let mut grid: Vec<Timestamp> = a
        .instants()
        .iter()
        .chain(b.instants().iter())
        .map(|i| i.t)
        .filter(|t| period.contains_timestamp(*t))
        .collect();
    grid.sort_unstable();
    grid.dedup();
    if grid.is_empty() {
        return None;
    }

    if with_crossings {
        let mut crossings = Vec::new();
        for w in grid.windows(2) {
            if let Some(tc) = find_crossing(a, b, w[0], w[1]) {
                crossings.push(tc);
            }
        }
        grid.extend(crossings);
        grid.sort_unstable();
        grid.dedup();
    }

    let a_instants: Vec<Instant> = grid.iter().map(|t| a.value_at(*t).map(|v| Instant::new(*t, v))).collect::<Option<_>>()?;
    let b_instants: Vec<Instant> = grid.iter().map(|t| b.value_at(*t).map(|v| Instant::new(*t, v))).collect::<Option<_>>()?;

    let a_seq = Sequence::new(a.base_type(), a.flags()?, a_instants, period.lower_inc, period.upper_inc).ok()?;
    let b_seq = Sequence::new(b.base_type(), b.flags()?, b_instants, period.lower_inc, period.upper_inc).ok()?;
    Some((a_seq, b_seq))
}

/// Solves for the timestamp in `(t0, t1)` where `a`'s and `b`'s values
/// cross, assuming both sides are affine in `t` over that sub-interval
/// (true whenever neither side has an instant strictly between `t0` and
/// `t1`, which holds by construction of the merged grid).
fn find_crossing(a: &Temporal, b: &Temporal, t0: Timestamp, t1: Timestamp) -> Option<Timestamp> {
    let (av0, av1) = (a.value_at(t0)?, a.value_at(t1)?);
    let (bv0, bv1) = (b.value_at(t0)?, b.value_at(t1)?);
    let (av0, av1, bv0, bv1) = match (av0, av1, bv0, bv1) {
        (BaseValue::Float(av0), BaseValue::Float(av1), BaseValue::Float(bv0), BaseValue::Float(bv1)) => (av0, av1, bv0, bv1),
        _ => return None,
    };
    let da = av1 - av0;
    let db = bv1 - bv0;
    let denom = da - db;
    if denom.abs() <= f64::EPSILON {
        return None;
    }
    let r = (bv0 - av0) / denom;
    if r <= 0.0 || r >= 1.0 {
        return None;
    }
    let tc = t0 + ((t1 - t0) as f64 * r).round() as i64;
    (tc > t0 && tc < t1).then_some(tc)
}

fn collapse(base_type: tempo_value::BaseType, flags: Flags, sequences: Vec<Sequence>) -> TemporalResult<Temporal> {
    match sequences.len() {
        1 => {
            let seq = sequences.into_iter().next().expect("len 1");
            if seq.is_instant() {
                Ok(Temporal::Instant(seq.instants.into_iter().next().expect("instantaneous sequence has one instant")))
            } else {
                Ok(Temporal::Sequence(seq))
            }
        }
        _ => Ok(Temporal::SequenceSet(SequenceSet::new(base_type, flags, sequences)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Flags;
    use tempo_value::BaseType;

    fn linear_seq(points: &[(i64, f64)]) -> Temporal {
        let instants: Vec<Instant> = points.iter().map(|(t, v)| Instant::new(*t, BaseValue::Float(*v))).collect();
        Temporal::Sequence(Sequence::new(BaseType::Float, Flags::linear(), instants, true, true).unwrap())
    }

    #[test]
    fn non_overlapping_sequences_do_not_synchronize() {
        let a = linear_seq(&[(0, 0.0), (10, 1.0)]);
        let b = linear_seq(&[(20, 0.0), (30, 1.0)]);
        assert_eq!(synchronize(&a, &b, SyncMode::Intersect).unwrap(), None);
    }

    #[test]
    fn intersect_clips_to_common_domain() {
        let a = linear_seq(&[(0, 0.0), (100, 10.0)]);
        let b = linear_seq(&[(50, 0.0), (150, 5.0)]);
        let (ca, cb) = synchronize(&a, &b, SyncMode::Intersect).unwrap().unwrap();
        assert_eq!(ca.period().lower, 50);
        assert_eq!(ca.period().upper, 100);
        assert_eq!(cb.period().lower, 50);
        assert_eq!(cb.period().upper, 100);
    }

    #[test]
    fn synchronize_merges_instant_grids() {
        let a = linear_seq(&[(0, 0.0), (100, 10.0)]);
        let b = linear_seq(&[(0, 0.0), (25, 1.0), (100, 4.0)]);
        let (ca, cb) = synchronize(&a, &b, SyncMode::Synchronize).unwrap().unwrap();
        match (ca, cb) {
            (Temporal::Sequence(sa), Temporal::Sequence(sb)) => {
                assert_eq!(sa.len(), sb.len());
                assert_eq!(sa.len(), 3);
            }
            other => panic!("expected two Sequences, got {other:?}"),
        }
    }

    #[test]
    fn synchronize_with_crossings_inserts_crossing_point() {
        let a = linear_seq(&[(0, 0.0), (100, 10.0)]);
        let b = linear_seq(&[(0, 10.0), (100, 0.0)]);
        let (ca, _cb) = synchronize(&a, &b, SyncMode::SynchronizeWithCrossings).unwrap().unwrap();
        match ca {
            Temporal::Sequence(sa) => assert_eq!(sa.len(), 3),
            other => panic!("expected a Sequence, got {other:?}"),
        }
    }
}

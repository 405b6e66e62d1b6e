use tempo_time::Timestamp;
use tempo_value::{BaseType, BaseValue, TemporalResult};

use crate::header::{Flags, Interpolation};
use crate::instant::Instant;
use crate::instant_set::InstantSet;
use crate::sequence::Sequence;
use crate::sequence_set::SequenceSet;
use crate::synchronize::{synchronize, SyncMode};
use crate::temporal::Temporal;

/// Given the instant pair on either side of a synchronized window
/// (`a` then `b`, at the window's start and end), returns the interior
/// timestamp at which a lifted function's output changes — e.g. where
/// `a == b` starts or stops holding. `None` if the output doesn't turn
/// within the window.
pub type TurningPointFn = fn(a0: &Instant, b0: &Instant, a1: &Instant, b1: &Instant) -> Option<Timestamp>;

/// Describes how a base-type function's result should be carried as a
/// temporal value, mirroring what the function itself knows about its
/// shape (§4.6). `tempo-core` never inspects `f`'s body — every lift caller
/// supplies this alongside the closure.
#[derive(Debug, Clone, Copy)]
pub struct LiftInfo {
    /// Number of temporal operands `f` takes: 1 for `lift`, 2 for
    /// `sync_lift`, 3 for `ternary_lift` (the third argument is carried
    /// through unsynchronized, e.g. a constant or ancillary base value).
    pub arity: u8,
    pub result_type: BaseType,
    pub result_interp: Interpolation,
    /// Set when `f` can jump discontinuously even on a linear input pair
    /// (equality tests, thresholds): the output is treated as stepwise
    /// between whatever turning points get inserted, rather than linear.
    pub discontinuous: bool,
    /// Swap the two synchronized operands before calling `f`, so a single
    /// one-directional primitive (e.g. `a - b`) can serve both directions.
    pub invert_args: bool,
    /// When set, `sync_lift` inserts an extra aligned instant at each
    /// interior timestamp this reports, so the output's turning point
    /// lands on its own sample instead of being interpolated away.
    pub turning_point_fn: Option<TurningPointFn>,
}

/// Applies `f` pointwise to every instant of `t`, keeping its time
/// structure intact and relabeling the result with `lfinfo`'s type and
/// interpolation.
pub fn lift(f: impl Fn(&BaseValue) -> BaseValue, lfinfo: &LiftInfo, t: &Temporal) -> TemporalResult<Temporal> {
    let out_flags = |flags: Flags| Flags { interp: lfinfo.result_interp, ..flags };
    match t {
        Temporal::Instant(i) => Ok(Temporal::Instant(Instant::new(i.t, f(&i.value)))),
        Temporal::InstantSet(s) => {
            let instants: Vec<Instant> = s.instants.iter().map(|i| Instant::new(i.t, f(&i.value))).collect();
            Ok(Temporal::InstantSet(InstantSet::new(lfinfo.result_type, out_flags(s.flags), instants)?))
        }
        Temporal::Sequence(seq) => Ok(Temporal::Sequence(lift_sequence(&f, lfinfo, seq)?)),
        Temporal::SequenceSet(set) => {
            let sequences: Vec<Sequence> = set.sequences.iter().map(|seq| lift_sequence(&f, lfinfo, seq)).collect::<TemporalResult<_>>()?;
            Ok(Temporal::SequenceSet(SequenceSet::new(lfinfo.result_type, out_flags(set.flags), sequences)?))
        }
    }
}

fn lift_sequence(f: &impl Fn(&BaseValue) -> BaseValue, lfinfo: &LiftInfo, seq: &Sequence) -> TemporalResult<Sequence> {
    let instants: Vec<Instant> = seq.instants.iter().map(|i| Instant::new(i.t, f(&i.value))).collect();
    let flags = Flags { interp: lfinfo.result_interp, ..seq.flags };
    Sequence::new(lfinfo.result_type, flags, instants, seq.period.lower_inc, seq.period.upper_inc)
}

/// Synchronizes `a` and `b`, then applies `f` instant-by-instant to the
/// aligned pair. `None` if the operands' time spans don't overlap.
pub fn sync_lift(
    f: impl Fn(&BaseValue, &BaseValue) -> BaseValue,
    a: &Temporal,
    b: &Temporal,
    lfinfo: &LiftInfo,
) -> TemporalResult<Option<Temporal>> {
    let (sa, sb) = match synchronize(a, b, SyncMode::Synchronize)? {
        Some(pair) => pair,
        None => return Ok(None),
    };

    let a_instants: Vec<Instant> = sa.instants().into_iter().cloned().collect();
    let b_instants: Vec<Instant> = sb.instants().into_iter().cloned().collect();

    let (a_instants, b_instants) = match lfinfo.turning_point_fn {
        Some(tp_fn) if a.is_temporally_continuous() && b.is_temporally_continuous() => {
            insert_turning_points(a, b, &a_instants, &b_instants, tp_fn).unwrap_or((a_instants, b_instants))
        }
        _ => (a_instants, b_instants),
    };

    let merged: Vec<Instant> = a_instants
        .iter()
        .zip(b_instants.iter())
        .map(|(ia, ib)| {
            let value = if lfinfo.invert_args { f(&ib.value, &ia.value) } else { f(&ia.value, &ib.value) };
            Instant::new(ia.t, value)
        })
        .collect();

    Ok(Some(rebuild_like(&sa, lfinfo, merged)?))
}

/// Extends a synchronized instant grid with one extra aligned sample at
/// every interior timestamp `tp_fn` reports between consecutive windows,
/// re-evaluating both sides at that timestamp (mirrors how `synchronize`'s
/// own crossing insertion extends its merged grid, §4.5/§4.6).
fn insert_turning_points(a: &Temporal, b: &Temporal, a_instants: &[Instant], b_instants: &[Instant], tp_fn: TurningPointFn) -> Option<(Vec<Instant>, Vec<Instant>)> {
    let mut timestamps: Vec<Timestamp> = a_instants.iter().map(|i| i.t).collect();
    for w in 0..a_instants.len().saturating_sub(1) {
        if let Some(tc) = tp_fn(&a_instants[w], &b_instants[w], &a_instants[w + 1], &b_instants[w + 1]) {
            if tc > a_instants[w].t && tc < a_instants[w + 1].t {
                timestamps.push(tc);
            }
        }
    }
    timestamps.sort_unstable();
    timestamps.dedup();
    if timestamps.len() == a_instants.len() {
        return Some((a_instants.to_vec(), b_instants.to_vec()));
    }

    let a_ext: Vec<Instant> = timestamps.iter().map(|t| a.value_at(*t).map(|v| Instant::new(*t, v))).collect::<Option<_>>()?;
    let b_ext: Vec<Instant> = timestamps.iter().map(|t| b.value_at(*t).map(|v| Instant::new(*t, v))).collect::<Option<_>>()?;
    Some((a_ext, b_ext))
}

/// Applies a ternary base function pointwise: the first two operands are
/// synchronized and walked together like `sync_lift`, the third is an
/// ancillary value carried through unsynchronized (a constant, a unit, a
/// comparison mode) and passed to every call.
pub fn ternary_lift(
    f: impl Fn(&BaseValue, &BaseValue, &BaseValue) -> BaseValue,
    a: &Temporal,
    b: &Temporal,
    c: &BaseValue,
    lfinfo: &LiftInfo,
) -> TemporalResult<Option<Temporal>> {
    sync_lift(|x, y| f(x, y, c), a, b, lfinfo)
}

/// Reassembles a lifted binary result with the same time shape as `shape`
/// but the new base type/interpolation and already-computed instants.
fn rebuild_like(shape: &Temporal, lfinfo: &LiftInfo, instants: Vec<Instant>) -> TemporalResult<Temporal> {
    match shape {
        Temporal::Instant(_) => Ok(Temporal::Instant(instants.into_iter().next().expect("synchronized instant pair"))),
        Temporal::InstantSet(s) => {
            let flags = Flags { interp: lfinfo.result_interp, ..s.flags };
            Ok(Temporal::InstantSet(InstantSet::new(lfinfo.result_type, flags, instants)?))
        }
        Temporal::Sequence(seq) => {
            let flags = Flags { interp: lfinfo.result_interp, ..seq.flags };
            Ok(Temporal::Sequence(Sequence::new(lfinfo.result_type, flags, instants, seq.period.lower_inc, seq.period.upper_inc)?))
        }
        Temporal::SequenceSet(set) => {
            let flags = Flags { interp: lfinfo.result_interp, ..set.flags };
            // Assign each merged instant to the source sequence whose period
            // contains it, rather than by position — a turning point inserted
            // by `sync_lift` can change how many instants land in each piece.
            let mut sequences = Vec::with_capacity(set.sequences.len());
            for seq in &set.sequences {
                let piece: Vec<Instant> = instants.iter().filter(|i| seq.period.contains_timestamp(i.t)).cloned().collect();
                sequences.push(Sequence::new(lfinfo.result_type, flags, piece, seq.period.lower_inc, seq.period.upper_inc)?);
            }
            Ok(Temporal::SequenceSet(SequenceSet::new(lfinfo.result_type, flags, sequences)?))
        }
    }
}

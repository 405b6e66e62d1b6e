use tempo_time::{Period, PeriodSet, Timestamp};
use tempo_value::{BaseValue, TemporalResult, EPSILON};

use crate::header::Interpolation;
use crate::instant::Instant;
use crate::instant_set::InstantSet;
use crate::sequence::Sequence;
use crate::sequence_set::SequenceSet;
use crate::temporal::Temporal;

/// `at` keeps only the matched sub-domain; `minus` keeps everything else.
/// Every restriction operation in this module takes a mode rather than
/// duplicating its logic twice (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    At,
    Minus,
}

/// A half-open-or-closed value window. `Exact` is the degenerate case used
/// by `restrict_value`; `lo`/`hi` absent means unbounded on that side.
#[derive(Debug, Clone)]
pub struct ValueWindow<'a> {
    pub lo: Option<&'a BaseValue>,
    pub hi: Option<&'a BaseValue>,
    pub lo_inc: bool,
    pub hi_inc: bool,
}

impl<'a> ValueWindow<'a> {
    pub fn exact(v: &'a BaseValue) -> Self {
        ValueWindow { lo: Some(v), hi: Some(v), lo_inc: true, hi_inc: true }
    }

    fn contains(&self, v: &BaseValue) -> bool {
        let above_lo = match self.lo {
            None => true,
            Some(lo) => match v.cmp_value(lo) {
                std::cmp::Ordering::Greater => true,
                std::cmp::Ordering::Equal => self.lo_inc,
                std::cmp::Ordering::Less => false,
            },
        };
        let below_hi = match self.hi {
            None => true,
            Some(hi) => match v.cmp_value(hi) {
                std::cmp::Ordering::Less => true,
                std::cmp::Ordering::Equal => self.hi_inc,
                std::cmp::Ordering::Greater => false,
            },
        };
        above_lo && below_hi
    }
}

pub fn restrict_value(t: &Temporal, value: &BaseValue, mode: Mode) -> TemporalResult<Option<Temporal>> {
    restrict_window(t, &ValueWindow::exact(value), mode)
}

pub fn restrict_values(t: &Temporal, values: &[BaseValue], mode: Mode) -> TemporalResult<Option<Temporal>> {
    let mut union: Option<PeriodSet> = None;
    for v in values {
        if let Some(m) = matched_periods(t, &ValueWindow::exact(v))? {
            union = Some(match union {
                Some(u) => u.union(&m),
                None => m,
            });
        }
    }
    let keep = match mode {
        Mode::At => union,
        Mode::Minus => match union {
            None => Some(t.time_span()),
            Some(u) => t.time_span().minus(&u),
        },
    };
    clip_to_periods(t, keep.as_ref())
}

pub fn restrict_range(t: &Temporal, window: &ValueWindow, mode: Mode) -> TemporalResult<Option<Temporal>> {
    restrict_window(t, window, mode)
}

/// Restricts to the union of several (normalized, possibly overlapping)
/// value windows at once, the range-set counterpart of `restrict_values`
/// for ranges instead of exact values (§4.3).
pub fn restrict_ranges(t: &Temporal, windows: &[ValueWindow], mode: Mode) -> TemporalResult<Option<Temporal>> {
    let mut union: Option<PeriodSet> = None;
    for window in windows {
        if let Some(m) = matched_periods(t, window)? {
            union = Some(match union {
                Some(u) => u.union(&m),
                None => m,
            });
        }
    }
    let keep = match mode {
        Mode::At => union,
        Mode::Minus => match union {
            None => Some(t.time_span()),
            Some(u) => t.time_span().minus(&u),
        },
    };
    clip_to_periods(t, keep.as_ref())
}

pub fn restrict_min(t: &Temporal, mode: Mode) -> TemporalResult<Option<Temporal>> {
    let min = t
        .instants()
        .into_iter()
        .map(|i| &i.value)
        .min_by(|a, b| a.cmp_value(b))
        .expect("temporal values carry at least one instant");
    restrict_value(t, min, mode)
}

pub fn restrict_max(t: &Temporal, mode: Mode) -> TemporalResult<Option<Temporal>> {
    let max = t
        .instants()
        .into_iter()
        .map(|i| &i.value)
        .max_by(|a, b| a.cmp_value(b))
        .expect("temporal values carry at least one instant");
    restrict_value(t, max, mode)
}

pub fn restrict_timestamp(t: &Temporal, ts: Timestamp, mode: Mode) -> TemporalResult<Option<Temporal>> {
    let period = Period::instant(ts);
    restrict_period(t, &period, mode)
}

pub fn restrict_timestamp_set(t: &Temporal, set: &tempo_time::TimestampSet, mode: Mode) -> TemporalResult<Option<Temporal>> {
    let periods: Vec<Period> = set.as_slice().iter().map(|ts| Period::instant(*ts)).collect();
    let requested = PeriodSet::new(periods)?;
    restrict_period_set(t, &requested, mode)
}

pub fn restrict_period(t: &Temporal, period: &Period, mode: Mode) -> TemporalResult<Option<Temporal>> {
    let requested = PeriodSet::new(vec![*period])?;
    restrict_period_set(t, &requested, mode)
}

pub fn restrict_period_set(t: &Temporal, requested: &PeriodSet, mode: Mode) -> TemporalResult<Option<Temporal>> {
    let keep = match mode {
        Mode::At => intersect_with_span(t, requested)?,
        Mode::Minus => subtract_from_span(t, requested)?,
    };
    clip_to_periods(t, keep.as_ref())
}

fn intersect_with_span(t: &Temporal, requested: &PeriodSet) -> TemporalResult<Option<PeriodSet>> {
    Ok(t.time_span().intersection(requested))
}

fn subtract_from_span(t: &Temporal, requested: &PeriodSet) -> TemporalResult<Option<PeriodSet>> {
    Ok(t.time_span().minus(requested))
}

/// The shared engine behind value/values/range restriction: walk every
/// segment of every sequence (instants and instant-sets are handled as
/// degenerate, zero-length segments), work out the sub-intervals where the
/// window matches, then hand off to the generic time-based clipper.
fn restrict_window(t: &Temporal, window: &ValueWindow, mode: Mode) -> TemporalResult<Option<Temporal>> {
    let matched = matched_periods(t, window)?;
    let keep = match mode {
        Mode::At => matched,
        Mode::Minus => match matched {
            None => Some(t.time_span()),
            Some(m) => subtract_periods(&t.time_span(), &m)?,
        },
    };
    clip_to_periods(t, keep.as_ref())
}

fn subtract_periods(span: &PeriodSet, cut: &PeriodSet) -> TemporalResult<Option<PeriodSet>> {
    Ok(span.minus(cut))
}

/// True iff some moment of `t` falls inside `window` — reuses the same
/// per-segment crossing engine restriction uses, so linear segments that
/// cross a target value without touching it at either endpoint still count
/// (§4.7's ever/always crossing-awareness for `<`, `<=`, `==`).
pub(crate) fn matches_anywhere(t: &Temporal, window: &ValueWindow) -> TemporalResult<bool> {
    Ok(matched_periods(t, window)?.is_some())
}

fn matched_periods(t: &Temporal, window: &ValueWindow) -> TemporalResult<Option<PeriodSet>> {
    let mut pieces = Vec::new();
    match t {
        Temporal::Instant(i) => {
            if window.contains(&i.value) {
                pieces.push(i.period());
            }
        }
        Temporal::InstantSet(s) => {
            for i in &s.instants {
                if window.contains(&i.value) {
                    pieces.push(i.period());
                }
            }
        }
        Temporal::Sequence(seq) => pieces.extend(matched_periods_in_sequence(seq, window)),
        Temporal::SequenceSet(set) => {
            for seq in &set.sequences {
                pieces.extend(matched_periods_in_sequence(seq, window));
            }
        }
    }
    if pieces.is_empty() {
        return Ok(None);
    }
    Ok(Some(PeriodSet::new(pieces)?))
}

fn matched_periods_in_sequence(seq: &Sequence, window: &ValueWindow) -> Vec<Period> {
    let mut out = Vec::new();
    let n = seq.instants.len();
    if n == 1 {
        if window.contains(&seq.instants[0].value) {
            out.push(seq.period);
        }
        return out;
    }
    for k in 0..n - 1 {
        let a = &seq.instants[k];
        let b = &seq.instants[k + 1];
        let is_last = k + 1 == n - 1;
        let segment_upper_inc = if is_last { seq.period.upper_inc } else { false };
        match segment_match(a, b, window, seq.flags.interp, seq.flags.is_geodetic, segment_upper_inc) {
            SegmentMatch::None => {}
            SegmentMatch::Point(t) => out.push(Period::instant(t)),
            SegmentMatch::Range(lo, hi, lo_inc, hi_inc) => {
                if let Ok(p) = Period::new(lo, hi, lo_inc, hi_inc) {
                    out.push(p);
                }
            }
        }
    }
    out
}

enum SegmentMatch {
    None,
    Point(Timestamp),
    Range(Timestamp, Timestamp, bool, bool),
}

fn segment_match(
    a: &Instant,
    b: &Instant,
    window: &ValueWindow,
    interp: Interpolation,
    geodetic: bool,
    segment_upper_inc: bool,
) -> SegmentMatch {
    match interp {
        Interpolation::Step => {
            if window.contains(&a.value) {
                SegmentMatch::Range(a.t, b.t, true, segment_upper_inc)
            } else {
                SegmentMatch::None
            }
        }
        Interpolation::Linear => {
            if a.value.eq_value(&b.value) {
                return if window.contains(&a.value) {
                    SegmentMatch::Range(a.t, b.t, true, true)
                } else {
                    SegmentMatch::None
                };
            }
            // Monotonic segment: find where it enters and exits the window.
            let ascending = a.value.cmp_value(&b.value) == std::cmp::Ordering::Less;
            let (near, far) = if ascending { (window.lo, window.hi) } else { (window.hi, window.lo) };
            let enter_r = match near {
                None => 0.0,
                Some(target) => match BaseValue::interpolate_inverse(&a.value, &b.value, target, EPSILON) {
                    Some(r) => r,
                    None => return SegmentMatch::None,
                },
            };
            let exit_r = match far {
                None => 1.0,
                Some(target) => match BaseValue::interpolate_inverse(&a.value, &b.value, target, EPSILON) {
                    Some(r) => r,
                    None => return SegmentMatch::None,
                },
            };
            if enter_r > exit_r + EPSILON {
                return SegmentMatch::None;
            }
            let t_enter = a.t + ((b.t - a.t) as f64 * enter_r).round() as i64;
            let t_exit = a.t + ((b.t - a.t) as f64 * exit_r).round() as i64;
            if t_enter == t_exit {
                SegmentMatch::Point(t_enter)
            } else {
                SegmentMatch::Range(t_enter, t_exit, true, true)
            }
        }
    }
}

/// Clips `t` down to exactly the time covered by `keep`, collapsing to the
/// narrowest subtype the result permits.
fn clip_to_periods(t: &Temporal, keep: Option<&PeriodSet>) -> TemporalResult<Option<Temporal>> {
    let keep = match keep {
        None => return Ok(None),
        Some(k) => k,
    };
    match t {
        Temporal::Instant(i) => {
            if keep.contains_timestamp(i.t) {
                Ok(Some(Temporal::Instant(i.clone())))
            } else {
                Ok(None)
            }
        }
        Temporal::InstantSet(s) => {
            let kept: Vec<Instant> = s.instants.iter().filter(|i| keep.contains_timestamp(i.t)).cloned().collect();
            collapse_instants(s.base_type, s.flags, kept)
        }
        Temporal::Sequence(seq) => {
            let mut clipped = Vec::new();
            for p in keep.periods() {
                if let Some(sub) = clip_sequence_to_period(seq, p) {
                    clipped.push(sub);
                }
            }
            collapse_sequences(seq.base_type, seq.flags, clipped)
        }
        Temporal::SequenceSet(set) => {
            let mut clipped = Vec::new();
            for seq in &set.sequences {
                for p in keep.periods() {
                    if let Some(sub) = clip_sequence_to_period(seq, p) {
                        clipped.push(sub);
                    }
                }
            }
            collapse_sequences(set.base_type, set.flags, clipped)
        }
    }
}

fn clip_sequence_to_period(seq: &Sequence, period: &Period) -> Option<Sequence> {
    let overlap = seq.period.intersection(period)?;
    let mut instants: Vec<Instant> = seq
        .instants
        .iter()
        .filter(|i| {
            let above_lo = i.t > overlap.lower || (i.t == overlap.lower && overlap.lower_inc);
            let below_hi = i.t < overlap.upper || (i.t == overlap.upper && overlap.upper_inc);
            above_lo && below_hi
        })
        .cloned()
        .collect();

    if overlap.lower_inc && !instants.iter().any(|i| i.t == overlap.lower) {
        let value = seq.value_at(overlap.lower)?;
        instants.insert(0, Instant::new(overlap.lower, value));
    }
    if overlap.upper_inc && !instants.iter().any(|i| i.t == overlap.upper) {
        let value = seq.value_at(overlap.upper)?;
        instants.push(Instant::new(overlap.upper, value));
    }
    if instants.is_empty() {
        return None;
    }
    Sequence::new(seq.base_type, seq.flags, instants, overlap.lower_inc, overlap.upper_inc).ok()
}

fn collapse_instants(
    base_type: tempo_value::BaseType,
    flags: crate::header::Flags,
    instants: Vec<Instant>,
) -> TemporalResult<Option<Temporal>> {
    match instants.len() {
        0 => Ok(None),
        1 => Ok(Some(Temporal::Instant(instants.into_iter().next().expect("len 1")))),
        _ => Ok(Some(Temporal::InstantSet(InstantSet::new(base_type, flags, instants)?))),
    }
}

fn collapse_sequences(
    base_type: tempo_value::BaseType,
    flags: crate::header::Flags,
    sequences: Vec<Sequence>,
) -> TemporalResult<Option<Temporal>> {
    match sequences.len() {
        0 => Ok(None),
        1 => {
            let seq = sequences.into_iter().next().expect("len 1");
            if seq.is_instant() {
                let instant = seq.instants.into_iter().next().expect("instantaneous sequence has one instant");
                Ok(Some(Temporal::Instant(instant)))
            } else {
                Ok(Some(Temporal::Sequence(seq)))
            }
        }
        _ => Ok(Some(Temporal::SequenceSet(SequenceSet::new(base_type, flags, sequences)?))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Flags;
    use tempo_value::BaseType;

    fn i(t: i64, v: i32) -> Instant {
        Instant::new(t, BaseValue::Int(v))
    }

    #[test]
    fn restrict_step_int_sequence_at_value() {
        let instants = vec![i(0, 1), i(10, 5), i(20, 5), i(30, 9)];
        let seq = Sequence::new(BaseType::Int, Flags::step(), instants, true, true).unwrap();
        let t = Temporal::Sequence(seq);
        let result = restrict_value(&t, &BaseValue::Int(5), Mode::At).unwrap().unwrap();
        match result {
            Temporal::Sequence(s) => {
                assert_eq!(s.period.lower, 10);
                assert_eq!(s.period.upper, 30);
                assert!(!s.period.upper_inc);
            }
            other => panic!("expected a Sequence, got {other:?}"),
        }
    }

    #[test]
    fn restrict_minus_removes_matching_subrange() {
        let instants = vec![i(0, 1), i(10, 5), i(20, 5), i(30, 9)];
        let seq = Sequence::new(BaseType::Int, Flags::step(), instants, true, true).unwrap();
        let t = Temporal::Sequence(seq);
        let result = restrict_value(&t, &BaseValue::Int(5), Mode::Minus).unwrap().unwrap();
        match result {
            Temporal::SequenceSet(s) => assert_eq!(s.num_sequences(), 2),
            other => panic!("expected a SequenceSet, got {other:?}"),
        }
    }

    #[test]
    fn restrict_period_clips_linear_sequence() {
        let instants = vec![Instant::new(0, BaseValue::Float(0.0)), Instant::new(100, BaseValue::Float(10.0))];
        let seq = Sequence::new(BaseType::Float, Flags::linear(), instants, true, true).unwrap();
        let t = Temporal::Sequence(seq);
        let period = Period::new(25, 75, true, true).unwrap();
        let result = restrict_period(&t, &period, Mode::At).unwrap().unwrap();
        match result {
            Temporal::Sequence(s) => {
                assert_eq!(s.value_at(25), Some(BaseValue::Float(2.5)));
                assert_eq!(s.value_at(75), Some(BaseValue::Float(7.5)));
            }
            other => panic!("expected a Sequence, got {other:?}"),
        }
    }

    #[test]
    fn restrict_timestamp_outside_domain_is_none() {
        let t = Temporal::Instant(i(5, 1));
        assert_eq!(restrict_timestamp(&t, 6, Mode::At).unwrap(), None);
    }

    #[test]
    fn restrict_ranges_unions_disjoint_windows() {
        // windows [0,2] and [8,16] together match instants at t=0 (v=1) and
        // t=20/t=30 (v=9, v=15), but not the t=10 instant (v=5) in between.
        let instants = vec![i(0, 1), i(10, 5), i(20, 9), i(30, 15)];
        let set = InstantSet::new(BaseType::Int, Flags::step(), instants).unwrap();
        let t = Temporal::InstantSet(set);
        let lo1 = BaseValue::Int(0);
        let hi1 = BaseValue::Int(2);
        let lo2 = BaseValue::Int(8);
        let hi2 = BaseValue::Int(16);
        let windows = vec![
            ValueWindow { lo: Some(&lo1), hi: Some(&hi1), lo_inc: true, hi_inc: true },
            ValueWindow { lo: Some(&lo2), hi: Some(&hi2), lo_inc: true, hi_inc: true },
        ];
        let result = restrict_ranges(&t, &windows, Mode::At).unwrap().unwrap();
        match result {
            Temporal::InstantSet(s) => {
                let kept: Vec<i64> = s.instants.iter().map(|i| i.t).collect();
                assert_eq!(kept, vec![0, 20, 30]);
            }
            other => panic!("expected an InstantSet, got {other:?}"),
        }
    }

    #[test]
    fn restrict_ranges_minus_removes_union_of_windows() {
        // minus the same two windows leaves only the t=10 instant (v=5).
        let instants = vec![i(0, 1), i(10, 5), i(20, 9), i(30, 15)];
        let set = InstantSet::new(BaseType::Int, Flags::step(), instants).unwrap();
        let t = Temporal::InstantSet(set);
        let lo1 = BaseValue::Int(0);
        let hi1 = BaseValue::Int(2);
        let lo2 = BaseValue::Int(8);
        let hi2 = BaseValue::Int(16);
        let windows = vec![
            ValueWindow { lo: Some(&lo1), hi: Some(&hi1), lo_inc: true, hi_inc: true },
            ValueWindow { lo: Some(&lo2), hi: Some(&hi2), lo_inc: true, hi_inc: true },
        ];
        let result = restrict_ranges(&t, &windows, Mode::Minus).unwrap().unwrap();
        match result {
            Temporal::Instant(inst) => assert_eq!(inst.t, 10),
            other => panic!("expected an Instant, got {other:?}"),
        }
    }
}

use tempo_value::{BaseValue, EPSILON};

use crate::header::{Flags, Interpolation};
use crate::instant::Instant;
use crate::sequence::Sequence;

/// Drops redundant interior instants (§3.4). The sweep compares each
/// candidate against the last *kept* instant (not necessarily the original
/// predecessor), so a run of several redundant points collapses in one pass.
pub fn normalize_sequence(instants: &[Instant], interp: Interpolation, geodetic: bool) -> Vec<Instant> {
    if instants.len() < 3 {
        return instants.to_vec();
    }
    let mut out: Vec<Instant> = Vec::with_capacity(instants.len());
    out.push(instants[0].clone());
    for k in 1..instants.len() - 1 {
        let prev = out.last().expect("seeded with first instant");
        let cur = &instants[k];
        let next = &instants[k + 1];
        let redundant = is_redundant(prev, cur, next, interp, geodetic);
        if !redundant {
            out.push(cur.clone());
        }
    }
    out.push(instants.last().expect("checked len >= 3").clone());
    out
}

/// Merges time-adjacent sequences whose shared boundary carries the same
/// value (§3.4). Mismatched inclusivity at the touching bound (both sides
/// inclusive, or both exclusive) blocks the merge rather than silently
/// picking one — callers that hit this keep the sequences distinct.
pub fn normalize_sequence_set(mut sequences: Vec<Sequence>) -> Vec<Sequence> {
    sequences.sort_by(|a, b| a.period.cmp_bounds(&b.period));
    let mut merged: Vec<Sequence> = Vec::with_capacity(sequences.len());
    for seq in sequences {
        let should_merge = merged.last().is_some_and(|last: &Sequence| can_merge(last, &seq));
        if should_merge {
            let last = merged.pop().expect("checked Some above");
            merged.push(merge_adjacent(&last, &seq));
        } else {
            merged.push(seq);
        }
    }
    merged
}

fn can_merge(a: &Sequence, b: &Sequence) -> bool {
    if a.flags.interp != b.flags.interp || !a.period.adjacent(&b.period) {
        return false;
    }
    let exactly_one_inclusive = a.period.upper_inc != b.period.lower_inc;
    if !exactly_one_inclusive {
        return false;
    }
    let last = a.instants.last().expect("sequence is non-empty");
    let first = b.instants.first().expect("sequence is non-empty");
    match a.flags.interp {
        Interpolation::Step => last.value.eq_value(&first.value),
        Interpolation::Linear => last.value.approx_eq(&first.value, EPSILON),
    }
}

fn merge_adjacent(a: &Sequence, b: &Sequence) -> Sequence {
    let mut instants = a.instants.clone();
    instants.extend(b.instants.iter().skip(1).cloned());
    let flags: Flags = a.flags;
    Sequence::new(a.base_type, flags, instants, a.period.lower_inc, b.period.upper_inc)
        .expect("merging two valid adjacent sequences yields a valid sequence")
}

fn is_redundant(prev: &Instant, cur: &Instant, next: &Instant, interp: Interpolation, geodetic: bool) -> bool {
    match interp {
        Interpolation::Step => prev.value.eq_value(&cur.value),
        Interpolation::Linear => {
            (prev.value.eq_value(&cur.value) && cur.value.eq_value(&next.value))
                || BaseValue::collinear(&prev.value, prev.t, &cur.value, cur.t, &next.value, next.t, EPSILON, geodetic)
        }
    }
}

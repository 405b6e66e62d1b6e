use rand::RngCore;

use tempo_core::{Flags, Instant, Sequence, SequenceSet, Temporal};
use tempo_skiplist::{SkipList, Spliceable};
use tempo_time::{Period, Timestamp};
use tempo_value::{BaseType, BaseValue, TemporalResult};

/// A skiplist element for `t-count`: a period holding a step-interpolated
/// integer count over its span, recorded as the timestamps where the count
/// changes. Two overlapping elements combine by adding their counts
/// (§4.10) rather than by the generic synchronize/lift machinery, since
/// the combine is always addition — a coordinate-compressed interval sum
/// is both simpler and sufficient.
///
/// A group's own `period` bounds are structural: they always coincide with
/// one of the original contributing elements' own bounds. A count change
/// that happens only because *another* element starts or ends strictly
/// inside this span shows up as an extra entry in `points`, not as a new
/// element — only a point where some contributing element's own span ends
/// forces a new one (see `merge_count_elems`).
#[derive(Clone, Debug, PartialEq)]
struct CountElem {
    period: Period,
    points: Vec<(Timestamp, i32)>,
}

impl CountElem {
    fn value_at(&self, t: Timestamp) -> i32 {
        self.points.iter().rev().find(|(pt, _)| *pt <= t).map(|(_, v)| *v).unwrap_or(0)
    }
}

impl Spliceable for CountElem {
    fn time_span(&self) -> Period {
        self.period
    }
}

/// Running state for `t-count`: each input timestamp contributes an
/// instant of value 1, each input period a step run of value 1 over its
/// span, and overlapping contributions add.
pub struct TCountState {
    list: Option<SkipList<CountElem>>,
}

impl Default for TCountState {
    fn default() -> Self {
        Self::new()
    }
}

impl TCountState {
    pub fn new() -> Self {
        TCountState { list: None }
    }

    pub fn add_timestamp(&mut self, t: Timestamp, rng: &mut impl RngCore) -> TemporalResult<()> {
        self.splice_one(CountElem { period: Period::instant(t), points: vec![(t, 1)] }, rng)
    }

    pub fn add_period(&mut self, p: Period, rng: &mut impl RngCore) -> TemporalResult<()> {
        let points = if p.is_instant() { vec![(p.lower, 1)] } else { vec![(p.lower, 1), (p.upper, 1)] };
        self.splice_one(CountElem { period: p, points }, rng)
    }

    fn splice_one(&mut self, e: CountElem, rng: &mut impl RngCore) -> TemporalResult<()> {
        match &mut self.list {
            None => {
                self.list = Some(SkipList::new(vec![e])?);
                Ok(())
            }
            Some(list) => list.splice(vec![e], merge_count_elems, rng),
        }
    }

    pub fn combine(&mut self, other: Self, rng: &mut impl RngCore) -> TemporalResult<()> {
        if let Some(other_list) = other.list {
            let values = other_list.values();
            match &mut self.list {
                None => self.list = Some(SkipList::new(values)?),
                Some(list) => list.splice(values, merge_count_elems, rng)?,
            }
        }
        Ok(())
    }

    pub fn finalize(&self) -> TemporalResult<Option<Temporal>> {
        let list = match &self.list {
            Some(l) => l,
            None => return Ok(None),
        };
        let elems = list.values();
        let mut sequences = Vec::with_capacity(elems.len());
        for e in &elems {
            let instants: Vec<Instant> = e.points.iter().map(|(t, v)| Instant::new(*t, BaseValue::Int(*v))).collect();
            sequences.push(Sequence::new(BaseType::Int, Flags::step(), instants, e.period.lower_inc, e.period.upper_inc)?);
        }
        Ok(Some(collapse(sequences)?))
    }
}

fn collapse(sequences: Vec<Sequence>) -> TemporalResult<Temporal> {
    if sequences.len() == 1 {
        let seq = sequences.into_iter().next().expect("len 1");
        return if seq.is_instant() {
            Ok(Temporal::Instant(seq.instants.into_iter().next().expect("instantaneous sequence has one instant")))
        } else {
            Ok(Temporal::Sequence(seq))
        };
    }
    Ok(Temporal::SequenceSet(SequenceSet::new(BaseType::Int, Flags::step(), sequences)?))
}

/// Coordinate-compresses `spliced ∪ incoming` into elementary disjoint
/// pieces (each either a single point or an open span between two
/// consecutive breakpoints) and sums the covering elements' values on each
/// piece, dropping zero-sum gaps. Adjacent nonzero pieces are then folded
/// back into elements: a new element starts only where some contributing
/// period's own span genuinely ends (its upper bound) — a count change
/// caused by another period merely starting mid-span becomes an extra
/// instant inside the still-open element instead of a new one.
fn merge_count_elems(spliced: Vec<CountElem>, incoming: Vec<CountElem>) -> TemporalResult<Vec<CountElem>> {
    let all: Vec<CountElem> = spliced.into_iter().chain(incoming).collect();
    if all.is_empty() {
        return Ok(all);
    }

    let mut points: Vec<Timestamp> = all.iter().flat_map(|e| [e.period.lower, e.period.upper]).collect();
    points.sort_unstable();
    points.dedup();

    let mut pieces: Vec<Period> = Vec::with_capacity(points.len() * 2);
    for w in points.windows(2) {
        pieces.push(Period::instant(w[0]));
        pieces.push(Period::new(w[0], w[1], false, false).expect("distinct sorted breakpoints"));
    }
    pieces.push(Period::instant(*points.last().expect("non-empty")));

    let valued: Vec<(Period, i32)> = pieces
        .into_iter()
        .filter_map(|piece| {
            let sum: i32 = all.iter().filter(|e| e.period.overlaps(&piece)).map(|e| e.value_at(piece.lower)).sum();
            (sum != 0).then_some((piece, sum))
        })
        .collect();

    let mut runs: Vec<CountElem> = Vec::with_capacity(valued.len());
    for (i, (piece, value)) in valued.iter().enumerate() {
        let starts_new_group = match if i == 0 { None } else { valued.get(i - 1) } {
            None => true,
            Some((prev, _)) => {
                if prev.upper != piece.lower {
                    true
                } else {
                    // Split only if some element's own span genuinely ends at
                    // this boundary (it covers `prev` but not `piece`) —
                    // a period merely starting here does not count.
                    all.iter().any(|e| e.period.upper == prev.upper && e.period.overlaps(prev) && !e.period.overlaps(piece))
                }
            }
        };
        if starts_new_group {
            runs.push(CountElem { period: *piece, points: vec![(piece.lower, *value)] });
            continue;
        }
        let last = runs.last_mut().expect("a continuing group always has a prior element");
        last.period = Period::new(last.period.lower, piece.upper, last.period.lower_inc, piece.upper_inc)?;
        if last.points.last().map(|(_, v)| v) != Some(value) {
            last.points.push((piece.lower, *value));
        }
    }

    for run in &mut runs {
        if run.points.last().map(|(t, _)| *t) != Some(run.period.upper) {
            let last_value = run.points.last().expect("every group has at least one point").1;
            run.points.push((run.period.upper, last_value));
        }
    }
    Ok(runs)
}

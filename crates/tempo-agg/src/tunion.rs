use rand::RngCore;

use tempo_skiplist::{SkipList, Spliceable};
use tempo_time::{Period, PeriodSet, Timestamp, TimestampSet};
use tempo_value::TemporalResult;

/// A skiplist element for `t-union`: just the period a sample or period
/// input covers. No value is carried — §4.10 specifies the combine
/// function as null, since `t-union` only tracks which instants are
/// covered, not what was observed there.
#[derive(Clone, Debug, PartialEq)]
struct Mark(Period);

impl Spliceable for Mark {
    fn time_span(&self) -> Period {
        self.0
    }
}

/// The shape `finalize` collapses to, decided by whether every input this
/// state ever saw was a bare timestamp (`Timestamps`) or at least one was a
/// genuine period (`Periods`) — mirroring the precondition that a skiplist's
/// elements must share one kind.
#[derive(Debug, Clone, PartialEq)]
pub enum TUnionResult {
    Timestamps(TimestampSet),
    Periods(PeriodSet),
}

/// Running state for `t-union`: the set union of every timestamp/period
/// fed in so far, normalized via the same merge `PeriodSet` already uses
/// for overlapping-or-touching-inclusive periods (§3.2).
pub struct TUnionState {
    list: Option<SkipList<Mark>>,
    all_instants: bool,
}

impl Default for TUnionState {
    fn default() -> Self {
        Self::new()
    }
}

impl TUnionState {
    pub fn new() -> Self {
        TUnionState { list: None, all_instants: true }
    }

    pub fn add_timestamp(&mut self, t: Timestamp, rng: &mut impl RngCore) -> TemporalResult<()> {
        self.splice_one(Mark(Period::instant(t)), rng)
    }

    pub fn add_period(&mut self, p: Period, rng: &mut impl RngCore) -> TemporalResult<()> {
        self.all_instants = false;
        self.splice_one(Mark(p), rng)
    }

    fn splice_one(&mut self, m: Mark, rng: &mut impl RngCore) -> TemporalResult<()> {
        match &mut self.list {
            None => {
                self.list = Some(SkipList::new(vec![m])?);
                Ok(())
            }
            Some(list) => list.splice(vec![m], merge_marks, rng),
        }
    }

    /// Merges another partial state into this one, e.g. combining two
    /// workers' partial aggregates before a final `finalize`.
    pub fn combine(&mut self, other: Self, rng: &mut impl RngCore) -> TemporalResult<()> {
        self.all_instants = self.all_instants && other.all_instants;
        if let Some(other_list) = other.list {
            let values = other_list.values();
            match &mut self.list {
                None => self.list = Some(SkipList::new(values)?),
                Some(list) => list.splice(values, merge_marks, rng)?,
            }
        }
        Ok(())
    }

    pub fn finalize(&self) -> TemporalResult<Option<TUnionResult>> {
        let list = match &self.list {
            Some(l) => l,
            None => return Ok(None),
        };
        let marks = list.values();
        if self.all_instants {
            let timestamps = marks.iter().map(|m| m.0.lower).collect();
            Ok(Some(TUnionResult::Timestamps(TimestampSet::new(timestamps)?)))
        } else {
            let periods = marks.iter().map(|m| m.0).collect();
            Ok(Some(TUnionResult::Periods(PeriodSet::new(periods)?)))
        }
    }
}

fn merge_marks(spliced: Vec<Mark>, incoming: Vec<Mark>) -> TemporalResult<Vec<Mark>> {
    let periods: Vec<Period> = spliced.iter().chain(incoming.iter()).map(|m| m.0).collect();
    let merged = PeriodSet::new(periods)?;
    Ok(merged.periods().iter().map(|p| Mark(*p)).collect())
}

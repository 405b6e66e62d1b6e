use serde::{Deserialize, Serialize};
use tempo_box::{STBox, TBox};
use tempo_time::{Period, PeriodSet};
use tempo_value::BaseType;

use crate::header::{BoundingBox, Flags};
use crate::instant::Instant;
use crate::instant_set::InstantSet;
use crate::sequence::Sequence;
use crate::sequence_set::SequenceSet;

/// The one type every public operation in this crate accepts and returns.
/// Dispatch is a `match` on the variant rather than a trait object — there
/// are exactly four shapes, and keeping them as a closed enum is what lets
/// restriction/synchronization collapse results to the narrowest subtype
/// instead of always returning the widest one (§9).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Temporal {
    Instant(Instant),
    InstantSet(InstantSet),
    Sequence(Sequence),
    SequenceSet(SequenceSet),
}

impl Temporal {
    pub fn base_type(&self) -> BaseType {
        match self {
            Temporal::Instant(i) => i.value.base_type(),
            Temporal::InstantSet(s) => s.base_type,
            Temporal::Sequence(s) => s.base_type,
            Temporal::SequenceSet(s) => s.base_type,
        }
    }

    pub fn flags(&self) -> Option<Flags> {
        match self {
            Temporal::Instant(_) => None,
            Temporal::InstantSet(s) => Some(s.flags),
            Temporal::Sequence(s) => Some(s.flags),
            Temporal::SequenceSet(s) => Some(s.flags),
        }
    }

    /// Every instant this value carries, in ascending time order.
    pub fn instants(&self) -> Vec<&Instant> {
        match self {
            Temporal::Instant(i) => vec![i],
            Temporal::InstantSet(s) => s.instants.iter().collect(),
            Temporal::Sequence(s) => s.instants.iter().collect(),
            Temporal::SequenceSet(s) => s.sequences.iter().flat_map(|seq| seq.instants.iter()).collect(),
        }
    }

    pub fn period(&self) -> Period {
        match self {
            Temporal::Instant(i) => i.period(),
            Temporal::InstantSet(s) => s.instants.first().expect("non-empty").period().super_union(
                &s.instants.last().expect("non-empty").period(),
            ),
            Temporal::Sequence(s) => s.period,
            Temporal::SequenceSet(s) => {
                let first = s.sequences.first().expect("non-empty").period;
                let last = s.sequences.last().expect("non-empty").period;
                first.super_union(&last)
            }
        }
    }

    /// The set of periods actually covered by this value — a single instant
    /// for `Instant`, a run of degenerate instants for `InstantSet`, and the
    /// natural period set otherwise.
    pub fn time_span(&self) -> PeriodSet {
        match self {
            Temporal::Instant(i) => PeriodSet::new(vec![i.period()]).expect("single period"),
            Temporal::InstantSet(s) => {
                PeriodSet::new(s.instants.iter().map(Instant::period).collect()).expect("instant set is non-empty")
            }
            Temporal::Sequence(s) => PeriodSet::new(vec![s.period]).expect("single period"),
            Temporal::SequenceSet(s) => s.span(),
        }
    }

    pub fn bbox(&self) -> BoundingBox {
        match self {
            Temporal::Instant(i) => instant_bbox(i),
            Temporal::InstantSet(s) => s.bbox.clone(),
            Temporal::Sequence(s) => s.bbox.clone(),
            Temporal::SequenceSet(s) => s.bbox.clone(),
        }
    }

    pub fn is_temporally_continuous(&self) -> bool {
        matches!(self, Temporal::Sequence(_) | Temporal::SequenceSet(_))
    }

    /// Value held at `t`, if the value is defined there. `InstantSet` and
    /// discrete subtypes only answer at exact sample points; `Sequence`
    /// interpolates.
    pub fn value_at(&self, t: tempo_time::Timestamp) -> Option<tempo_value::BaseValue> {
        match self {
            Temporal::Instant(i) => (i.t == t).then(|| i.value.clone()),
            Temporal::InstantSet(s) => s
                .instants
                .binary_search_by_key(&t, |i| i.t)
                .ok()
                .map(|idx| s.instants[idx].value.clone()),
            Temporal::Sequence(s) => s.value_at(t),
            Temporal::SequenceSet(s) => s.sequences.iter().find(|seq| seq.period.contains_timestamp(t)).and_then(|seq| seq.value_at(t)),
        }
    }
}

fn instant_bbox(i: &Instant) -> BoundingBox {
    match &i.value {
        tempo_value::BaseValue::Point(p) => BoundingBox::Spatial(STBox {
            x: Some(tempo_box::ValueRange::singleton(p.x)),
            y: Some(tempo_box::ValueRange::singleton(p.y)),
            z: p.z.map(tempo_box::ValueRange::singleton),
            time_period: Some(i.period()),
            srid: None,
            geodetic: false,
        }),
        tempo_value::BaseValue::Int(v) => {
            BoundingBox::Scalar(TBox::new(Some(tempo_box::ValueRange::singleton(*v as f64)), Some(i.period())))
        }
        tempo_value::BaseValue::Float(v) => {
            BoundingBox::Scalar(TBox::new(Some(tempo_box::ValueRange::singleton(*v)), Some(i.period())))
        }
        _ => BoundingBox::Scalar(TBox::time_only(i.period())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempo_value::BaseValue;

    #[test]
    fn instant_period_is_degenerate() {
        let t = Temporal::Instant(Instant::new(5, BaseValue::Int(1)));
        assert!(t.period().is_instant());
    }

    #[test]
    fn value_at_on_instant_set_requires_exact_hit() {
        let set = InstantSet::new(
            BaseType::Int,
            Flags::step(),
            vec![Instant::new(0, BaseValue::Int(1)), Instant::new(10, BaseValue::Int(2))],
        )
        .unwrap();
        let t = Temporal::InstantSet(set);
        assert_eq!(t.value_at(10), Some(BaseValue::Int(2)));
        assert_eq!(t.value_at(5), None);
    }
}

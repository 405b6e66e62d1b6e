use serde::{Deserialize, Serialize};
use tempo_value::{BaseType, TemporalError, TemporalResult};

use crate::header::{BoundingBox, Flags};
use crate::instant::Instant;
use crate::instant_set::InstantSet;
use crate::sequence::Sequence;
use crate::sequence_set::SequenceSet;
use crate::temporal::Temporal;

/// Mirrors the `{subtype_tag, base_type_tag, flags, count, bounding_box?,
/// payload}` layout described in §6.1 for the three single-period subtypes.
/// `bincode` handles the actual byte packing and supplies the subtype tag
/// itself (as the enclosing `Wire` enum's variant discriminant) — this
/// struct only fixes field order and presence rules per subtype.
#[derive(Debug, Serialize, Deserialize)]
struct WireEnvelope {
    base_type_tag: BaseType,
    flags: Option<Flags>,
    count: i32,
    bounding_box: Option<BoundingBox>,
    lower_inc: bool,
    upper_inc: bool,
    instants: Vec<Instant>,
}

/// A sequence set carries several period boundaries, so it is wrapped as a
/// vector of single-sequence envelopes rather than forced into the
/// fixed-shape `WireEnvelope`.
#[derive(Debug, Serialize, Deserialize)]
struct WireSequenceSet {
    base_type_tag: BaseType,
    flags: Flags,
    sequences: Vec<WireEnvelope>,
}

#[derive(Debug, Serialize, Deserialize)]
enum Wire {
    Instant(WireEnvelope),
    InstantSet(WireEnvelope),
    Sequence(WireEnvelope),
    SequenceSet(WireSequenceSet),
}

pub fn to_wire(value: &Temporal) -> TemporalResult<Vec<u8>> {
    let wire = match value {
        Temporal::Instant(i) => Wire::Instant(WireEnvelope {
            base_type_tag: i.value.base_type(),
            flags: None,
            count: 1,
            bounding_box: None,
            lower_inc: true,
            upper_inc: true,
            instants: vec![i.clone()],
        }),
        Temporal::InstantSet(s) => Wire::InstantSet(WireEnvelope {
            base_type_tag: s.base_type,
            flags: Some(s.flags),
            count: s.instants.len() as i32,
            bounding_box: Some(s.bbox.clone()),
            lower_inc: true,
            upper_inc: true,
            instants: s.instants.clone(),
        }),
        Temporal::Sequence(s) => Wire::Sequence(sequence_envelope(s)),
        Temporal::SequenceSet(set) => Wire::SequenceSet(WireSequenceSet {
            base_type_tag: set.base_type,
            flags: set.flags,
            sequences: set.sequences.iter().map(sequence_envelope).collect(),
        }),
    };
    bincode::serialize(&wire).map_err(|_| TemporalError::InvalidArgument("failed to serialize temporal value"))
}

fn sequence_envelope(s: &Sequence) -> WireEnvelope {
    WireEnvelope {
        base_type_tag: s.base_type,
        flags: Some(s.flags),
        count: s.instants.len() as i32,
        bounding_box: Some(s.bbox.clone()),
        lower_inc: s.period.lower_inc,
        upper_inc: s.period.upper_inc,
        instants: s.instants.clone(),
    }
}

pub fn from_wire(bytes: &[u8]) -> TemporalResult<Temporal> {
    if bytes.is_empty() {
        return Err(TemporalError::InvalidArgument("empty wire payload"));
    }
    let wire: Wire = bincode::deserialize(bytes).map_err(|_| TemporalError::InvalidArgument("failed to deserialize temporal value"))?;
    match wire {
        Wire::Instant(e) => {
            let instant = e.instants.into_iter().next().ok_or(TemporalError::InvalidArgument("instant wire form is empty"))?;
            Ok(Temporal::Instant(instant))
        }
        Wire::InstantSet(e) => {
            let flags = e.flags.ok_or(TemporalError::InvalidArgument("instant set wire form missing flags"))?;
            Ok(Temporal::InstantSet(InstantSet::new(e.base_type_tag, flags, e.instants)?))
        }
        Wire::Sequence(e) => {
            let flags = e.flags.ok_or(TemporalError::InvalidArgument("sequence wire form missing flags"))?;
            Ok(Temporal::Sequence(Sequence::new(e.base_type_tag, flags, e.instants, e.lower_inc, e.upper_inc)?))
        }
        Wire::SequenceSet(w) => {
            let sequences: Vec<Sequence> = w
                .sequences
                .into_iter()
                .map(|e| {
                    let flags = e.flags.unwrap_or(w.flags);
                    Sequence::new(e.base_type_tag, flags, e.instants, e.lower_inc, e.upper_inc)
                })
                .collect::<TemporalResult<_>>()?;
            Ok(Temporal::SequenceSet(SequenceSet::new(w.base_type_tag, w.flags, sequences)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Flags;
    use tempo_value::{BaseType, BaseValue};

    #[test]
    fn instant_roundtrips() {
        let t = Temporal::Instant(Instant::new(5, BaseValue::Int(42)));
        let bytes = to_wire(&t).unwrap();
        assert_eq!(from_wire(&bytes).unwrap(), t);
    }

    #[test]
    fn sequence_roundtrips() {
        let instants = vec![Instant::new(0, BaseValue::Float(1.0)), Instant::new(10, BaseValue::Float(2.0))];
        let t = Temporal::Sequence(Sequence::new(BaseType::Float, Flags::linear(), instants, true, true).unwrap());
        let bytes = to_wire(&t).unwrap();
        assert_eq!(from_wire(&bytes).unwrap(), t);
    }

    #[test]
    fn sequence_set_roundtrips() {
        let a = Sequence::new(
            BaseType::Float,
            Flags::linear(),
            vec![Instant::new(0, BaseValue::Float(0.0)), Instant::new(10, BaseValue::Float(1.0))],
            true,
            true,
        )
        .unwrap();
        let b = Sequence::new(
            BaseType::Float,
            Flags::linear(),
            vec![Instant::new(20, BaseValue::Float(2.0)), Instant::new(30, BaseValue::Float(3.0))],
            true,
            true,
        )
        .unwrap();
        let t = Temporal::SequenceSet(SequenceSet::new(BaseType::Float, Flags::linear(), vec![a, b]).unwrap());
        let bytes = to_wire(&t).unwrap();
        assert_eq!(from_wire(&bytes).unwrap(), t);
    }

    #[test]
    fn empty_payload_is_rejected() {
        assert!(from_wire(&[]).is_err());
    }
}

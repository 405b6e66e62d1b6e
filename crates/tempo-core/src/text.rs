use std::fmt;

use tempo_time::Timestamp;
use tempo_value::{BaseType, BaseValue, TemporalError};

use crate::header::{Flags, Interpolation};
use crate::instant::Instant;
use crate::instant_set::InstantSet;
use crate::sequence::Sequence;
use crate::sequence_set::SequenceSet;
use crate::temporal::Temporal;

const STEPWISE_TOKEN: &str = "Interp=Stepwise;";

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.value, self.t)
    }
}

impl fmt::Display for InstantSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (k, i) in self.instants.iter().enumerate() {
            if k > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{i}")?;
        }
        write!(f, "}}")
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.flags.interp == Interpolation::Step {
            write!(f, "{STEPWISE_TOKEN}")?;
        }
        write!(f, "{}", if self.period.lower_inc { "[" } else { "(" })?;
        for (k, i) in self.instants.iter().enumerate() {
            if k > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{i}")?;
        }
        write!(f, "{}", if self.period.upper_inc { "]" } else { ")" })
    }
}

impl fmt::Display for SequenceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.flags.interp == Interpolation::Step {
            write!(f, "{STEPWISE_TOKEN}")?;
        }
        write!(f, "{{")?;
        for (k, s) in self.sequences.iter().enumerate() {
            if k > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", if s.period.lower_inc { "[" } else { "(" })?;
            for (j, i) in s.instants.iter().enumerate() {
                if j > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{i}")?;
            }
            write!(f, "{}", if s.period.upper_inc { "]" } else { ")" })?;
        }
        write!(f, "}}")
    }
}

impl fmt::Display for Temporal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Temporal::Instant(i) => write!(f, "{i}"),
            Temporal::InstantSet(s) => write!(f, "{s}"),
            Temporal::Sequence(s) => write!(f, "{s}"),
            Temporal::SequenceSet(s) => write!(f, "{s}"),
        }
    }
}

fn parse_instant(base_type: BaseType, s: &str) -> Result<Instant, TemporalError> {
    let (value_str, t_str) = s.rsplit_once('@').ok_or(TemporalError::InvalidArgument("instant missing '@timestamp'"))?;
    let value = BaseValue::parse(base_type, value_str.trim()).ok_or(TemporalError::InvalidArgument("unparsable base value"))?;
    let t: Timestamp = t_str.trim().parse().map_err(|_| TemporalError::InvalidArgument("unparsable timestamp"))?;
    Ok(Instant::new(t, value))
}

/// Splits a comma-separated list on its top-level commas only, treating any
/// of `[`, `(` as opening a nested group and `]`, `)` as closing one — used
/// both for a sequence set's `[..], [..]` members and an instant set's plain
/// `v@t, v@t` members (where no nesting occurs, so this degrades to a plain
/// split).
fn split_top_level(s: &str) -> Vec<String> {
    let mut depth: i32 = 0;
    let mut parts = Vec::new();
    let mut current = String::new();
    for c in s.chars() {
        match c {
            '[' | '(' => {
                depth += 1;
                current.push(c);
            }
            ']' | ')' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current = String::new();
            }
            c => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

/// Parses a temporal value's text form (§6.1) given its base type, which
/// cannot be recovered from the text alone (e.g. `5@100` is ambiguous
/// between int and float without knowing the column's declared type).
pub fn parse_temporal(base_type: BaseType, input: &str) -> Result<Temporal, TemporalError> {
    let mut s = input.trim();
    let mut interp = Interpolation::Step;
    if let Some(rest) = s.strip_prefix(STEPWISE_TOKEN) {
        interp = Interpolation::Step;
        s = rest.trim();
    } else if base_type.is_interpolable() {
        interp = Interpolation::Linear;
    }

    if s.starts_with('{') {
        // Could be an instant set `{v@t, ...}` or a sequence set `{[..], [..]}`.
        // Disambiguate by checking whether the first top-level member itself
        // opens with a bound bracket.
        let inner = s.strip_prefix('{').and_then(|r| r.strip_suffix('}')).ok_or(TemporalError::InvalidArgument("unbalanced braces"))?;
        let first_member = inner.trim_start();
        if first_member.starts_with('[') || first_member.starts_with('(') {
            let flags = Flags { interp, has_z: false, is_geodetic: false };
            let sequences = split_top_level(inner)
                .into_iter()
                .map(|piece| parse_sequence(base_type, flags, &piece))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Temporal::SequenceSet(SequenceSet::new(base_type, flags, sequences)?));
        }
    }

    if let Some(inner) = s.strip_prefix('{').and_then(|r| r.strip_suffix('}')) {
        let flags = Flags { interp: Interpolation::Step, has_z: false, is_geodetic: false };
        let instants = split_top_level(inner).into_iter().map(|part| parse_instant(base_type, &part)).collect::<Result<Vec<_>, _>>()?;
        return Ok(Temporal::InstantSet(InstantSet::new(base_type, flags, instants)?));
    }

    if s.starts_with('[') || s.starts_with('(') {
        let flags = Flags { interp, has_z: false, is_geodetic: false };
        return Ok(Temporal::Sequence(parse_sequence(base_type, flags, s)?));
    }

    Ok(Temporal::Instant(parse_instant(base_type, s)?))
}

fn parse_sequence(base_type: BaseType, flags: Flags, s: &str) -> Result<Sequence, TemporalError> {
    let lower_inc = s.starts_with('[');
    let upper_inc = s.ends_with(']');
    if !(s.starts_with('[') || s.starts_with('(')) || !(s.ends_with(']') || s.ends_with(')')) {
        return Err(TemporalError::InvalidArgument("sequence missing bound brackets"));
    }
    let inner = &s[1..s.len() - 1];
    let instants = split_top_level(inner).into_iter().map(|part| parse_instant(base_type, &part)).collect::<Result<Vec<_>, _>>()?;
    Sequence::new(base_type, flags, instants, lower_inc, upper_inc)
}

impl Temporal {
    pub fn parse(base_type: BaseType, s: &str) -> Result<Self, TemporalError> {
        parse_temporal(base_type, s)
    }
}

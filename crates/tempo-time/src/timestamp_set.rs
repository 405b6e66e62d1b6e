use serde::{Deserialize, Serialize};
use tempo_value::{TemporalError, TemporalResult};

use crate::period::Timestamp;

/// A strictly increasing, non-empty sequence of distinct timestamps — the
/// time carrier for an instant-set temporal value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampSet {
    timestamps: Vec<Timestamp>,
}

impl TimestampSet {
    /// Builds a set from timestamps already in strictly increasing order.
    pub fn new(timestamps: Vec<Timestamp>) -> TemporalResult<Self> {
        if timestamps.is_empty() {
            return Err(TemporalError::InvalidArgument("timestamp set must be non-empty"));
        }
        if !timestamps.windows(2).all(|w| w[0] < w[1]) {
            return Err(TemporalError::InvalidArgument("timestamp set must be strictly increasing"));
        }
        Ok(TimestampSet { timestamps })
    }

    /// Builds a set from arbitrary timestamps, sorting and deduplicating.
    pub fn from_unsorted(mut timestamps: Vec<Timestamp>) -> TemporalResult<Self> {
        timestamps.sort_unstable();
        timestamps.dedup();
        Self::new(timestamps)
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        false // invariant: never empty once constructed
    }

    pub fn as_slice(&self) -> &[Timestamp] {
        &self.timestamps
    }

    pub fn start(&self) -> Timestamp {
        self.timestamps[0]
    }

    pub fn end(&self) -> Timestamp {
        *self.timestamps.last().expect("non-empty")
    }

    pub fn contains(&self, t: Timestamp) -> bool {
        self.timestamps.binary_search(&t).is_ok()
    }

    /// The smallest period spanning every timestamp in the set (closed both
    /// ends, since an instant is always included at the timestamp it sits on).
    pub fn span(&self) -> crate::period::Period {
        crate::period::Period::new(self.start(), self.end(), true, true).expect("start <= end by construction")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_increasing_input() {
        assert!(TimestampSet::new(vec![1, 1, 2]).is_err());
        assert!(TimestampSet::new(vec![2, 1]).is_err());
    }

    #[test]
    fn rejects_empty() {
        assert!(TimestampSet::new(vec![]).is_err());
    }

    #[test]
    fn from_unsorted_dedupes_and_sorts() {
        let ts = TimestampSet::from_unsorted(vec![5, 1, 3, 1, 5]).unwrap();
        assert_eq!(ts.as_slice(), &[1, 3, 5]);
    }

    #[test]
    fn contains_and_span() {
        let ts = TimestampSet::new(vec![10, 20, 30]).unwrap();
        assert!(ts.contains(20));
        assert!(!ts.contains(25));
        let span = ts.span();
        assert_eq!((span.lower, span.upper), (10, 30));
    }
}

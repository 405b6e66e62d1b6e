use serde::{Deserialize, Serialize};
use tempo_time::{Period, Timestamp};
use tempo_value::BaseValue;

/// A single `(value, t)` sample — always treated as the degenerate,
/// inclusive-inclusive period `[t, t]` (§3.3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instant {
    pub t: Timestamp,
    pub value: BaseValue,
}

impl Instant {
    pub fn new(t: Timestamp, value: BaseValue) -> Self {
        Instant { t, value }
    }

    pub fn period(&self) -> Period {
        Period::instant(self.t)
    }
}

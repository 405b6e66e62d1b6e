//! Period and period-set algebra: the time carriers underneath every
//! temporal value's sequence/sequence-set subtype, plus the strictly
//! increasing timestamp sets an instant-set subtype carries. Nothing in
//! here knows about base values — `tempo-core` layers those on top.

pub mod period;
pub mod period_set;
pub mod timestamp_set;

pub use period::{Period, RelativePosition, Timestamp};
pub use period_set::PeriodSet;
pub use timestamp_set::TimestampSet;

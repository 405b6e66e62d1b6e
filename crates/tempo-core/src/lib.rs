//! The temporal value engine: the four subtypes (instant, instant set,
//! sequence, sequence set) over the base-value kit from `tempo-value`, plus
//! normalization, restriction, synchronization, lifting and ever/always
//! predicates over them (§3-§4, §6).

pub mod header;
pub mod instant;
pub mod instant_set;
pub mod lift;
pub mod normalize;
pub mod predicate;
pub mod restrict;
pub mod sequence;
pub mod sequence_set;
pub mod synchronize;
pub mod temporal;
pub mod text;
pub mod wire;

pub use header::{BoundingBox, Flags, Interpolation};
pub use instant::Instant;
pub use instant_set::InstantSet;
pub use lift::{lift, sync_lift, ternary_lift, LiftInfo, TurningPointFn};
pub use predicate::{always, always_eq, always_less, ever, ever_eq, ever_less};
pub use restrict::{restrict_max, restrict_min, restrict_period, restrict_period_set, restrict_range, restrict_ranges, restrict_timestamp, restrict_timestamp_set, restrict_value, restrict_values, Mode, ValueWindow};
pub use sequence::Sequence;
pub use sequence_set::SequenceSet;
pub use synchronize::{synchronize, SyncMode};
pub use temporal::Temporal;
pub use wire::{from_wire, to_wire};

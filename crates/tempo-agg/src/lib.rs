//! The time-type aggregation front end (§4.10): three incremental
//! aggregates over the skiplist in `tempo-skiplist`.
//!
//! Every aggregate's state is an `Option<_>` so that the "transition
//! function" contract of §4.10 falls out of ordinary `Option` handling
//! rather than needing an explicit null-tracking flag: `strict=false` on
//! the state means a fresh `State::new()` starts as `None`-backed and the
//! first input initializes it; `strict=true` on the input means callers
//! simply skip calling `add_*` for a null input, leaving the state as-is.

pub mod extent;
pub mod tcount;
pub mod tunion;

pub use extent::ExtentState;
pub use tcount::TCountState;
pub use tunion::{TUnionResult, TUnionState};

use serde::{Deserialize, Serialize};

/// The one error taxonomy the whole engine reports through. Every fallible
/// entry point returns `Result<T, TemporalError>` (or `Option<T>` when the
/// "failure" is really just an empty result, see the crate docs); nothing in
/// this workspace panics on well-typed-but-malformed input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemporalError {
    /// Out-of-order instants, a one-sided-bounded instant sequence, mismatched
    /// SRID/dimensionality on spatial inputs, an interpolation mismatch that
    /// cannot be coerced, etc. The `&'static str` names which check failed.
    InvalidArgument(&'static str),
    /// `synchronize`/`lift` called on incompatible base types, or a skiplist
    /// splice of an element whose kind differs from the state's head.
    TypeMismatch,
    /// The skiplist (or its backing storage) cannot grow any further.
    ResourceExhausted,
    /// A caller-supplied cancellation callback returned `true` mid-operation.
    Interrupted,
}

impl std::fmt::Display for TemporalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemporalError::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            TemporalError::TypeMismatch => write!(f, "type mismatch"),
            TemporalError::ResourceExhausted => write!(f, "resource exhausted"),
            TemporalError::Interrupted => write!(f, "interrupted"),
        }
    }
}

impl std::error::Error for TemporalError {}

pub type TemporalResult<T> = Result<T, TemporalError>;

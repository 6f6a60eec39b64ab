//! Execution-policy tags.
//!
//! A zero-sized value tag selects, at the call site, between visiting
//! localities in order (deterministic, no associativity assumption) and
//! dispatching every per-locality kernel under one handle before folding
//! the results (requires an associative combine). Every algorithm in
//! [`crate::algorithms`] accepts either, or defaults to
//! [`ExecutionPolicy::SequentialAcrossLocalities`] when omitted — the
//! default across the whole library.

/// Selects the locality-traversal strategy for an algorithm call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ExecutionPolicy {
    /// Visit localities in order, waiting for each before starting the
    /// next. Deterministic; requires only that the combining operation be
    /// associative, not commutative.
    #[default]
    SequentialAcrossLocalities,
    /// Dispatch every per-locality kernel under one handle, wait once, then
    /// fold the collected partial results on the caller. Requires the
    /// combining operation to be associative.
    ParallelAcrossLocalities,
}

impl ExecutionPolicy {
    pub fn is_sequential(self) -> bool {
        matches!(self, ExecutionPolicy::SequentialAcrossLocalities)
    }

    pub fn is_parallel(self) -> bool {
        matches!(self, ExecutionPolicy::ParallelAcrossLocalities)
    }
}

/// Enables call-site overload resolution between "policy explicitly given"
/// and "no policy, default to sequential". Rust has no partial
/// specialization, so algorithms take `impl Into<ExecutionPolicy>` rather
/// than dispatching on this trait directly; it is kept as a marker for
/// callers that want to constrain a generic parameter to "is a policy".
pub trait IsExecutionPolicy: Into<ExecutionPolicy> + Copy {}

impl IsExecutionPolicy for ExecutionPolicy {}

/// The unit type stands in for "no policy supplied"; algorithms that accept
/// `impl Into<ExecutionPolicy>` can be called with `()` to mean the default.
impl From<()> for ExecutionPolicy {
    fn from(_: ()) -> Self {
        ExecutionPolicy::default()
    }
}

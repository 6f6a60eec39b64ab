//! Error kinds for the dispatch substrate, dma, and algorithm kernels.
//!
//! The variants here are exactly the error kinds of the runtime's error
//! handling design: bad addressing, truncated results, user-kernel
//! failures, handles dropped with outstanding work, and containers whose
//! iterator contract is internally inconsistent. Nothing here is specific
//! to any one component — `dispatch`, `dma`, and `algorithms` all funnel
//! their failures through [`RuntimeError`].

use crate::locality::Locality;
use std::fmt;

/// Coarse classification used by the ambient logging layer and by callers
/// that want to decide whether to retry, abort, or propagate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A usage error caught at the call site; the operation never reached
    /// a remote locality.
    CallerMisuse,
    /// A failure produced by user-supplied code running on a remote
    /// locality; propagated, never swallowed.
    UserPropagated,
    /// A programming error in the caller's handling of handles or
    /// containers. The runtime treats these as fatal.
    Fatal,
}

/// The error type returned by every fallible operation in this crate.
#[derive(thiserror::Error, Debug)]
pub enum RuntimeError {
    /// A target or observed locality id fell outside `[0, num_localities())`.
    #[error("locality {id} is outside the valid range [0, {num_localities})")]
    InvalidLocality { id: u32, num_localities: u32 },

    /// The caller-supplied result buffer was smaller than what the remote
    /// kernel wrote.
    #[error("result buffer of {provided} bytes is smaller than the {required} bytes written")]
    ResultTruncated { provided: usize, required: usize },

    /// A user-supplied closure running on `locality` returned an error or
    /// panicked.
    #[error("user kernel failed on locality {locality}: {message}")]
    UserKernelFailed { locality: Locality, message: String },

    /// A `Handle` was dropped while it still had outstanding tasks. This is
    /// a programming error, not a recoverable condition.
    #[error("handle {handle_id} dropped with {outstanding} outstanding task(s)")]
    HandleDestroyedWithOutstanding { handle_id: u64, outstanding: u64 },

    /// A container's `local_range` implementations did not concatenate to
    /// the requested global range. Detected opportunistically.
    #[error(
        "container contract violation: locality-concatenated local ranges covered {covered} \
         of {expected} elements for range [{begin}, {end})"
    )]
    ContainerContractViolation {
        begin: usize,
        end: usize,
        expected: usize,
        covered: usize,
    },

    /// The host-supplied `Runtime` could not reach `locality` at all (link
    /// down, process exited). Distinct from `UserKernelFailed`: no user
    /// code ran.
    #[error("transport unavailable for locality {locality}")]
    TransportUnavailable { locality: Locality },
}

impl RuntimeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RuntimeError::InvalidLocality { .. } | RuntimeError::ResultTruncated { .. } => {
                ErrorCategory::CallerMisuse
            }
            RuntimeError::UserKernelFailed { .. } | RuntimeError::TransportUnavailable { .. } => {
                ErrorCategory::UserPropagated
            }
            RuntimeError::HandleDestroyedWithOutstanding { .. }
            | RuntimeError::ContainerContractViolation { .. } => ErrorCategory::Fatal,
        }
    }

    /// Whether this error is a fatal runtime failure rather than something
    /// a caller can catch and continue past.
    pub fn is_fatal(&self) -> bool {
        matches!(self.category(), ErrorCategory::Fatal)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCategory::CallerMisuse => "caller-misuse",
            ErrorCategory::UserPropagated => "user-propagated",
            ErrorCategory::Fatal => "fatal",
        };
        f.write_str(s)
    }
}

pub type Result<T> = std::result::Result<T, RuntimeError>;

//! Ambient logging.
//!
//! Diagnostic only — no algorithm in [`crate::algorithms`] reads anything
//! back from here. [`DispatchEvent`] names the locality and synchronization
//! boundaries worth tracing: a dispatch crossing into a remote kernel, that
//! kernel retiring, a handle wait starting or ending, and a dma submission
//! or completion. [`emit`] funnels all of them through one
//! `tracing::trace!` call site so a subscriber can filter on the
//! `meridian_core::dispatch` target without this crate committing to any
//! particular log shape.

use crate::locality::Locality;

/// The kind of work a [`DispatchEvent`] describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchKind {
    /// A synchronous `execute_at*` call.
    Sync,
    /// An asynchronous `execute_at*_async` call, submitted under a handle.
    Async,
    /// A `for_each_at`/`for_each_on_all` batch.
    Bulk,
    /// A `dma` put or get.
    Dma,
}

impl std::fmt::Display for DispatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DispatchKind::Sync => "sync",
            DispatchKind::Async => "async",
            DispatchKind::Bulk => "bulk",
            DispatchKind::Dma => "dma",
        };
        f.write_str(s)
    }
}

/// One crossing of a locality or synchronization boundary.
#[derive(Clone, Copy, Debug)]
pub enum DispatchEvent {
    /// A kernel (or dma) was handed to `target`.
    Submitted { target: Locality, kind: DispatchKind },
    /// A previously submitted kernel (or dma) on `target` retired,
    /// successfully or not.
    Completed { target: Locality, kind: DispatchKind, ok: bool },
    /// A caller is about to block in [`crate::handle::Handle::wait_for_completion`].
    HandleWaitEnter { handle_id: u64, outstanding: u64 },
    /// [`crate::handle::Handle::wait_for_completion`] is about to return.
    HandleWaitExit { handle_id: u64, ok: bool },
}

/// Emits `event` at `trace` level under the `meridian_core::dispatch`
/// target. The only module that calls this is the one that observed the
/// boundary crossing — `emit` itself never infers anything about what
/// happened.
pub fn emit(event: DispatchEvent) {
    match event {
        DispatchEvent::Submitted { target, kind } => {
            tracing::trace!(target: "meridian_core::dispatch", locality = target.id(), kind = %kind, "submitted");
        }
        DispatchEvent::Completed { target, kind, ok } => {
            tracing::trace!(target: "meridian_core::dispatch", locality = target.id(), kind = %kind, ok, "completed");
        }
        DispatchEvent::HandleWaitEnter { handle_id, outstanding } => {
            tracing::trace!(target: "meridian_core::dispatch", handle_id, outstanding, "wait_for_completion enter");
        }
        DispatchEvent::HandleWaitExit { handle_id, ok } => {
            tracing::trace!(target: "meridian_core::dispatch", handle_id, ok, "wait_for_completion exit");
        }
    }
}

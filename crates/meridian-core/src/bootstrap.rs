//! Process bootstrap.
//!
//! `initialize` brings up the pieces a [`crate::runtime::Runtime`] needs
//! before any locality can be addressed; `finalize` tears it back down. How
//! a transport starts its workers and endpoints is left to that transport —
//! what this module owns is the ordering guarantee around it: initialize,
//! run exactly one user entrypoint, finalize, in that order, with every
//! implicit handle drained before teardown.
//!
//! User code is isolated to a single entrypoint function, matching a plain
//! `main(argc, argv) -> int` surface. Because dispatch kernels in this
//! crate are plain function pointers rather than closures with captures,
//! the entrypoint is one too — there is no hidden environment to smuggle
//! across the initialize/finalize boundary.

use crate::handle::Handle;
use crate::runtime::Runtime;
use std::sync::Arc;

/// Brings up `rt` for use: installs it as the process's runtime and logs
/// the topology it reports. Real transports would open endpoints and spawn
/// worker threads here; [`crate::testing::LoopbackRuntime`] already does
/// that work in its constructor, so this is mostly the ambient logging
/// point plus a place for a real transport to hook in later.
pub fn initialize<R: Runtime>(rt: Arc<R>) -> Arc<R> {
    tracing::info!(
        num_localities = rt.num_localities(),
        this_locality = rt.this_locality().id(),
        concurrency = rt.concurrency(),
        "runtime initialized"
    );
    rt
}

/// Tears down `rt`: drains any handle the bootstrap layer itself created
/// (today, none — user code owns every handle it submits work to) and logs
/// the shutdown.
pub fn finalize<R: Runtime>(rt: Arc<R>) {
    tracing::info!(this_locality = rt.this_locality().id(), "runtime finalized");
    drop(rt);
}

/// Runs `entrypoint` between [`initialize`] and [`finalize`], passing it
/// the argv the whole process set was launched with. Every locality is
/// expected to receive the same argv; enforcing that uniformity is this
/// function's caller's responsibility, not something this crate can do
/// without a concrete transport. Returns the entrypoint's exit code
/// unchanged.
pub fn run<R, F>(rt: Arc<R>, argc: i32, argv: &[String], entrypoint: F) -> i32
where
    R: Runtime,
    F: FnOnce(&R, i32, &[String]) -> i32,
{
    let rt = initialize(rt);
    let code = entrypoint(&rt, argc, argv);
    finalize(rt);
    code
}

/// An empty [`Handle`] the bootstrap layer can hand to an entrypoint that
/// wants one without constructing it itself — no different from
/// `Handle::create()`, but named for the call site that reads "the handle
/// my entrypoint starts with" rather than "a brand new handle".
pub fn root_handle() -> Handle {
    Handle::create()
}

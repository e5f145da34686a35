//! Runtime taint tracking for string-like values with explicit provenance.
//!
//! ## Scope
//! This crate associates origin metadata ("which input produced this data,
//! and which element range") with text and byte values, and propagates that
//! metadata through string operations as new values are derived from tainted
//! ones. The surrounding product decides *which* values to taint and what to
//! do with the resulting evidence; this crate owns the bookkeeping in
//! between.
//!
//! ## Key invariants
//! - Taint state lives in an out-of-band side table keyed by value handle,
//!   never inside the value buffers; dropping a value never dangles taint.
//! - A value's ranges are sorted by start, disjoint, and never zero-length.
//! - Registry memory is bounded per analysis unit: `end_unit()` reclaims
//!   everything a request registered.
//! - Instrumentation is invisible on the functional path: underlying
//!   operations produce byte-for-byte the results and errors they would
//!   produce un-instrumented, and quota exhaustion degrades to pass-through.
//!
//! ## Engine flow (one derivation)
//! 1) Check the quota gate; exhausted means untracked pass-through.
//! 2) Perform the underlying operation (errors propagate unchanged).
//! 3) Look up operand ranges; both untainted means untracked result.
//! 4) Compute derived ranges, bind them to a fresh handle, return tracked.
//!
//! ## Request flow
//! `start_unit -> taint(input, source) -> concat/join/slice/interpolate
//! -> evidence(final value) -> end_unit`
//!
//! ## Notable entry points
//! - [`TaintRuntime`]: per-unit context (registry + quota + lifecycle).
//! - [`engine`]: taint-aware operations (`concat`, `join`, `slice`,
//!   [`engine::interpolate`]).
//! - [`SharedRuntime`]: the same API behind a lock for multi-threaded hosts.
//! - [`Evidence`]: the segmented decomposition handed to reporting.

pub mod engine;

mod api;
mod evidence;
mod quota;
mod registry;
mod runtime;
mod shared;
mod value;

pub use api::{
    find_by_fingerprint, shift_ranges, Evidence, EvidencePart, OriginType, Source, TaintRange,
    ValueId,
};
pub use quota::{QuotaGate, UnitBudget, Unlimited};
pub use registry::TaintRegistry;
pub use runtime::TaintRuntime;
pub use shared::SharedRuntime;
pub use value::{OpError, TaintedValue, ValueKind, ValueRepr};

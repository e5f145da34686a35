//! Per-unit taint context: registry + quota gate + unit lifecycle.
//!
//! [`TaintRuntime`] is the explicit context object threaded through every
//! taint-aware operation. One runtime serves one analysis unit at a time
//! (typically one request); `start_unit`/`end_unit` bracket the unit and
//! bound registry memory deterministically. The runtime is intentionally
//! single-threaded; for a registry shared across worker threads, wrap it in
//! [`SharedRuntime`] instead.
//!
//! [`SharedRuntime`]: crate::SharedRuntime

use crate::api::{Evidence, Source, TaintRange};
use crate::evidence;
use crate::quota::{QuotaGate, Unlimited};
use crate::registry::TaintRegistry;
use crate::value::TaintedValue;
use std::sync::Arc;
use tracing::{debug, trace};

/// Per-unit taint tracking context.
pub struct TaintRuntime {
    registry: TaintRegistry,
    quota: Box<dyn QuotaGate + Send + Sync>,
}

impl Default for TaintRuntime {
    fn default() -> Self {
        Self::new(Box::new(Unlimited))
    }
}

impl TaintRuntime {
    /// Creates a runtime with the given quota gate.
    pub fn new(quota: Box<dyn QuotaGate + Send + Sync>) -> Self {
        Self {
            registry: TaintRegistry::new(),
            quota,
        }
    }

    /// Marks a value as tainted from `source`, covering `[0, len)`.
    ///
    /// Returns the input unchanged (untracked) when the quota is exhausted,
    /// the value is empty, or `source` is `None`. Otherwise the returned
    /// wrapper carries a fresh handle whose registration covers the whole
    /// value. Re-tainting an already-tracked value rebinds it to a fresh
    /// handle; the old registration stays until unit end.
    pub fn taint(&mut self, value: TaintedValue, source: Option<Source>) -> TaintedValue {
        if !self.quota.has_quota() {
            trace!("taint skipped: quota exhausted");
            return value;
        }
        if value.is_empty() {
            return value;
        }
        let Some(source) = source else {
            return value;
        };

        let len = value.len();
        let id = self.registry.alloc_id();
        self.registry
            .register(id, vec![TaintRange::new(0, len, Arc::new(source))]);
        self.quota.consume();
        trace!(?id, len, "value tainted");
        TaintedValue::tracked(value.into_repr(), id)
    }

    /// True iff the value has a non-empty range sequence registered.
    pub fn is_tainted(&self, value: &TaintedValue) -> bool {
        value
            .id()
            .map(|id| self.registry.is_tainted(id))
            .unwrap_or(false)
    }

    /// The value's ordered taint ranges, empty when untainted.
    pub fn ranges<'a>(&'a self, value: &TaintedValue) -> &'a [TaintRange] {
        match value.id() {
            Some(id) => self.registry.lookup(id),
            None => &[],
        }
    }

    /// Decomposes the value into tainted/untainted segments with
    /// de-duplicated sources, for external reporting.
    pub fn evidence(&self, value: &TaintedValue) -> Evidence {
        evidence::build(value.repr(), self.ranges(value))
    }

    /// Begins a new analysis unit: refills the quota gate.
    ///
    /// The registry is expected to be empty here (cleared by the previous
    /// `end_unit`); calling `start_unit` without a preceding `end_unit` does
    /// not clear it, so paired bracketing is on the caller.
    pub fn start_unit(&mut self) {
        self.quota.on_unit_start();
        debug!("analysis unit started");
    }

    /// Ends the analysis unit: clears the registry.
    ///
    /// Must run after all response processing for the unit completes; stale
    /// wrappers held across this boundary read as untainted afterwards.
    pub fn end_unit(&mut self) {
        self.registry.clear();
        debug!("analysis unit ended");
    }

    /// Drops taint state for one value when the caller can prove it dead
    /// before the unit boundary.
    pub fn release(&mut self, value: &TaintedValue) {
        if let Some(id) = value.id() {
            self.registry.remove(id);
        }
    }

    pub(crate) fn registry_mut(&mut self) -> &mut TaintRegistry {
        &mut self.registry
    }

    pub(crate) fn quota(&self) -> &dyn QuotaGate {
        &*self.quota
    }

    pub(crate) fn quota_mut(&mut self) -> &mut (dyn QuotaGate + Send + Sync) {
        &mut *self.quota
    }

    /// Number of tainted identities currently tracked (observability).
    pub fn tracked_len(&self) -> usize {
        self.registry.len()
    }
}

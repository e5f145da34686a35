//! Identity-keyed side table from value handle to taint ranges.
//!
//! The registry never holds the values themselves, only their range
//! sequences keyed by [`ValueId`]. Entries accumulate for the duration of an
//! analysis unit (one request) and are reclaimed wholesale by [`clear`] at
//! the unit boundary; [`remove`] exists for call sites that can prove a value
//! is dead earlier. Handles are allocated here so that identity assignment
//! and registration share one owner.
//!
//! ## Key invariants
//! - Registration is single-assignment per handle. A duplicate registration
//!   means the propagation engine mis-tracked identities; debug builds fail
//!   loudly, release builds overwrite and keep the host application running.
//! - Stored sequences are non-empty, sorted by start, disjoint, and free of
//!   zero-length ranges.
//! - `clear()` does not reset the handle allocator, so wrappers surviving a
//!   unit boundary can never alias a fresh registration.
//!
//! [`clear`]: TaintRegistry::clear
//! [`remove`]: TaintRegistry::remove

use crate::api::{ranges_are_disjoint_sorted, TaintRange, ValueId};
use ahash::AHashMap;
use tracing::debug;

/// Side table mapping value handles to their ordered taint range sequences.
#[derive(Default)]
pub struct TaintRegistry {
    entries: AHashMap<ValueId, Box<[TaintRange]>>,
    next_id: u32,
}

impl TaintRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh value handle.
    ///
    /// Handles are monotonically increasing for the life of the registry and
    /// survive `clear()`.
    pub fn alloc_id(&mut self) -> ValueId {
        assert!(self.next_id < u32::MAX, "value handle space exhausted");
        let id = ValueId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Associates an ordered range sequence with a handle.
    ///
    /// Empty sequences register nothing: absence from the table is the
    /// canonical untainted state, so `is_tainted` stays a pure presence
    /// check.
    pub fn register(&mut self, id: ValueId, ranges: Vec<TaintRange>) {
        if ranges.is_empty() {
            return;
        }
        debug_assert!(
            ranges_are_disjoint_sorted(&ranges),
            "taint ranges must be sorted, disjoint, and non-empty"
        );
        let _prev = self.entries.insert(id, ranges.into_boxed_slice());
        debug_assert!(
            _prev.is_none(),
            "value handle {:?} registered twice",
            id
        );
    }

    /// Returns the range sequence for a handle, empty when untainted.
    pub fn lookup(&self, id: ValueId) -> &[TaintRange] {
        self.entries.get(&id).map(|r| &**r).unwrap_or(&[])
    }

    /// True iff the handle has a non-empty range sequence.
    pub fn is_tainted(&self, id: ValueId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Drops the entry for a handle, if any.
    pub fn remove(&mut self, id: ValueId) {
        self.entries.remove(&id);
    }

    /// Drops all entries, retaining allocated capacity for the next unit.
    ///
    /// This is the primary defense against unbounded growth: short-lived
    /// value identities otherwise accumulate for the life of the process.
    pub fn clear(&mut self) {
        let dropped = self.entries.len();
        self.entries.clear();
        if dropped > 0 {
            debug!(dropped, "taint registry cleared");
        }
    }

    /// Number of tainted identities currently tracked.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

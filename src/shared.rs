//! Thread-safe runtime for hosts that share one registry across workers.
//!
//! [`SharedRuntime`] wraps a [`TaintRuntime`] in `Arc<RwLock<..>>` and
//! mirrors its API plus the engine operations. Writes (taint, derivations,
//! unit boundaries) take the write lock; `is_tainted`/`ranges`/`evidence`
//! take the read lock so concurrent lookups do not serialize against each
//! other.
//!
//! A poisoned lock is recovered rather than propagated: a panic in one
//! worker must degrade taint tracking, not break string operations for every
//! other worker. Registration happens-before any subsequent lookup of the
//! same handle because the write lock is released only after the derived
//! value (with its handle) is returned to the caller.

use crate::api::{Evidence, Source, TaintRange};
use crate::engine;
use crate::engine::Piece;
use crate::quota::QuotaGate;
use crate::runtime::TaintRuntime;
use crate::value::{OpError, TaintedValue};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Cloneable handle to a lock-protected [`TaintRuntime`].
#[derive(Clone)]
pub struct SharedRuntime {
    inner: Arc<RwLock<TaintRuntime>>,
}

impl Default for SharedRuntime {
    fn default() -> Self {
        Self::from_runtime(TaintRuntime::default())
    }
}

impl SharedRuntime {
    pub fn new(quota: Box<dyn QuotaGate + Send + Sync>) -> Self {
        Self::from_runtime(TaintRuntime::new(quota))
    }

    pub fn from_runtime(runtime: TaintRuntime) -> Self {
        Self {
            inner: Arc::new(RwLock::new(runtime)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, TaintRuntime> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TaintRuntime> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// See [`TaintRuntime::taint`].
    pub fn taint(&self, value: TaintedValue, source: Option<Source>) -> TaintedValue {
        self.write().taint(value, source)
    }

    /// See [`engine::concat`].
    pub fn concat(&self, a: &TaintedValue, b: &TaintedValue) -> Result<TaintedValue, OpError> {
        engine::concat(&mut self.write(), a, b)
    }

    /// See [`engine::join`].
    pub fn join(
        &self,
        sep: &TaintedValue,
        pieces: &[TaintedValue],
    ) -> Result<TaintedValue, OpError> {
        engine::join(&mut self.write(), sep, pieces)
    }

    /// See [`engine::slice`].
    pub fn slice(&self, v: &TaintedValue, start: usize, end: usize) -> TaintedValue {
        engine::slice(&mut self.write(), v, start, end)
    }

    /// See [`engine::interpolate`].
    pub fn interpolate(&self, pieces: &[Piece<'_>]) -> Result<TaintedValue, OpError> {
        engine::interpolate(&mut self.write(), pieces)
    }

    /// See [`TaintRuntime::is_tainted`].
    pub fn is_tainted(&self, value: &TaintedValue) -> bool {
        self.read().is_tainted(value)
    }

    /// See [`TaintRuntime::ranges`]. Cloned out of the lock.
    pub fn ranges(&self, value: &TaintedValue) -> Vec<TaintRange> {
        self.read().ranges(value).to_vec()
    }

    /// See [`TaintRuntime::evidence`].
    pub fn evidence(&self, value: &TaintedValue) -> Evidence {
        self.read().evidence(value)
    }

    /// See [`TaintRuntime::start_unit`].
    pub fn start_unit(&self) {
        self.write().start_unit();
    }

    /// See [`TaintRuntime::end_unit`].
    pub fn end_unit(&self) {
        self.write().end_unit();
    }

    /// See [`TaintRuntime::release`].
    pub fn release(&self, value: &TaintedValue) {
        self.write().release(value);
    }

    /// See [`TaintRuntime::tracked_len`].
    pub fn tracked_len(&self) -> usize {
        self.read().tracked_len()
    }
}

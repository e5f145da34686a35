use crate::value::ValueRepr;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

// --------------------------
// Public API types
// --------------------------

/// Opaque value identity used to key the [`TaintRegistry`].
///
/// Handles are allocated by the registry when a value is tainted or derived
/// from tainted operands, and are embedded in [`TaintedValue`] wrappers.
/// Identity is the handle, never the buffer address or content: two
/// content-equal values with different handles are distinct registry entries.
///
/// [`TaintRegistry`]: crate::TaintRegistry
/// [`TaintedValue`]: crate::TaintedValue
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ValueId(pub(crate) u32);

/// Category of input boundary where tainted data entered the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginType {
    Parameter,
    ParameterName,
    Header,
    HeaderName,
    Cookie,
    CookieName,
    Body,
    Path,
    Query,
}

/// Origin descriptor for tainted data: the input key it came from, the
/// category of that input, and optionally the original raw value.
///
/// A `Source` is created once at the taint boundary and shared by `Arc`
/// across every range derived from that input; it is never mutated. Equality
/// (all three fields) is what evidence building de-duplicates on.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Source {
    /// Input key, e.g. a parameter or header name.
    pub name: String,
    /// Original raw value. Optional: extraction may redact it.
    pub value: Option<String>,
    /// Input category.
    pub origin: OriginType,
}

impl Source {
    pub fn new(name: impl Into<String>, value: impl Into<String>, origin: OriginType) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            origin,
        }
    }

    /// A source whose raw value was withheld at the boundary.
    pub fn redacted(name: impl Into<String>, origin: OriginType) -> Self {
        Self {
            name: name.into(),
            value: None,
            origin,
        }
    }
}

/// One contiguous tainted region `[start, start + length)` of a value,
/// attributed to a single [`Source`].
///
/// Offsets and lengths are in element units: characters for text values,
/// bytes for byte values. Ranges are immutable; re-offsetting produces a new
/// range via [`TaintRange::shift`].
///
/// A value's full taint state is an ordered sequence of disjoint ranges
/// sorted by `start` ascending. Every propagation rule preserves that
/// invariant, and the registry debug-asserts it on registration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaintRange {
    start: usize,
    length: usize,
    source: Arc<Source>,
}

impl TaintRange {
    /// Creates a range covering `[start, start + length)`.
    pub fn new(start: usize, length: usize, source: Arc<Source>) -> Self {
        Self {
            start,
            length,
            source,
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// One past the last tainted element.
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    pub fn source(&self) -> &Arc<Source> {
        &self.source
    }

    /// Returns a copy of this range moved `offset` elements to the right.
    ///
    /// The source reference is shared, not cloned.
    pub fn shift(&self, offset: usize) -> TaintRange {
        TaintRange {
            start: self.start + offset,
            length: self.length,
            source: Arc::clone(&self.source),
        }
    }

    /// Stable fingerprint combining start, length, and source.
    ///
    /// Used by consumers that need to refer back to a specific range across
    /// an evidence report without holding the range itself.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = ahash::AHasher::default();
        self.start.hash(&mut hasher);
        self.length.hash(&mut hasher);
        self.source.hash(&mut hasher);
        hasher.finish()
    }
}

/// Shifts every range in `ranges` by `offset`, preserving order.
pub fn shift_ranges(ranges: &[TaintRange], offset: usize) -> Vec<TaintRange> {
    ranges.iter().map(|r| r.shift(offset)).collect()
}

/// Finds the range in `ranges` whose [`TaintRange::fingerprint`] matches.
pub fn find_by_fingerprint(ranges: &[TaintRange], fingerprint: u64) -> Option<&TaintRange> {
    ranges.iter().find(|r| r.fingerprint() == fingerprint)
}

/// Returns true when `ranges` is sorted by start ascending with no overlap.
///
/// Zero-length ranges are rejected: the engine elides them at every
/// derivation site, so their presence indicates a propagation bug.
pub(crate) fn ranges_are_disjoint_sorted(ranges: &[TaintRange]) -> bool {
    let mut prev_end = 0usize;
    for r in ranges {
        if r.length == 0 {
            return false;
        }
        if r.start < prev_end {
            return false;
        }
        prev_end = r.end();
    }
    true
}

// --------------------------
// Evidence types
// --------------------------

/// One segment of an evidence decomposition.
///
/// Untainted segments carry only the slice; tainted segments also carry the
/// index of their source in the report's de-duplicated source list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidencePart {
    /// The slice of the value this segment covers.
    pub value: ValueRepr,
    /// Index into [`Evidence::sources`], absent for untainted segments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<usize>,
}

/// Order-preserving decomposition of a value into tainted and untainted
/// segments, plus the de-duplicated sources the tainted segments refer to.
///
/// Concatenating `parts[..].value` in order reconstructs the input value
/// exactly. Sources are listed in first-appearance order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub parts: Vec<EvidencePart>,
    pub sources: Vec<Source>,
}

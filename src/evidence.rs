//! Evidence builder: segment decomposition with source de-duplication.
//!
//! Converts a value and its ordered range sequence into the report shape the
//! rule engine consumes: an order-preserving list of tainted and untainted
//! segments, plus one de-duplicated source list the tainted segments index
//! into. Building evidence is a non-mutating read; it touches neither the
//! registry nor the quota gate.

use crate::api::{Evidence, EvidencePart, Source, TaintRange};
use crate::value::ValueRepr;

/// Decomposes `value` under `ranges` into evidence segments.
///
/// `ranges` must be the value's registered sequence (sorted, disjoint); the
/// walk emits an untainted segment for each gap, a tainted segment per
/// range, and a trailing untainted segment when the last range stops short
/// of the end. With no ranges the whole value is one untainted segment.
///
/// Sources are de-duplicated by equality in first-appearance order; each
/// tainted segment records an index into the source list instead of
/// repeating the source.
pub(crate) fn build(value: &ValueRepr, ranges: &[TaintRange]) -> Evidence {
    if ranges.is_empty() {
        return Evidence {
            parts: vec![EvidencePart {
                value: value.clone(),
                source: None,
            }],
            sources: Vec::new(),
        };
    }

    let len = value.len();
    let mut parts = Vec::with_capacity(ranges.len() * 2 + 1);
    let mut sources: Vec<Source> = Vec::new();
    let mut pos = 0usize;

    for range in ranges {
        if range.start() > pos {
            parts.push(EvidencePart {
                value: value.slice(pos, range.start()),
                source: None,
            });
        }

        let source = range.source().as_ref();
        let idx = match sources.iter().position(|s| s == source) {
            Some(idx) => idx,
            None => {
                sources.push(source.clone());
                sources.len() - 1
            }
        };

        parts.push(EvidencePart {
            value: value.slice(range.start(), range.end()),
            source: Some(idx),
        });
        pos = range.end();
    }

    if pos < len {
        parts.push(EvidencePart {
            value: value.slice(pos, len),
            source: None,
        });
    }

    Evidence { parts, sources }
}

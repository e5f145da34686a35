//! Propagation engine: taint-aware string operations.
//!
//! Each operation intercepts one derivation (`concat`, `join`, `slice`,
//! `interpolate`) and follows the same gate order:
//!
//! 1. Quota exhausted: perform the underlying operation, return its result
//!    untracked, never touch the registry.
//! 2. The underlying operation fails: propagate that error unchanged.
//! 3. Neither operand tainted: return the result untracked.
//! 4. Otherwise compute the derived range sequence, bind it to a fresh
//!    handle, and return the tracked result.
//!
//! The functional result is computed before any bookkeeping, so a registry
//! contract failure can never corrupt what the caller receives.
//!
//! ## Offset arithmetic
//!
//! All offsets are element units (characters for text, bytes for bytes).
//! Concatenation shifts the right operand's ranges by the left operand's
//! length; join and interpolate accumulate the shift across pieces, with
//! separators and literals advancing the offset without contributing ranges.
//! Zero-length operands contribute nothing and leave the accumulator
//! untouched.

use crate::api::TaintRange;
use crate::runtime::TaintRuntime;
use crate::value::{OpError, TaintedValue, ValueRepr};
use std::sync::Arc;


/// One segment of an interpolation, in output order.
///
/// Literals are template content (never tainted); tracked segments are
/// values whose taint state, if any, flows into the result.
#[derive(Clone, Copy, Debug)]
pub enum Piece<'a> {
    Literal(&'a ValueRepr),
    Tracked(&'a TaintedValue),
}

impl<'a> Piece<'a> {
    fn repr(&self) -> &'a ValueRepr {
        match *self {
            Piece::Literal(repr) => repr,
            Piece::Tracked(value) => value.repr(),
        }
    }
}

/// Taint-aware concatenation: `a + b`.
///
/// The result carries `a`'s ranges unchanged followed by `b`'s ranges
/// shifted by `a.len()`. Kind mismatches fail exactly as the underlying
/// operation does.
pub fn concat(
    rt: &mut TaintRuntime,
    a: &TaintedValue,
    b: &TaintedValue,
) -> Result<TaintedValue, OpError> {
    let out = a.repr().concat(b.repr())?;
    if !rt.quota().has_quota() {
        return Ok(TaintedValue::untracked(out));
    }

    let a_ranges = rt.ranges(a);
    let b_ranges = rt.ranges(b);
    if a_ranges.is_empty() && b_ranges.is_empty() {
        return Ok(TaintedValue::untracked(out));
    }

    let mut ranges = Vec::with_capacity(a_ranges.len() + b_ranges.len());
    ranges.extend_from_slice(a_ranges);
    let offset = a.len();
    ranges.extend(b_ranges.iter().map(|r| r.shift(offset)));

    Ok(bind(rt, out, ranges))
}

/// Taint-aware n-ary join: `sep.join(pieces)`.
///
/// Pieces contribute their ranges at their cumulative offset; separators
/// advance the offset but never contribute ranges, even when the separator
/// value itself carries taint. Joining zero pieces yields an empty value of
/// the separator's kind.
pub fn join(
    rt: &mut TaintRuntime,
    sep: &TaintedValue,
    pieces: &[TaintedValue],
) -> Result<TaintedValue, OpError> {
    let out = join_repr(sep.repr(), pieces)?;
    if !rt.quota().has_quota() {
        return Ok(TaintedValue::untracked(out));
    }

    let sep_len = sep.len();
    let mut ranges = Vec::new();
    let mut offset = 0usize;
    for (idx, piece) in pieces.iter().enumerate() {
        if idx > 0 {
            offset += sep_len;
        }
        ranges.extend(rt.ranges(piece).iter().map(|r| r.shift(offset)));
        offset += piece.len();
    }

    if ranges.is_empty() {
        return Ok(TaintedValue::untracked(out));
    }
    Ok(bind(rt, out, ranges))
}

/// Taint-aware slice: `v[start..end]` in element units.
///
/// Indexes clamp to the value length and `start >= end` yields an empty
/// value, mirroring the underlying operation. Each range overlapping
/// `[start, end)` is intersected and re-based to start at `start`.
pub fn slice(
    rt: &mut TaintRuntime,
    v: &TaintedValue,
    start: usize,
    end: usize,
) -> TaintedValue {
    let out = v.repr().slice(start, end);
    if !rt.quota().has_quota() {
        return TaintedValue::untracked(out);
    }

    let len = v.len();
    let i = start.min(len);
    let j = end.min(len).max(i);

    let ranges: Vec<TaintRange> = rt
        .ranges(v)
        .iter()
        .filter_map(|r| intersect_rebase(r, i, j))
        .collect();

    if ranges.is_empty() {
        return TaintedValue::untracked(out);
    }
    bind(rt, out, ranges)
}

/// Taint-aware interpolation: formats interleaved literal and tracked
/// segments into one value (the engine's view of template formatting).
///
/// Tracked segments carry their ranges shifted to the segment's output
/// offset; literals only advance the offset. Interpolating zero pieces
/// yields an untracked empty text value.
pub fn interpolate(rt: &mut TaintRuntime, pieces: &[Piece<'_>]) -> Result<TaintedValue, OpError> {
    let out = interpolate_repr(pieces)?;
    if !rt.quota().has_quota() {
        return Ok(TaintedValue::untracked(out));
    }

    let mut ranges = Vec::new();
    let mut offset = 0usize;
    for piece in pieces {
        if let Piece::Tracked(value) = piece {
            ranges.extend(rt.ranges(value).iter().map(|r| r.shift(offset)));
        }
        offset += piece.repr().len();
    }

    if ranges.is_empty() {
        return Ok(TaintedValue::untracked(out));
    }
    Ok(bind(rt, out, ranges))
}

/// Intersects `r` with `[i, j)` and re-bases the result to start at `i`.
///
/// Returns `None` when the intersection is empty.
pub(crate) fn intersect_rebase(r: &TaintRange, i: usize, j: usize) -> Option<TaintRange> {
    let lo = r.start().max(i);
    let hi = r.end().min(j);
    if lo >= hi {
        return None;
    }
    Some(TaintRange::new(lo - i, hi - lo, Arc::clone(r.source())))
}

/// Binds a computed range sequence to a fresh handle for `out`.
///
/// Derived values always get a fresh identity: the result of an operation is
/// a new value even when its content equals an operand's.
fn bind(rt: &mut TaintRuntime, out: ValueRepr, ranges: Vec<TaintRange>) -> TaintedValue {
    let id = rt.registry_mut().alloc_id();
    rt.registry_mut().register(id, ranges);
    rt.quota_mut().consume();
    TaintedValue::tracked(out, id)
}

/// Underlying join, with the separator's kind governing.
fn join_repr(sep: &ValueRepr, pieces: &[TaintedValue]) -> Result<ValueRepr, OpError> {
    let mut out = sep.empty_like();
    for (idx, piece) in pieces.iter().enumerate() {
        if idx > 0 {
            out = out.concat(sep)?;
        }
        out = out.concat(piece.repr())?;
    }
    Ok(out)
}

/// Underlying interpolation, with the first piece's kind governing.
fn interpolate_repr(pieces: &[Piece<'_>]) -> Result<ValueRepr, OpError> {
    let Some(first) = pieces.first() else {
        return Ok(ValueRepr::Text(String::new()));
    };
    let mut out = first.repr().empty_like();
    for piece in pieces {
        out = out.concat(piece.repr())?;
    }
    Ok(out)
}

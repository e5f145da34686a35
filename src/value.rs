//! String-like value wrappers the engine operates on.
//!
//! [`ValueRepr`] carries the buffer and implements the *underlying* string
//! operations (concatenation, slicing). These behave exactly as they would
//! without instrumentation: mixing text and bytes fails with [`OpError`], and
//! the engine forwards that error unchanged. [`TaintedValue`] pairs a repr
//! with the optional registry handle that links it to its taint state.
//!
//! Offsets are in element units: characters for text, bytes for byte
//! buffers. Text slicing is therefore O(chars), not O(1); provenance offsets
//! must match what the reporting side counts, and that is characters.

use crate::api::ValueId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind tag for [`ValueRepr`], used in operand-mismatch errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Bytes,
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueKind::Text => f.write_str("text"),
            ValueKind::Bytes => f.write_str("bytes"),
        }
    }
}

/// Error raised by the underlying string operations.
///
/// The propagation engine never wraps or rewords this: callers observe the
/// same failure they would get from the un-instrumented operation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum OpError {
    #[error("cannot concatenate {left} and {right}")]
    KindMismatch { left: ValueKind, right: ValueKind },
}

/// Owned text or byte buffer.
///
/// Serializes untagged: text as a JSON string, bytes as a byte array.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueRepr {
    Text(String),
    Bytes(Vec<u8>),
}

impl ValueRepr {
    pub fn kind(&self) -> ValueKind {
        match self {
            ValueRepr::Text(_) => ValueKind::Text,
            ValueRepr::Bytes(_) => ValueKind::Bytes,
        }
    }

    /// Length in element units: characters for text, bytes for bytes.
    pub fn len(&self) -> usize {
        match self {
            ValueRepr::Text(s) => s.chars().count(),
            ValueRepr::Bytes(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ValueRepr::Text(s) => s.is_empty(),
            ValueRepr::Bytes(b) => b.is_empty(),
        }
    }

    /// Concatenates two values of the same kind.
    pub fn concat(&self, other: &ValueRepr) -> Result<ValueRepr, OpError> {
        match (self, other) {
            (ValueRepr::Text(a), ValueRepr::Text(b)) => {
                let mut out = String::with_capacity(a.len() + b.len());
                out.push_str(a);
                out.push_str(b);
                Ok(ValueRepr::Text(out))
            }
            (ValueRepr::Bytes(a), ValueRepr::Bytes(b)) => {
                let mut out = Vec::with_capacity(a.len() + b.len());
                out.extend_from_slice(a);
                out.extend_from_slice(b);
                Ok(ValueRepr::Bytes(out))
            }
            (a, b) => Err(OpError::KindMismatch {
                left: a.kind(),
                right: b.kind(),
            }),
        }
    }

    /// Clamped slice `[start, end)` in element units.
    ///
    /// Out-of-bounds indexes clamp to the value length and `start >= end`
    /// yields an empty value of the same kind, so slicing never fails.
    pub fn slice(&self, start: usize, end: usize) -> ValueRepr {
        match self {
            ValueRepr::Text(s) => {
                if start >= end {
                    return ValueRepr::Text(String::new());
                }
                ValueRepr::Text(s.chars().skip(start).take(end - start).collect())
            }
            ValueRepr::Bytes(b) => {
                let lo = start.min(b.len());
                let hi = end.min(b.len()).max(lo);
                ValueRepr::Bytes(b[lo..hi].to_vec())
            }
        }
    }

    /// Empty value of the same kind.
    pub fn empty_like(&self) -> ValueRepr {
        match self {
            ValueRepr::Text(_) => ValueRepr::Text(String::new()),
            ValueRepr::Bytes(_) => ValueRepr::Bytes(Vec::new()),
        }
    }
}

impl From<String> for ValueRepr {
    fn from(s: String) -> Self {
        ValueRepr::Text(s)
    }
}

impl From<&str> for ValueRepr {
    fn from(s: &str) -> Self {
        ValueRepr::Text(s.to_owned())
    }
}

impl From<Vec<u8>> for ValueRepr {
    fn from(b: Vec<u8>) -> Self {
        ValueRepr::Bytes(b)
    }
}

impl From<&[u8]> for ValueRepr {
    fn from(b: &[u8]) -> Self {
        ValueRepr::Bytes(b.to_vec())
    }
}

/// A string-like value plus the registry handle linking it to taint state.
///
/// Untracked values (`id() == None`) are plain buffers; the registry has
/// never seen them. Tracked values were returned by `taint()` or derived from
/// tainted operands. Cloning preserves the handle: both wrappers refer to the
/// same registration, mirroring how copying a reference does not copy the
/// underlying value's identity.
#[derive(Clone, Debug)]
pub struct TaintedValue {
    repr: ValueRepr,
    id: Option<ValueId>,
}

impl TaintedValue {
    /// Wraps a buffer with no taint state attached.
    pub fn untracked(repr: impl Into<ValueRepr>) -> Self {
        Self {
            repr: repr.into(),
            id: None,
        }
    }

    pub(crate) fn tracked(repr: ValueRepr, id: ValueId) -> Self {
        Self {
            repr,
            id: Some(id),
        }
    }

    pub fn repr(&self) -> &ValueRepr {
        &self.repr
    }

    pub fn id(&self) -> Option<ValueId> {
        self.id
    }

    /// Length in element units (characters for text, bytes for bytes).
    pub fn len(&self) -> usize {
        self.repr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repr.is_empty()
    }

    /// Text view, `None` for byte values.
    pub fn as_text(&self) -> Option<&str> {
        match &self.repr {
            ValueRepr::Text(s) => Some(s),
            ValueRepr::Bytes(_) => None,
        }
    }

    /// Byte view, `None` for text values.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.repr {
            ValueRepr::Bytes(b) => Some(b),
            ValueRepr::Text(_) => None,
        }
    }

    /// Consumes the wrapper, returning the buffer.
    pub fn into_repr(self) -> ValueRepr {
        self.repr
    }
}

impl From<ValueRepr> for TaintedValue {
    fn from(repr: ValueRepr) -> Self {
        TaintedValue::untracked(repr)
    }
}

impl From<String> for TaintedValue {
    fn from(s: String) -> Self {
        TaintedValue::untracked(s)
    }
}

impl From<&str> for TaintedValue {
    fn from(s: &str) -> Self {
        TaintedValue::untracked(s)
    }
}

impl From<Vec<u8>> for TaintedValue {
    fn from(b: Vec<u8>) -> Self {
        TaintedValue::untracked(b)
    }
}

impl From<&[u8]> for TaintedValue {
    fn from(b: &[u8]) -> Self {
        TaintedValue::untracked(b)
    }
}

impl PartialEq for TaintedValue {
    /// Content equality; identity is deliberately excluded so functional
    /// results compare equal to their un-instrumented counterparts.
    fn eq(&self, other: &Self) -> bool {
        self.repr == other.repr
    }
}

impl Eq for TaintedValue {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_len_counts_chars_not_bytes() {
        let v = ValueRepr::from("héllo");
        assert_eq!(v.len(), 5);
        let cat = ValueRepr::from("🙀");
        assert_eq!(cat.len(), 1);
    }

    #[test]
    fn concat_same_kind() {
        let a = ValueRepr::from("Hello ");
        let b = ValueRepr::from("world");
        assert_eq!(a.concat(&b).unwrap(), ValueRepr::from("Hello world"));

        let x = ValueRepr::from(b"Hi".as_slice());
        let y = ValueRepr::from(b" there".as_slice());
        assert_eq!(
            x.concat(&y).unwrap(),
            ValueRepr::from(b"Hi there".as_slice())
        );
    }

    #[test]
    fn concat_kind_mismatch_is_the_underlying_error() {
        let a = ValueRepr::from("Hi");
        let b = ValueRepr::from(b"".as_slice());
        let err = a.concat(&b).unwrap_err();
        assert_eq!(
            err,
            OpError::KindMismatch {
                left: ValueKind::Text,
                right: ValueKind::Bytes,
            }
        );
        assert_eq!(err.to_string(), "cannot concatenate text and bytes");
    }

    #[test]
    fn slice_clamps_and_handles_multibyte() {
        let v = ValueRepr::from("héllo");
        assert_eq!(v.slice(1, 3), ValueRepr::from("él"));
        assert_eq!(v.slice(3, 100), ValueRepr::from("lo"));
        assert_eq!(v.slice(4, 2), ValueRepr::from(""));

        let b = ValueRepr::from(b"abcdef".as_slice());
        assert_eq!(b.slice(2, 4), ValueRepr::from(b"cd".as_slice()));
        assert_eq!(b.slice(10, 20), ValueRepr::from(b"".as_slice()));
    }

    #[test]
    fn tainted_value_equality_ignores_identity() {
        let a = TaintedValue::untracked("x");
        let b = TaintedValue::tracked(ValueRepr::from("x"), ValueId(7));
        assert_eq!(a, b);
    }
}

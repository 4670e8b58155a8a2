//! Dynamic Model Representation: a schemaless, self-describing typed
//! value tree used as a neutral interchange format between management
//! clients and servers.
//!
//! The value tree ([`Value`]) is the hard core; everything else is a
//! transport layered on top of it:
//!
//! - [`binary`] — a self-delimiting byte encoding for round-trip
//!   persistence.
//! - [`base64`] — a streaming base64 codec wrapping the binary format
//!   for text-safe transport.
//! - [`dmr`] and [`json`] — event-based readers/writers for the two
//!   textual dialects, sharing the [`grammar`] state machine.
//! - [`expression`] — `${...}` placeholder resolution against an
//!   injected environment.

pub mod base64;
pub mod binary;
pub mod dmr;
pub mod error;
pub mod expression;
pub mod grammar;
pub mod json;
pub mod value;

pub use error::{DmrError, ModelError, NoSuchElementError, Result, ValueError};
pub use expression::{ExpressionEnvironment, SimpleEnvironment};
pub use value::{BigDecimal, Value, ValueType};

use std::io::{self, Read};

impl Value {
    /// Native DMR textual form, single line.
    pub fn to_string_compact(&self) -> String {
        dmr::writer::render_compact(self)
    }

    /// Native DMR textual form, multi-line with four-space indentation.
    pub fn to_string_pretty(&self) -> String {
        dmr::writer::render_pretty(self)
    }

    /// JSON-compatible textual form, single line.
    pub fn to_json_compact(&self) -> String {
        json::writer::render_compact(self)
    }

    /// JSON-compatible textual form, multi-line with four-space
    /// indentation.
    pub fn to_json_pretty(&self) -> String {
        json::writer::render_pretty(self)
    }

    /// Parses the native DMR textual form.
    pub fn from_string(text: &str) -> Result<Value, ModelError> {
        dmr::parse(text)
    }

    /// Parses the JSON-compatible textual form.
    pub fn from_json(text: &str) -> Result<Value, ModelError> {
        json::parse(text)
    }
}

/// Options controlling a writer's output shape. The only axis either
/// textual dialect exposes (spec.md §4.6/§4.7 name no other knob).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DmrWriterOptions {
    pub compact: bool,
}

/// Encodes `value` to the binary wire format, then wraps it in
/// line-wrapped base64 for text-safe transport.
pub fn to_base64(value: &Value) -> String {
    let bytes = binary::encode_to_vec(value);
    base64::encode_wrapped(&bytes)
}

/// Inverse of [`to_base64`].
pub fn from_base64(text: &str) -> Result<Value, ModelError> {
    let bytes = base64::decode(text)?;
    binary::decode_exact(&bytes)
}

/// A source of Unicode text a reader scans from. Only the contract
/// matters (spec.md §1 "out of scope" excludes concrete I/O transports);
/// readers in this crate operate on an already-materialized `&str`, and
/// this trait exists so callers can hand over anything that can be read
/// to a `String` up front (e.g. a `std::io::Read` wrapped in
/// [`read_to_string`]).
pub trait CharStream {
    fn read_all(self) -> io::Result<String>;
}

impl CharStream for &str {
    fn read_all(self) -> io::Result<String> {
        Ok(self.to_string())
    }
}

impl<R: Read> CharStream for R {
    fn read_all(mut self) -> io::Result<String> {
        let mut out = String::new();
        self.read_to_string(&mut out)?;
        Ok(out)
    }
}

/// A source of raw bytes the binary codec decodes from. Mirrors
/// [`CharStream`] for the binary/base64 side of the crate.
pub trait ByteStream {
    fn read_all(self) -> io::Result<Vec<u8>>;
}

impl ByteStream for &[u8] {
    fn read_all(self) -> io::Result<Vec<u8>> {
        Ok(self.to_vec())
    }
}

/// Reads a complete document from `source` and parses it as native DMR
/// text.
pub fn read_dmr(source: impl CharStream) -> Result<Value, DmrError> {
    let text = source
        .read_all()
        .map_err(|e| DmrError::Model(ModelError::Token(e.to_string())))?;
    Ok(dmr::parse(&text)?)
}

/// Reads a complete document from `source` and parses it as JSON text.
pub fn read_json(source: impl CharStream) -> Result<Value, DmrError> {
    let text = source
        .read_all()
        .map_err(|e| DmrError::Model(ModelError::Token(e.to_string())))?;
    Ok(json::parse(&text)?)
}

/// Reads a complete document from `source` and decodes it as the binary
/// wire format.
pub fn read_binary(source: impl ByteStream) -> Result<Value, DmrError> {
    let bytes = source
        .read_all()
        .map_err(|e| DmrError::Model(ModelError::InvalidObject(e.to_string())))?;
    Ok(binary::decode_exact(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convenience_renderers_round_trip() {
        let mut root = Value::new();
        root.get("a").unwrap().set_int(1).unwrap();
        assert_eq!(Value::from_string(&root.to_string_compact()).unwrap(), root);
        assert_eq!(Value::from_string(&root.to_string_pretty()).unwrap(), root);
        assert_eq!(Value::from_json(&root.to_json_compact()).unwrap(), root);
        assert_eq!(Value::from_json(&root.to_json_pretty()).unwrap(), root);
    }

    #[test]
    fn base64_envelope_round_trips() {
        let mut root = Value::new();
        root.get("x").unwrap().add().unwrap().set_bytes(vec![0xde, 0xad]).unwrap();
        let wrapped = to_base64(&root);
        assert_eq!(from_base64(&wrapped).unwrap(), root);
    }

    #[test]
    fn empty_object_base64_envelope_matches_spec_example() {
        let empty = Value::empty_object();
        let encoded = binary::encode_to_vec(&empty);
        assert_eq!(encoded, vec![b'O', 0, 0, 0, 0]);
        assert_eq!(from_base64(&to_base64(&empty)).unwrap(), empty);
    }

    #[test]
    fn reads_from_a_plain_str_char_stream() {
        let v = read_dmr("42").unwrap();
        assert_eq!(v, Value::int(42));
    }
}

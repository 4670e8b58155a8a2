//! Error types common across the value tree, codecs, and grammar.

use thiserror::Error;

/// Grammar and well-formedness violations raised by a reader, a writer,
/// or the base64 codec.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ModelError {
    /// The event stream violated the grammar; carries the SM's
    /// "expecting ..." message for the state it was in.
    #[error("model exception: {0}")]
    Grammar(String),
    /// A textual token could not be scanned (bad escape, unterminated
    /// string, unrecognized punctuation, malformed number literal, ...).
    #[error("model exception: {0}")]
    Token(String),
    /// Base64 decoding encountered a byte outside the alphabet/padding.
    #[error("incorrect data: {0}")]
    IncorrectData(String),
    /// The binary codec's leading type char did not map to a known tag.
    #[error("invalid object: {0}")]
    InvalidObject(String),
}

/// Illegal argument / illegal state errors: a conversion that has no
/// defined result, child access on an incompatible tag, or a mutation
/// attempted on a protected node.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ValueError {
    #[error("illegal argument: {0}")]
    IllegalArgument(String),
    #[error("illegal state: {0}")]
    IllegalState(String),
    #[error("unsupported mutation: node is protected")]
    Protected,
}

/// `require(key|index)` on an element that is absent.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("no such element: {0}")]
pub struct NoSuchElementError(pub String);

/// Unifying error type for callers that don't need to match a specific
/// error kind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DmrError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Value(#[from] ValueError),
    #[error(transparent)]
    NoSuchElement(#[from] NoSuchElementError),
}

pub type Result<T, E = DmrError> = std::result::Result<T, E>;

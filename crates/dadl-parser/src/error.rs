//! Parse error types.

use std::fmt;
use std::io;

use thiserror::Error;

/// Result alias used throughout the parser.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Parse error with source location and context.
///
/// Every failure is attributed to a `(line, column, message)` triple; the
/// `kind` categorizes the failure for programmatic handling. Line numbers are
/// 1-based, columns 0-based.
#[derive(Debug, Error)]
#[error("parse error [line: {line}, col: {column}]: {message}")]
pub struct ParseError {
    /// Kind of parse error
    pub kind: ParseErrorKind,
    /// 1-based line where the error occurred (0 when no line applies)
    pub line: usize,
    /// 0-based column where the error occurred
    pub column: usize,
    /// Human-readable error message
    pub message: String,
    /// Underlying I/O error, when `kind` is `Io`
    #[source]
    pub source: Option<io::Error>,
}

/// Category of parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A `[...]` line that does not match the group-header grammar.
    InvalidGroupHeader,
    /// An `@` directive other than `@schema`.
    UnknownMagic,
    /// A data line or group header was reached with no active schema.
    MissingSchema,
    /// A type reference the resolver could not satisfy.
    UnknownType,
    /// The resolver left a delegated placeholder without a target.
    CircularUnresolved,
    /// The meta-schema accepted a definition the AST decoder rejects.
    InvalidSchemaFormat,
    /// A formula / sequence / oneof regex did not match the line.
    NoMatch,
    /// A scalar token was not a legal bool / int / number / enum value.
    InvalidValue,
    /// A struct child key not declared in the schema.
    UnexpectedChild,
    /// An import glob matched zero resources.
    ImportNoMatch,
    /// A resource-provider failure (wrapped I/O error).
    Io,
    /// A parse operation invoked on a type that does not support it.
    NotSupported,
}

impl ParseError {
    /// Create an error at a source position.
    pub fn new(kind: ParseErrorKind, at: Pos, message: impl Into<String>) -> Self {
        Self {
            kind,
            line: at.line,
            column: at.column,
            message: message.into(),
            source: None,
        }
    }

    /// Create an error with no meaningful source position (schema loading,
    /// resource resolution).
    pub fn unpositioned(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind, Pos::none(), message)
    }

    /// Wrap a resource-provider I/O failure, attaching the resource path.
    pub fn io(path: impl fmt::Display, err: io::Error) -> Self {
        Self {
            kind: ParseErrorKind::Io,
            line: 0,
            column: 0,
            message: format!("{}: {}", path, err),
            source: Some(err),
        }
    }
}

/// Source position threaded through every parse operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pos {
    /// 1-based line number
    pub line: usize,
    /// 0-based column
    pub column: usize,
}

impl Pos {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Position for errors raised outside document scanning.
    pub fn none() -> Self {
        Self { line: 0, column: 0 }
    }
}

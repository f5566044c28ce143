//! Error types for the IR crate.

use thiserror::Error;

/// A literal value that cannot be used where it was requested.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstantError {
    /// The value was expected to be a double-quoted string literal.
    #[error("constant value is not a quoted string: {0}")]
    NotQuoted(String),

    /// The literal has a shape the IR cannot represent.
    #[error("unsupported constant value: {0}")]
    Unsupported(String),
}

/// A defect in the IR discovered while rendering it as text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmitError {
    /// An annotation carries a value that is not a quoted string.
    #[error("annotation '{annotation}' on '{owner}' has a malformed value: {source}")]
    MalformedAnnotation {
        /// Annotation name.
        annotation: String,
        /// Name of the node carrying the annotation.
        owner: String,
        /// Underlying constant error.
        source: ConstantError,
    },
}

/// Failure while lowering a parsed syntax tree into the IR.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LowerError {
    /// A node span does not fit inside the source bytes of its file.
    #[error("span {start}..{end} of '{node}' is outside the {len} source bytes of '{file}'")]
    SpanOutOfRange {
        /// File being lowered.
        file: String,
        /// Node whose span is invalid.
        node: String,
        /// Span start offset.
        start: usize,
        /// Span end offset.
        end: usize,
        /// Length of the source.
        len: usize,
    },

    /// A constant in the syntax tree could not be converted.
    #[error("constant '{name}' in '{file}': {source}")]
    Constant {
        /// File being lowered.
        file: String,
        /// Constant or field name.
        name: String,
        /// Underlying constant error.
        source: ConstantError,
    },
}

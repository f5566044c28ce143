//! Conversion errors.

use idlbridge_ir::{ConstantError, EmitError};
use thiserror::Error;

use crate::spec::Dialect;

/// Everything that can abort the conversion of one document.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The batch contained no documents.
    #[error("no input documents were provided")]
    EmptyInput,

    /// The bytes are not valid JSON or YAML.
    #[error("failed to parse '{file}': {source}")]
    Parse {
        /// Input file name.
        file: String,
        /// Parser error.
        source: serde_yaml::Error,
    },

    /// The document root is not a mapping.
    #[error("'{file}' is not a JSON/YAML object")]
    NotADocument {
        /// Input file name.
        file: String,
    },

    /// The document does not have the shape of the detected dialect.
    #[error("failed to read '{file}' as {dialect}: {source}")]
    Unmarshal {
        /// Input file name.
        file: String,
        /// Dialect the document was read as.
        dialect: Dialect,
        /// Deserializer error.
        source: serde_yaml::Error,
    },

    /// No usable version field and no structural hint about the dialect.
    #[error(
        "cannot detect the dialect of '{file}': missing 'swagger: 2.x' or 'openapi: 3.x' version field ({reason})"
    )]
    MissingVersion {
        /// Input file name.
        file: String,
        /// What was found instead.
        reason: &'static str,
    },

    /// A `$ref` points at nothing (strict reference policy only).
    #[error("unresolved reference '{reference}'")]
    DanglingRef {
        /// The `$ref` value.
        reference: String,
    },

    /// A literal default value cannot be represented.
    #[error("unsupported default value for '{name}': {source}")]
    DefaultValue {
        /// Property name.
        name: String,
        /// Why the value was rejected.
        source: ConstantError,
    },

    /// Converter options could not be read.
    #[error("invalid converter configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// The generated IR could not be rendered.
    #[error(transparent)]
    Emit(#[from] EmitError),
}

//! Format-neutral interface model shared by every producer and consumer of
//! the idlbridge toolchain.
//!
//! The crate is organized in layers:
//! 1. `ast` / `constant`: the IR tree (schema, files, definitions, types, literals)
//! 2. `index`: per-schema lookup of definitions by fully-qualified name
//! 3. `sort`: dependency ordering of the definitions inside one file
//! 4. `syntax`: lowering of an externally parsed Thrift syntax tree into the IR
//! 5. `emit`: rendering of the IR as Thrift source text
//!
//! A fully-qualified name (FQN) has the form `<file-path>#<definition-name>`,
//! with `.<function-name>` appended for service functions.

#![forbid(unsafe_code)]
#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]

mod ast;
mod constant;
mod emit;
mod error;
mod index;
mod sort;
pub mod syntax;

pub use ast::{
    Annotation, Comment, Constant, Definitions, Enum, EnumMember, Field, File, Function,
    IdlSchema, Import, Location, Message, MessageKind, Namespace, Position, Primitive,
    Requiredness, SCHEMA_VERSION, Service, Type, Typedef, renumber_fields,
};
pub use constant::{ConstantEntry, ConstantValue};
pub use emit::{Emit, ThriftWriter, WriterOptions, generate};
pub use error::{ConstantError, EmitError, LowerError};
pub use index::{Definition, split_fqn};
pub use sort::sort_definitions;

//! IR node definitions.
//!
//! The tree is exclusively owned top-down: [`IdlSchema`] owns its files, a
//! [`File`] owns one [`Definitions`] bag, and so on. Cross references between
//! definitions are name based (`Type::Named::fqn`), never pointers.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::constant::ConstantValue;
use crate::index::DefinitionIndex;

/// Version tag written into every schema produced by this crate.
pub const SCHEMA_VERSION: &str = "1.0";

// =============================================================================
// Schema and files
// =============================================================================

/// Root of the IR: an ordered list of files.
///
/// The FQN lookup index is built on first query and kept inside the value, so
/// two schemas never share an index. Mutable access to the files through
/// [`IdlSchema::files_mut`] drops the index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdlSchema {
    /// IR format version.
    pub schema_version: String,
    /// Target IDL dialect, e.g. `thrift`.
    pub idl_type: String,
    files: Vec<File>,
    #[serde(skip)]
    pub(crate) index: OnceLock<DefinitionIndex>,
}

impl IdlSchema {
    /// A schema for `idl_type` holding `files` in the given order.
    pub fn new(idl_type: impl Into<String>, files: Vec<File>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            idl_type: idl_type.into(),
            files,
            index: OnceLock::new(),
        }
    }

    /// Files in output order.
    pub fn files(&self) -> &[File] {
        &self.files
    }

    /// Mutable access to the files. Invalidates the lookup index.
    pub fn files_mut(&mut self) -> &mut Vec<File> {
        self.index = OnceLock::new();
        &mut self.files
    }

    /// The file stored under `path`.
    pub fn file(&self, path: &str) -> Option<&File> {
        self.files.iter().find(|f| f.path == path)
    }
}

/// One IDL source file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    /// Output-relative path, e.g. `petstore/petstore.thrift`.
    pub path: String,
    /// Source span, when lowered from IDL source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Version of the document the file was produced from.
    #[serde(default)]
    pub syntax: String,
    /// Included files, sorted by path.
    #[serde(default)]
    pub imports: Vec<Import>,
    /// Namespace declarations, one per scope.
    #[serde(default)]
    pub namespaces: Vec<Namespace>,
    /// File-level options.
    #[serde(default)]
    pub options: Vec<Annotation>,
    /// Everything the file defines.
    #[serde(default)]
    pub definitions: Definitions,
}

impl File {
    /// An empty file at `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// File name without directory and extension: `a/user.thrift` -> `user`.
    pub fn stem(&self) -> &str {
        path_stem(&self.path)
    }
}

pub(crate) fn path_stem(path: &str) -> &str {
    let base = path.rsplit(['/', '\\']).next().unwrap_or(path);
    base.rsplit_once('.').map_or(base, |(stem, _)| stem)
}

/// An `include` of another file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Import {
    /// Path of the included file, as generated.
    pub path: String,
    /// Literal written after `include`, e.g. `"\"user.thrift\""`.
    pub value: String,
    /// Comments attached to the include.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
    /// Source span, when lowered from IDL source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

/// A `namespace <scope> <name>` declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Namespace {
    /// Target language, e.g. `go` or `*`.
    pub scope: String,
    /// Dotted namespace name.
    pub name: String,
    /// Annotations after the declaration.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    /// Comments attached to the declaration.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
    /// Source span, when lowered from IDL source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

/// Everything a file defines, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Definitions {
    /// Services in output order.
    #[serde(default)]
    pub services: Vec<Service>,
    /// Structs, unions and exceptions.
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Enumerations.
    #[serde(default)]
    pub enums: Vec<Enum>,
    /// Named constants.
    #[serde(default)]
    pub constants: Vec<Constant>,
    /// Type aliases.
    #[serde(default)]
    pub typedefs: Vec<Typedef>,
}

impl Definitions {
    /// Whether the bag holds no definitions at all.
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
            && self.messages.is_empty()
            && self.enums.is_empty()
            && self.constants.is_empty()
            && self.typedefs.is_empty()
    }

    /// The message called `name`.
    pub fn message(&self, name: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.name == name)
    }

    /// The enum called `name`.
    pub fn enumeration(&self, name: &str) -> Option<&Enum> {
        self.enums.iter().find(|e| e.name == name)
    }

    /// The service called `name`, mutably.
    pub fn service_mut(&mut self, name: &str) -> Option<&mut Service> {
        self.services.iter_mut().find(|s| s.name == name)
    }
}

// =============================================================================
// Source positions and comments
// =============================================================================

/// A span inside a source file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// First position of the span.
    pub start: Position,
    /// Position just past the span.
    pub end: Position,
}

/// A point inside a source file. Lines and columns are 1-based.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// 1-based line.
    pub line: usize,
    /// 1-based column.
    pub column: usize,
    /// Byte offset from the start of the file.
    pub offset: usize,
}

/// A comment block, stored with its delimiters (`/** ... */`, `// ...`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment text including delimiters.
    pub text: String,
    /// Source span, when lowered from IDL source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl Comment {
    /// Doc comments for a free-form description; empty descriptions yield none.
    pub fn from_description(description: &str) -> Vec<Self> {
        let trimmed = description.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        let lines: Vec<&str> = trimmed.lines().collect();
        let text = if lines.len() == 1 {
            format!("/** {trimmed} */")
        } else {
            let mut block = String::from("/**\n");
            for line in lines {
                block.push_str(" * ");
                block.push_str(line.trim());
                block.push('\n');
            }
            block.push_str(" */");
            block
        };
        vec![Self {
            text,
            location: None,
        }]
    }
}

/// A `name = value` annotation, written in parentheses after a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Annotation key, e.g. `api.get`.
    pub name: String,
    /// Annotation value; `None` for a bare key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ConstantValue>,
}

impl Annotation {
    /// An annotation whose value is the quoted string `value`.
    pub fn quoted(name: impl Into<String>, value: &str) -> Self {
        Self {
            name: name.into(),
            value: Some(ConstantValue::quoted(value)),
        }
    }
}

// =============================================================================
// Definitions
// =============================================================================

/// An RPC service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// Service name.
    pub name: String,
    /// Fully-qualified name, `<file>#<name>`.
    pub fqn: String,
    /// Name of the extended service, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    /// Functions in declaration order.
    #[serde(default)]
    pub functions: Vec<Function>,
    /// Annotations after the service body.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    /// Doc comments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
    /// Source span, when lowered from IDL source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Raw source text, when lowered from IDL source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Service {
    /// The function called `name`.
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }
}

/// One service function.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Function {
    /// Function name.
    pub name: String,
    /// Fully-qualified name, `<file>#<service>.<name>`.
    pub fqn: String,
    /// Return type; `void` when nothing is returned.
    pub return_type: Type,
    /// Whether the function is declared `oneway`.
    #[serde(default)]
    pub oneway: bool,
    /// Parameters, numbered from 1.
    #[serde(default)]
    pub parameters: Vec<Field>,
    /// Declared exceptions, numbered from 1.
    #[serde(default)]
    pub throws: Vec<Field>,
    /// Annotations after the signature.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    /// Doc comments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
    /// Source span, when lowered from IDL source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

/// Kind of a field-carrying definition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// `struct`.
    #[default]
    Struct,
    /// `union`.
    Union,
    /// `exception`.
    Exception,
}

impl MessageKind {
    /// IDL keyword introducing the definition.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Struct => "struct",
            Self::Union => "union",
            Self::Exception => "exception",
        }
    }
}

/// A struct, union or exception.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Message name.
    pub name: String,
    /// Fully-qualified name, `<file>#<name>`.
    pub fqn: String,
    /// Struct, union or exception.
    #[serde(default)]
    pub kind: MessageKind,
    /// Fields, numbered from 1.
    #[serde(default)]
    pub fields: Vec<Field>,
    /// Annotations after the body.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    /// Doc comments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
    /// Source span, when lowered from IDL source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Raw source text, when lowered from IDL source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Message {
    /// Structural equality: name, kind, fields and annotations. Ignores FQNs,
    /// comments and source positions.
    pub fn same_shape(&self, other: &Self) -> bool {
        self.name == other.name
            && self.kind == other.kind
            && self.annotations == other.annotations
            && self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(&other.fields)
                .all(|(a, b)| a.same_shape(b))
    }

    /// The field called `name`.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Field requiredness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Requiredness {
    /// Always present.
    Required,
    /// May be absent.
    Optional,
    /// No keyword written.
    #[default]
    Default,
}

impl Requiredness {
    /// `required` when `flag` is set, `optional` otherwise.
    pub fn from_required(flag: bool) -> Self {
        if flag { Self::Required } else { Self::Optional }
    }

    /// Keyword printed before the field type, if any.
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            Self::Required => Some("required"),
            Self::Optional => Some("optional"),
            Self::Default => None,
        }
    }
}

/// A message field, function parameter or thrown exception.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Field id; positive and unique inside its owner.
    pub id: i32,
    /// Field name.
    pub name: String,
    /// Field type.
    #[serde(rename = "type")]
    pub field_type: Type,
    /// Requiredness keyword.
    #[serde(default)]
    pub requiredness: Requiredness,
    /// Default value, written after `=`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<ConstantValue>,
    /// Annotations after the field.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    /// Doc comments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
    /// Source span, when lowered from IDL source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl Field {
    /// A field with id 0; callers number fields with [`renumber_fields`].
    pub fn new(name: impl Into<String>, field_type: Type, requiredness: Requiredness) -> Self {
        Self {
            name: name.into(),
            field_type,
            requiredness,
            ..Self::default()
        }
    }

    /// Structural equality ignoring FQNs, comments and source positions.
    pub fn same_shape(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.requiredness == other.requiredness
            && self.default == other.default
            && self.annotations == other.annotations
            && self.field_type.same_shape(&other.field_type)
    }

    /// Whether an annotation called `name` is present, whatever its value.
    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| a.name == name)
    }
}

/// Assign ids `1..=n` in list order.
pub fn renumber_fields(fields: &mut [Field]) {
    for (id, field) in (1..).zip(fields.iter_mut()) {
        field.id = id;
    }
}

/// An enumeration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enum {
    /// Enum name.
    pub name: String,
    /// Fully-qualified name, `<file>#<name>`.
    pub fqn: String,
    /// Members in declaration order.
    #[serde(default)]
    pub values: Vec<EnumMember>,
    /// Annotations after the body.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    /// Doc comments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
    /// Source span, when lowered from IDL source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Raw source text, when lowered from IDL source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Enum {
    /// Structural equality on name and `(member, value)` pairs.
    pub fn same_shape(&self, other: &Self) -> bool {
        self.name == other.name
            && self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|(a, b)| a.name == b.name && a.value == b.value)
    }
}

/// One enum member with an explicit value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnumMember {
    /// Member name.
    pub name: String,
    /// Member value.
    pub value: i64,
    /// Annotations after the member.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    /// Doc comments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
}

/// A named constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constant {
    /// Constant name.
    pub name: String,
    /// Fully-qualified name, `<file>#<name>`.
    pub fqn: String,
    /// Declared type.
    #[serde(rename = "type")]
    pub const_type: Type,
    /// Constant value.
    pub value: ConstantValue,
    /// Doc comments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
    /// Source span, when lowered from IDL source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Raw source text, when lowered from IDL source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// A type alias.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Typedef {
    /// Alias name.
    pub alias: String,
    /// Fully-qualified name, `<file>#<alias>`.
    pub fqn: String,
    /// Aliased type.
    #[serde(rename = "type")]
    pub target: Type,
    /// Annotations after the alias.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    /// Doc comments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
    /// Source span, when lowered from IDL source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Raw source text, when lowered from IDL source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

// =============================================================================
// Types
// =============================================================================

/// Built-in scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    /// `void`, return types only.
    Void,
    /// `bool`.
    Bool,
    /// `byte`.
    Byte,
    /// `i8`.
    I8,
    /// `i16`.
    I16,
    /// `i32`.
    I32,
    /// `i64`.
    I64,
    /// `float`.
    Float,
    /// `double`.
    Double,
    /// `string`.
    String,
    /// `binary`.
    Binary,
}

impl Primitive {
    /// IDL spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Void => "void",
            Self::Bool => "bool",
            Self::Byte => "byte",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
            Self::Binary => "binary",
        }
    }
}

impl FromStr for Primitive {
    type Err = ();

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Ok(match name {
            "void" => Self::Void,
            "bool" => Self::Bool,
            "byte" => Self::Byte,
            "i8" => Self::I8,
            "i16" => Self::I16,
            "i32" => Self::I32,
            "i64" => Self::I64,
            "float" => Self::Float,
            "double" => Self::Double,
            "string" => Self::String,
            "binary" => Self::Binary,
            _ => return Err(()),
        })
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A type reference.
///
/// The variants make the child shape explicit: primitives and named types
/// have no children, `list`/`set` have a value type, `map` has both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Type {
    /// A built-in scalar.
    Primitive {
        /// Which scalar.
        name: Primitive,
    },
    /// A user-defined type; `name` is bare (`User`) or qualified (`user.User`).
    Named {
        /// Type name as written.
        name: String,
        /// Fully-qualified name of the target, when it is known.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fqn: Option<String>,
    },
    /// `list<T>`.
    #[serde(rename_all = "camelCase")]
    List {
        /// Element type.
        value_type: Box<Type>,
    },
    /// `set<T>`.
    #[serde(rename_all = "camelCase")]
    Set {
        /// Element type.
        value_type: Box<Type>,
    },
    /// `map<K, V>`.
    #[serde(rename_all = "camelCase")]
    Map {
        /// Key type.
        key_type: Box<Type>,
        /// Value type.
        value_type: Box<Type>,
    },
}

impl Default for Type {
    fn default() -> Self {
        Self::void()
    }
}

impl Type {
    /// A primitive type.
    pub const fn primitive(name: Primitive) -> Self {
        Self::Primitive { name }
    }

    /// `void`.
    pub const fn void() -> Self {
        Self::primitive(Primitive::Void)
    }

    /// `string`.
    pub const fn string() -> Self {
        Self::primitive(Primitive::String)
    }

    /// A user-defined type reference.
    pub fn named(name: impl Into<String>, fqn: Option<String>) -> Self {
        Self::Named {
            name: name.into(),
            fqn,
        }
    }

    /// `list<value_type>`.
    pub fn list(value_type: Self) -> Self {
        Self::List {
            value_type: Box::new(value_type),
        }
    }

    /// `set<value_type>`.
    pub fn set(value_type: Self) -> Self {
        Self::Set {
            value_type: Box::new(value_type),
        }
    }

    /// `map<key_type, value_type>`.
    pub fn map(key_type: Self, value_type: Self) -> Self {
        Self::Map {
            key_type: Box::new(key_type),
            value_type: Box::new(value_type),
        }
    }

    /// Primitive name, container keyword (`list`, `set`, `map`) or type name.
    pub fn name(&self) -> &str {
        match self {
            Self::Primitive { name } => name.as_str(),
            Self::Named { name, .. } => name,
            Self::List { .. } => "list",
            Self::Set { .. } => "set",
            Self::Map { .. } => "map",
        }
    }

    /// Whether this is `void`.
    pub fn is_void(&self) -> bool {
        matches!(
            self,
            Self::Primitive {
                name: Primitive::Void
            }
        )
    }

    /// FQN of a named type.
    pub fn fqn(&self) -> Option<&str> {
        match self {
            Self::Named { fqn, .. } => fqn.as_deref(),
            _ => None,
        }
    }

    /// Key type of a map.
    pub fn key_type(&self) -> Option<&Self> {
        match self {
            Self::Map { key_type, .. } => Some(key_type.as_ref()),
            _ => None,
        }
    }

    /// Element type of a list or set, value type of a map.
    pub fn value_type(&self) -> Option<&Self> {
        match self {
            Self::List { value_type } | Self::Set { value_type } | Self::Map { value_type, .. } => {
                Some(value_type.as_ref())
            }
            _ => None,
        }
    }

    /// Structural equality that ignores FQN back-references.
    pub fn same_shape(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Primitive { name: a }, Self::Primitive { name: b }) => a == b,
            (Self::Named { name: a, .. }, Self::Named { name: b, .. }) => a == b,
            (Self::List { value_type: a }, Self::List { value_type: b })
            | (Self::Set { value_type: a }, Self::Set { value_type: b }) => a.same_shape(b),
            (
                Self::Map {
                    key_type: ka,
                    value_type: va,
                },
                Self::Map {
                    key_type: kb,
                    value_type: vb,
                },
            ) => ka.same_shape(kb) && va.same_shape(vb),
            _ => false,
        }
    }

    /// Visit this type and every nested type, outermost first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Self)) {
        visit(self);
        if let Some(key) = self.key_type() {
            key.walk(visit);
        }
        if let Some(value) = self.value_type() {
            value.walk(visit);
        }
    }
}

//! Lowering of parsed Thrift source into the IR.
//!
//! Parsing itself happens outside this crate. A parser hands over a
//! [`SyntaxDocument`] per file together with the raw source bytes; node spans
//! are used to cut the raw `content` of each definition out of the source.
//! Cross-file type resolution is delegated to a [`TypeLocator`].

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::ast::{
    Annotation, Comment, Constant, Definitions, Enum, EnumMember, Field, File, Function,
    IdlSchema, Import, Location, Message, MessageKind, Namespace, Primitive, Requiredness,
    Service, Type, Typedef, path_stem,
};
use crate::constant::{ConstantEntry, ConstantValue, quote};
use crate::error::{ConstantError, LowerError};

// =============================================================================
// Syntax tree handed over by the parser
// =============================================================================

/// One parsed file.
#[derive(Debug, Clone, Default)]
pub struct SyntaxDocument {
    /// `include` statements.
    pub includes: Vec<SyntaxInclude>,
    /// `namespace` statements.
    pub namespaces: Vec<SyntaxNamespace>,
    /// Top-level definitions in source order.
    pub definitions: Vec<SyntaxDefinition>,
}

/// An `include` statement.
#[derive(Debug, Clone, Default)]
pub struct SyntaxInclude {
    /// Include path without quotes, relative to the including file.
    pub path: String,
    /// Comments preceding the node, with delimiters.
    pub comments: Vec<String>,
    /// Source span of the node.
    pub span: Location,
}

/// A `namespace` statement.
#[derive(Debug, Clone, Default)]
pub struct SyntaxNamespace {
    /// Target language.
    pub scope: String,
    /// Dotted namespace name.
    pub name: String,
    /// Annotations in source order.
    pub annotations: Vec<SyntaxAnnotation>,
    /// Comments preceding the node, with delimiters.
    pub comments: Vec<String>,
    /// Source span of the node.
    pub span: Location,
}

/// `name = "value"`; the value is stored without quotes.
#[derive(Debug, Clone, Default)]
pub struct SyntaxAnnotation {
    /// Name as written.
    pub name: String,
    /// Value without quotes; `None` for a bare key.
    pub value: Option<String>,
}

/// A top-level definition.
#[derive(Debug, Clone)]
pub enum SyntaxDefinition {
    /// `struct`.
    Struct(SyntaxStruct),
    /// `union`.
    Union(SyntaxStruct),
    /// `exception`.
    Exception(SyntaxStruct),
    /// `enum`.
    Enum(SyntaxEnum),
    /// `const`.
    Const(SyntaxConst),
    /// `typedef`.
    Typedef(SyntaxTypedef),
    /// `service`.
    Service(SyntaxService),
}

/// Body shared by structs, unions and exceptions.
#[derive(Debug, Clone, Default)]
pub struct SyntaxStruct {
    /// Name as written.
    pub name: String,
    /// Fields in source order.
    pub fields: Vec<SyntaxField>,
    /// Annotations in source order.
    pub annotations: Vec<SyntaxAnnotation>,
    /// Comments preceding the node, with delimiters.
    pub comments: Vec<String>,
    /// Source span of the node.
    pub span: Location,
}

/// A field, parameter or thrown exception.
#[derive(Debug, Clone)]
pub struct SyntaxField {
    /// Explicit field id, if written.
    pub id: Option<i32>,
    /// Name as written.
    pub name: String,
    /// Requiredness keyword, if written.
    pub requiredness: Option<Requiredness>,
    /// Declared type.
    pub field_type: SyntaxType,
    /// Default value, if written.
    pub default: Option<SyntaxLiteral>,
    /// Annotations in source order.
    pub annotations: Vec<SyntaxAnnotation>,
    /// Comments preceding the node, with delimiters.
    pub comments: Vec<String>,
    /// Source span of the node.
    pub span: Location,
}

/// A type as written in source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxType {
    /// Built-in scalar or user type name, possibly qualified (`inc.Type`).
    Name(String),
    /// `list<T>`.
    List(Box<SyntaxType>),
    /// `set<T>`.
    Set(Box<SyntaxType>),
    /// `map<K, V>`.
    Map(Box<SyntaxType>, Box<SyntaxType>),
}

/// A literal as written in source. Strings are stored without quotes.
#[derive(Debug, Clone, PartialEq)]
pub enum SyntaxLiteral {
    /// String literal.
    Str(String),
    /// Integer literal.
    Int(i64),
    /// Floating point literal.
    Double(f64),
    /// Bare identifier, e.g. an enum member.
    Identifier(String),
    /// `[...]`.
    List(Vec<SyntaxLiteral>),
    /// `{k: v, ...}`.
    Map(Vec<(SyntaxLiteral, SyntaxLiteral)>),
}

/// An `enum` definition.
#[derive(Debug, Clone, Default)]
pub struct SyntaxEnum {
    /// Name as written.
    pub name: String,
    /// Members in source order.
    pub values: Vec<SyntaxEnumValue>,
    /// Annotations in source order.
    pub annotations: Vec<SyntaxAnnotation>,
    /// Comments preceding the node, with delimiters.
    pub comments: Vec<String>,
    /// Source span of the node.
    pub span: Location,
}

/// One enum member.
#[derive(Debug, Clone, Default)]
pub struct SyntaxEnumValue {
    /// Name as written.
    pub name: String,
    /// Explicit value; absent values continue from the previous one.
    pub value: Option<i64>,
    /// Annotations in source order.
    pub annotations: Vec<SyntaxAnnotation>,
    /// Comments preceding the node, with delimiters.
    pub comments: Vec<String>,
}

/// A `const` definition.
#[derive(Debug, Clone)]
pub struct SyntaxConst {
    /// Name as written.
    pub name: String,
    /// Declared type.
    pub const_type: SyntaxType,
    /// Value as written.
    pub value: SyntaxLiteral,
    /// Comments preceding the node, with delimiters.
    pub comments: Vec<String>,
    /// Source span of the node.
    pub span: Location,
}

/// A `typedef` definition.
#[derive(Debug, Clone)]
pub struct SyntaxTypedef {
    /// New name.
    pub alias: String,
    /// Aliased type.
    pub target: SyntaxType,
    /// Annotations in source order.
    pub annotations: Vec<SyntaxAnnotation>,
    /// Comments preceding the node, with delimiters.
    pub comments: Vec<String>,
    /// Source span of the node.
    pub span: Location,
}

/// A `service` definition.
#[derive(Debug, Clone, Default)]
pub struct SyntaxService {
    /// Name as written.
    pub name: String,
    /// Extended service, possibly qualified.
    pub extends: Option<String>,
    /// Functions in source order.
    pub functions: Vec<SyntaxFunction>,
    /// Annotations in source order.
    pub annotations: Vec<SyntaxAnnotation>,
    /// Comments preceding the node, with delimiters.
    pub comments: Vec<String>,
    /// Source span of the node.
    pub span: Location,
}

/// One service function.
#[derive(Debug, Clone, Default)]
pub struct SyntaxFunction {
    /// Name as written.
    pub name: String,
    /// Whether the function is `oneway`.
    pub oneway: bool,
    /// `None` for `void`.
    pub return_type: Option<SyntaxType>,
    /// Parameters in source order.
    pub parameters: Vec<SyntaxField>,
    /// Declared exceptions.
    pub throws: Vec<SyntaxField>,
    /// Annotations in source order.
    pub annotations: Vec<SyntaxAnnotation>,
    /// Comments preceding the node, with delimiters.
    pub comments: Vec<String>,
    /// Source span of the node.
    pub span: Location,
}

/// A parsed file plus the bytes it was parsed from.
#[derive(Debug, Clone, Default)]
pub struct ParsedFile {
    /// Syntax tree of the file.
    pub document: SyntaxDocument,
    /// Raw source bytes.
    pub source: Vec<u8>,
}

// =============================================================================
// Type location
// =============================================================================

/// Answers "where is type X defined" across a multi-file project.
pub trait TypeLocator {
    /// FQN of the definition that `type_name`, written in `from_file`, refers to.
    fn locate(&self, from_file: &str, type_name: &str) -> Option<String>;
}

/// Locator over a set of parsed files, following each file's includes.
#[derive(Debug, Default)]
pub struct ProjectLocator {
    defined: HashSet<String>,
    includes: BTreeMap<String, Vec<String>>,
}

impl ProjectLocator {
    /// Index every definition of `files` and resolve their includes.
    pub fn new(files: &BTreeMap<String, ParsedFile>) -> Self {
        let mut locator = Self::default();
        for (path, parsed) in files {
            for def in &parsed.document.definitions {
                locator.defined.insert(format!("{path}#{}", definition_name(def)));
            }
            let targets = parsed
                .document
                .includes
                .iter()
                .map(|inc| resolve_include(path, &inc.path))
                .collect();
            locator.includes.insert(path.clone(), targets);
        }
        locator
    }
}

impl TypeLocator for ProjectLocator {
    fn locate(&self, from_file: &str, type_name: &str) -> Option<String> {
        let candidate = match type_name.rsplit_once('.') {
            None => format!("{from_file}#{type_name}"),
            Some((prefix, short)) => {
                let target = self
                    .includes
                    .get(from_file)?
                    .iter()
                    .find(|inc| path_stem(inc) == prefix)?;
                format!("{target}#{short}")
            }
        };
        self.defined.contains(&candidate).then_some(candidate)
    }
}

fn definition_name(def: &SyntaxDefinition) -> &str {
    match def {
        SyntaxDefinition::Struct(s) | SyntaxDefinition::Union(s) | SyntaxDefinition::Exception(s) => {
            &s.name
        }
        SyntaxDefinition::Enum(e) => &e.name,
        SyntaxDefinition::Const(c) => &c.name,
        SyntaxDefinition::Typedef(t) => &t.alias,
        SyntaxDefinition::Service(s) => &s.name,
    }
}

/// Path of `include` relative to the directory of `from_file`, normalized.
fn resolve_include(from_file: &str, include: &str) -> String {
    let mut parts: Vec<&str> = match from_file.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for segment in include.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

// =============================================================================
// Lowering
// =============================================================================

struct Lowerer<'a> {
    path: &'a str,
    source: &'a [u8],
    locator: &'a dyn TypeLocator,
}

/// Lower one parsed file. FQNs are `<rel_path>#<name>`, and
/// `<rel_path>#<Service>.<function>` for functions.
pub fn lower_document(
    document: &SyntaxDocument,
    source: &[u8],
    rel_path: &str,
    locator: &dyn TypeLocator,
) -> Result<File, LowerError> {
    let lowerer = Lowerer {
        path: rel_path,
        source,
        locator,
    };
    lowerer.file(document)
}

/// Lower every file of a project into one schema, ordered by path.
pub fn lower_project(
    files: &BTreeMap<String, ParsedFile>,
    locator: &dyn TypeLocator,
    sort: bool,
) -> Result<IdlSchema, LowerError> {
    let lowered = files
        .iter()
        .map(|(path, parsed)| lower_document(&parsed.document, &parsed.source, path, locator))
        .collect::<Result<Vec<_>, _>>()?;
    let mut schema = IdlSchema::new("thrift", lowered);
    if sort {
        schema.sort_definitions();
    }
    debug!(files = schema.files().len(), "lowered thrift project");
    Ok(schema)
}

impl Lowerer<'_> {
    fn file(&self, doc: &SyntaxDocument) -> Result<File, LowerError> {
        let mut file = File::new(self.path);
        file.syntax = "thrift".to_string();
        file.imports = doc
            .includes
            .iter()
            .map(|inc| Import {
                path: resolve_include(self.path, &inc.path),
                value: quote(&inc.path),
                comments: comments(&inc.comments),
                location: Some(inc.span),
            })
            .collect();
        file.namespaces = doc
            .namespaces
            .iter()
            .map(|ns| Namespace {
                scope: ns.scope.clone(),
                name: ns.name.clone(),
                annotations: annotations(&ns.annotations),
                comments: comments(&ns.comments),
                location: Some(ns.span),
            })
            .collect();

        let mut defs = Definitions::default();
        for def in &doc.definitions {
            match def {
                SyntaxDefinition::Struct(s) => defs.messages.push(self.message(s, MessageKind::Struct)?),
                SyntaxDefinition::Union(s) => defs.messages.push(self.message(s, MessageKind::Union)?),
                SyntaxDefinition::Exception(s) => {
                    defs.messages.push(self.message(s, MessageKind::Exception)?);
                }
                SyntaxDefinition::Enum(e) => defs.enums.push(self.enumeration(e)?),
                SyntaxDefinition::Const(c) => defs.constants.push(self.constant(c)?),
                SyntaxDefinition::Typedef(t) => defs.typedefs.push(self.typedef(t)?),
                SyntaxDefinition::Service(s) => defs.services.push(self.service(s)?),
            }
        }
        file.definitions = defs;
        Ok(file)
    }

    fn fqn(&self, name: &str) -> String {
        format!("{}#{name}", self.path)
    }

    fn content(&self, node: &str, span: Location) -> Result<String, LowerError> {
        let (start, end) = (span.start.offset, span.end.offset);
        let bytes = self
            .source
            .get(start..end)
            .ok_or_else(|| LowerError::SpanOutOfRange {
                file: self.path.to_string(),
                node: node.to_string(),
                start,
                end,
                len: self.source.len(),
            })?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    fn ty(&self, ty: &SyntaxType) -> Type {
        match ty {
            SyntaxType::Name(name) => match name.parse::<Primitive>() {
                Ok(primitive) => Type::primitive(primitive),
                Err(()) => Type::named(name.clone(), self.locator.locate(self.path, name)),
            },
            SyntaxType::List(inner) => Type::list(self.ty(inner)),
            SyntaxType::Set(inner) => Type::set(self.ty(inner)),
            SyntaxType::Map(key, value) => Type::map(self.ty(key), self.ty(value)),
        }
    }

    fn literal(&self, owner: &str, literal: &SyntaxLiteral) -> Result<ConstantValue, LowerError> {
        Ok(match literal {
            SyntaxLiteral::Str(s) => ConstantValue::quoted(s),
            SyntaxLiteral::Int(i) => ConstantValue::Int(*i),
            SyntaxLiteral::Double(d) if d.is_finite() => ConstantValue::Float(*d),
            SyntaxLiteral::Double(d) => {
                return Err(LowerError::Constant {
                    file: self.path.to_string(),
                    name: owner.to_string(),
                    source: ConstantError::Unsupported(d.to_string()),
                });
            }
            SyntaxLiteral::Identifier(id) if id == "true" => ConstantValue::Bool(true),
            SyntaxLiteral::Identifier(id) if id == "false" => ConstantValue::Bool(false),
            SyntaxLiteral::Identifier(id) => ConstantValue::Text(id.clone()),
            SyntaxLiteral::List(items) => ConstantValue::List(
                items
                    .iter()
                    .map(|item| self.literal(owner, item))
                    .collect::<Result<_, _>>()?,
            ),
            SyntaxLiteral::Map(entries) => ConstantValue::Map {
                entries: entries
                    .iter()
                    .map(|(k, v)| -> Result<ConstantEntry, LowerError> {
                        Ok(ConstantEntry {
                            key: self.literal(owner, k)?,
                            value: self.literal(owner, v)?,
                        })
                    })
                    .collect::<Result<_, LowerError>>()?,
            },
        })
    }

    /// Fields without an explicit id get negative ids, counting down from -1.
    fn fields(&self, fields: &[SyntaxField]) -> Result<Vec<Field>, LowerError> {
        let mut implicit = 0;
        fields
            .iter()
            .map(|f| -> Result<Field, LowerError> {
                let id = f.id.unwrap_or_else(|| {
                    implicit -= 1;
                    implicit
                });
                Ok(Field {
                    id,
                    name: f.name.clone(),
                    field_type: self.ty(&f.field_type),
                    requiredness: f.requiredness.unwrap_or_default(),
                    default: f
                        .default
                        .as_ref()
                        .map(|d| self.literal(&f.name, d))
                        .transpose()?,
                    annotations: annotations(&f.annotations),
                    comments: comments(&f.comments),
                    location: Some(f.span),
                })
            })
            .collect()
    }

    fn message(&self, s: &SyntaxStruct, kind: MessageKind) -> Result<Message, LowerError> {
        Ok(Message {
            name: s.name.clone(),
            fqn: self.fqn(&s.name),
            kind,
            fields: self.fields(&s.fields)?,
            annotations: annotations(&s.annotations),
            comments: comments(&s.comments),
            location: Some(s.span),
            content: Some(self.content(&s.name, s.span)?),
        })
    }

    fn enumeration(&self, e: &SyntaxEnum) -> Result<Enum, LowerError> {
        let mut next = 0;
        let values = e
            .values
            .iter()
            .map(|v| {
                let value = v.value.unwrap_or(next);
                next = value + 1;
                EnumMember {
                    name: v.name.clone(),
                    value,
                    annotations: annotations(&v.annotations),
                    comments: comments(&v.comments),
                }
            })
            .collect();
        Ok(Enum {
            name: e.name.clone(),
            fqn: self.fqn(&e.name),
            values,
            annotations: annotations(&e.annotations),
            comments: comments(&e.comments),
            location: Some(e.span),
            content: Some(self.content(&e.name, e.span)?),
        })
    }

    fn constant(&self, c: &SyntaxConst) -> Result<Constant, LowerError> {
        Ok(Constant {
            name: c.name.clone(),
            fqn: self.fqn(&c.name),
            const_type: self.ty(&c.const_type),
            value: self.literal(&c.name, &c.value)?,
            comments: comments(&c.comments),
            location: Some(c.span),
            content: Some(self.content(&c.name, c.span)?),
        })
    }

    fn typedef(&self, t: &SyntaxTypedef) -> Result<Typedef, LowerError> {
        Ok(Typedef {
            alias: t.alias.clone(),
            fqn: self.fqn(&t.alias),
            target: self.ty(&t.target),
            annotations: annotations(&t.annotations),
            comments: comments(&t.comments),
            location: Some(t.span),
            content: Some(self.content(&t.alias, t.span)?),
        })
    }

    fn service(&self, s: &SyntaxService) -> Result<Service, LowerError> {
        let functions = s
            .functions
            .iter()
            .map(|f| -> Result<Function, LowerError> {
                Ok(Function {
                    name: f.name.clone(),
                    fqn: self.fqn(&format!("{}.{}", s.name, f.name)),
                    return_type: f.return_type.as_ref().map_or_else(Type::void, |t| self.ty(t)),
                    oneway: f.oneway,
                    parameters: self.fields(&f.parameters)?,
                    throws: self.fields(&f.throws)?,
                    annotations: annotations(&f.annotations),
                    comments: comments(&f.comments),
                    location: Some(f.span),
                })
            })
            .collect::<Result<_, LowerError>>()?;
        Ok(Service {
            name: s.name.clone(),
            fqn: self.fqn(&s.name),
            extends: s.extends.clone(),
            functions,
            annotations: annotations(&s.annotations),
            comments: comments(&s.comments),
            location: Some(s.span),
            content: Some(self.content(&s.name, s.span)?),
        })
    }
}

fn comments(texts: &[String]) -> Vec<Comment> {
    texts
        .iter()
        .map(|text| Comment {
            text: text.clone(),
            location: None,
        })
        .collect()
}

fn annotations(annos: &[SyntaxAnnotation]) -> Vec<Annotation> {
    annos
        .iter()
        .map(|a| Annotation {
            name: a.name.clone(),
            value: a.value.as_deref().map(ConstantValue::quoted),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::ast::Position;

    fn span(source: &str, needle: &str) -> Location {
        let start = source.find(needle).unwrap();
        let end = start + needle.len();
        Location {
            start: Position {
                line: 1,
                column: start + 1,
                offset: start,
            },
            end: Position {
                line: 1,
                column: end + 1,
                offset: end,
            },
        }
    }

    const USER_SRC: &str = "struct User { 1: required string name }";
    const API_SRC: &str = "include \"user.thrift\"\n\
        typedef list<user.User> Users\n\
        const i32 LIMIT = 10\n\
        service Api { Users List(1: i32 limit = 5) }";

    fn project() -> BTreeMap<String, ParsedFile> {
        let user = SyntaxDocument {
            definitions: vec![SyntaxDefinition::Struct(SyntaxStruct {
                name: "User".into(),
                fields: vec![SyntaxField {
                    id: Some(1),
                    name: "name".into(),
                    requiredness: Some(Requiredness::Required),
                    field_type: SyntaxType::Name("string".into()),
                    default: None,
                    annotations: vec![SyntaxAnnotation {
                        name: "go.tag".into(),
                        value: Some("json:\"name\"".into()),
                    }],
                    comments: Vec::new(),
                    span: Location::default(),
                }],
                span: span(USER_SRC, USER_SRC),
                ..SyntaxStruct::default()
            })],
            ..SyntaxDocument::default()
        };
        let api = SyntaxDocument {
            includes: vec![SyntaxInclude {
                path: "user.thrift".into(),
                ..SyntaxInclude::default()
            }],
            definitions: vec![
                SyntaxDefinition::Typedef(SyntaxTypedef {
                    alias: "Users".into(),
                    target: SyntaxType::List(Box::new(SyntaxType::Name("user.User".into()))),
                    annotations: Vec::new(),
                    comments: vec!["// all users".into()],
                    span: span(API_SRC, "typedef list<user.User> Users"),
                }),
                SyntaxDefinition::Const(SyntaxConst {
                    name: "LIMIT".into(),
                    const_type: SyntaxType::Name("i32".into()),
                    value: SyntaxLiteral::Int(10),
                    comments: Vec::new(),
                    span: span(API_SRC, "const i32 LIMIT = 10"),
                }),
                SyntaxDefinition::Service(SyntaxService {
                    name: "Api".into(),
                    functions: vec![SyntaxFunction {
                        name: "List".into(),
                        return_type: Some(SyntaxType::Name("Users".into())),
                        parameters: vec![SyntaxField {
                            id: None,
                            name: "limit".into(),
                            requiredness: None,
                            field_type: SyntaxType::Name("i32".into()),
                            default: Some(SyntaxLiteral::Int(5)),
                            annotations: Vec::new(),
                            comments: Vec::new(),
                            span: Location::default(),
                        }],
                        ..SyntaxFunction::default()
                    }],
                    span: span(API_SRC, "service Api { Users List(1: i32 limit = 5) }"),
                    ..SyntaxService::default()
                }),
            ],
            ..SyntaxDocument::default()
        };
        BTreeMap::from([
            (
                "idl/api.thrift".to_string(),
                ParsedFile {
                    document: api,
                    source: API_SRC.as_bytes().to_vec(),
                },
            ),
            (
                "idl/user.thrift".to_string(),
                ParsedFile {
                    document: user,
                    source: USER_SRC.as_bytes().to_vec(),
                },
            ),
        ])
    }

    #[test]
    fn test_lower_project_resolves_cross_file_types() {
        let files = project();
        let locator = ProjectLocator::new(&files);
        let schema = lower_project(&files, &locator, false).unwrap();

        let api = schema.file("idl/api.thrift").unwrap();
        assert_eq!(api.imports[0].path, "idl/user.thrift");
        assert_eq!(api.imports[0].value, "\"user.thrift\"");

        let users = &api.definitions.typedefs[0];
        assert_eq!(users.fqn, "idl/api.thrift#Users");
        assert_eq!(users.content.as_deref(), Some("typedef list<user.User> Users"));
        assert_eq!(
            users.target.value_type().unwrap().fqn(),
            Some("idl/user.thrift#User")
        );

        let function = schema.find_functions("Api.List")[0];
        assert_eq!(function.fqn, "idl/api.thrift#Api.List");
        assert_eq!(function.return_type.fqn(), Some("idl/api.thrift#Users"));
        assert_eq!(function.parameters[0].id, -1);
        assert_eq!(function.parameters[0].requiredness, Requiredness::Default);
        assert_eq!(function.parameters[0].default, Some(ConstantValue::Int(5)));

        let user = schema.find_structs("User")[0];
        assert_eq!(user.content.as_deref(), Some(USER_SRC));
        assert_eq!(
            user.fields[0].annotations[0].value.as_ref().unwrap().string_value().unwrap(),
            "json:\"name\""
        );
    }

    #[test]
    fn test_span_outside_source_is_an_error() {
        let doc = SyntaxDocument {
            definitions: vec![SyntaxDefinition::Enum(SyntaxEnum {
                name: "Color".into(),
                span: Location {
                    start: Position::default(),
                    end: Position {
                        line: 1,
                        column: 99,
                        offset: 99,
                    },
                },
                ..SyntaxEnum::default()
            })],
            ..SyntaxDocument::default()
        };
        let err = lower_document(&doc, b"enum Color {}", "c.thrift", &ProjectLocator::default())
            .unwrap_err();
        assert!(matches!(err, LowerError::SpanOutOfRange { len: 13, .. }));
    }

    #[test]
    fn test_enum_values_continue_from_previous() {
        let source = "enum Color { RED, GREEN = 5, BLUE }";
        let member = |name: &str, value| SyntaxEnumValue {
            name: name.into(),
            value,
            ..SyntaxEnumValue::default()
        };
        let doc = SyntaxDocument {
            definitions: vec![SyntaxDefinition::Enum(SyntaxEnum {
                name: "Color".into(),
                values: vec![member("RED", None), member("GREEN", Some(5)), member("BLUE", None)],
                span: span(source, source),
                ..SyntaxEnum::default()
            })],
            ..SyntaxDocument::default()
        };
        let file = lower_document(&doc, source.as_bytes(), "c.thrift", &ProjectLocator::default())
            .unwrap();
        let values: Vec<_> = file.definitions.enums[0]
            .values
            .iter()
            .map(|v| (v.name.as_str(), v.value))
            .collect();
        assert_eq!(values, [("RED", 0), ("GREEN", 5), ("BLUE", 6)]);
    }

    #[test]
    fn test_resolve_include() {
        assert_eq!(resolve_include("a/b/c.thrift", "../d.thrift"), "a/d.thrift");
        assert_eq!(resolve_include("c.thrift", "./d.thrift"), "d.thrift");
    }
}

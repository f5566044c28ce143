//! Conversion state and recursive type synthesis.
//!
//! [`Converter`] owns every per-file `Definitions` bag while a document is
//! being converted. [`Converter::type_of`] maps one schema node to an IR
//! [`Type`], creating named structs and enums in the destination file as a
//! side effect.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use idlbridge_ir::{
    Comment, ConstantEntry, ConstantError, ConstantValue, Definitions, Enum, EnumMember, Field,
    Message, Primitive, Requiredness, Type, Typedef, renumber_fields,
};
use serde_yaml::Value;
use tracing::debug;

use crate::error::ConvertError;
use crate::naming::{
    MAIN_NAMESPACE, array_item_name, enum_member_name, identifier, sanitize_field_name,
    sanitize_name, sanitize_namespace, split_definition_name, to_pascal_case,
};
use crate::options::ConvertOptions;
use crate::resolve::{Resolver, definition_key, is_typedef_candidate, map_value_schema};
use crate::spec::{EnumValue, Schema, SchemaKind};

/// Mutable state of one document conversion.
pub struct Converter<'a> {
    pub(crate) options: &'a ConvertOptions,
    pub(crate) resolver: Resolver<'a>,
    definitions: &'a BTreeMap<String, Schema>,
    /// Sanitized input file stem; directory and main-file name of the output.
    prefix: String,
    pub(crate) base_namespace: String,
    pub(crate) files: BTreeMap<String, Definitions>,
    taken: BTreeMap<String, BTreeSet<String>>,
    /// Final names of the top-level definitions, by definition key.
    def_names: HashMap<String, String>,
    inline_enums: HashMap<(String, String), String>,
    /// Typedef candidates currently being inlined.
    inlining: Vec<String>,
    pub(crate) requests: BTreeMap<String, Vec<Message>>,
    pub(crate) request_names: HashMap<String, String>,
}

impl<'a> Converter<'a> {
    pub fn new(
        file_name: &str,
        definitions: &'a BTreeMap<String, Schema>,
        options: &'a ConvertOptions,
    ) -> Self {
        let prefix = input_stem(file_name);
        let base_namespace = options
            .namespace
            .as_deref()
            .filter(|ns| !ns.is_empty())
            .map_or_else(|| prefix.clone(), str::to_string);
        Self {
            options,
            resolver: Resolver::new(definitions, options.ref_policy),
            definitions,
            prefix,
            base_namespace,
            files: BTreeMap::new(),
            taken: BTreeMap::new(),
            def_names: HashMap::new(),
            inline_enums: HashMap::new(),
            inlining: Vec::new(),
            requests: BTreeMap::new(),
            request_names: HashMap::new(),
        }
    }

    /// Output path of a namespace: `<stem>/<stem>.thrift` for the main one,
    /// `<stem>/<ns>.thrift` otherwise.
    pub fn file_for(&self, namespace: &str) -> String {
        let name = if namespace == MAIN_NAMESPACE {
            self.prefix.as_str()
        } else {
            namespace
        };
        format!("{}/{name}.thrift", self.prefix)
    }

    pub fn main_file(&self) -> String {
        self.file_for(MAIN_NAMESPACE)
    }

    pub(crate) fn definitions_mut(&mut self, file: &str) -> &mut Definitions {
        self.files.entry(file.to_string()).or_default()
    }

    /// Reserve a definition name in `file`: `base`, else `base_2`, `base_3`, ...
    pub(crate) fn claim(&mut self, file: &str, base: &str) -> String {
        let names = self.taken.entry(file.to_string()).or_default();
        if names.insert(base.to_string()) {
            return base.to_string();
        }
        let name = (2..)
            .map(|n| format!("{base}_{n}"))
            .find(|candidate| !names.contains(candidate))
            .unwrap_or_else(|| base.to_string());
        names.insert(name.clone());
        debug!(file, base, name = %name, "definition name taken, renamed");
        name
    }

    /// Map a schema node to a type in `file`. Inline objects and enumerations
    /// become definitions named `PascalCase(parent) + PascalCase(field)`.
    pub fn type_of(
        &mut self,
        schema: Option<&Schema>,
        file: &str,
        parent: &str,
        field: &str,
    ) -> Result<Type, ConvertError> {
        let Some(schema) = schema else {
            return Ok(Type::void());
        };

        if let Some(reference) = &schema.ref_path {
            return self.ref_type(reference, file, parent, field);
        }

        if !schema.all_of.is_empty() {
            if let [single] = schema.all_of.as_slice()
                && single.ref_path.is_some()
                && schema.properties.is_empty()
            {
                return self.type_of(Some(single), file, parent, field);
            }
            let flat = self.resolver.effective_object(schema)?;
            return self.struct_type(&flat, file, parent, field);
        }

        if !schema.enum_values.is_empty() {
            return Ok(self.enum_type(schema, file, parent, field));
        }

        let ty = match schema.kind() {
            Some(SchemaKind::String | SchemaKind::Other) => Type::string(),
            Some(SchemaKind::Integer) => Type::primitive(match schema.format.as_deref() {
                Some("int64") => Primitive::I64,
                _ => Primitive::I32,
            }),
            Some(SchemaKind::Number) => Type::primitive(match schema.format.as_deref() {
                Some("float") => Primitive::Float,
                _ => Primitive::Double,
            }),
            Some(SchemaKind::Boolean) => Type::primitive(Primitive::Bool),
            Some(SchemaKind::Array) => {
                let item = match schema.items.as_deref() {
                    Some(items) => self.type_of(Some(items), file, parent, &array_item_name(field))?,
                    None => Type::string(),
                };
                Type::list(item)
            }
            None | Some(SchemaKind::Object) => {
                if !schema.properties.is_empty() {
                    return self.struct_type(schema, file, parent, field);
                }
                let value = match map_value_schema(schema) {
                    Some(value) if !value.is_unconstrained() => {
                        self.type_of(Some(value), file, parent, &format!("{field}Value"))?
                    }
                    _ => Type::string(),
                };
                Type::map(Type::string(), value)
            }
        };
        Ok(ty)
    }

    fn ref_type(
        &mut self,
        reference: &str,
        file: &str,
        parent: &str,
        field: &str,
    ) -> Result<Type, ConvertError> {
        let key = definition_key(reference);
        let Some(target) = self.resolver.resolve_checked(reference)? else {
            let (_, short) = split_definition_name(&key);
            return Ok(Type::named(identifier(short), None));
        };

        if is_typedef_candidate(target) && !self.inlining.contains(&key) {
            self.inlining.push(key);
            let inlined = self.type_of(Some(target), file, parent, field);
            self.inlining.pop();
            return inlined;
        }

        let (namespace, short) = split_definition_name(&key);
        let name = self
            .def_names
            .get(&key)
            .cloned()
            .unwrap_or_else(|| identifier(short));
        let target_file = self.file_for(&namespace);
        let fqn = format!("{target_file}#{name}");
        if target_file == file {
            return Ok(Type::named(name, Some(fqn)));
        }
        let stem = if namespace == MAIN_NAMESPACE {
            self.prefix.clone()
        } else {
            namespace
        };
        Ok(Type::named(format!("{stem}.{name}"), Some(fqn)))
    }

    fn enum_type(&mut self, schema: &Schema, file: &str, parent: &str, field: &str) -> Type {
        let base = sanitize_name(&format!(
            "{}{}",
            to_pascal_case(parent),
            to_pascal_case(field)
        ));
        let key = (file.to_string(), base.clone());
        if let Some(name) = self.inline_enums.get(&key) {
            return Type::named(name.clone(), Some(format!("{file}#{name}")));
        }
        let name = self.claim(file, &base);
        self.inline_enums.insert(key, name.clone());
        let definition = build_enum(&name, file, schema);
        self.definitions_mut(file).enums.push(definition);
        Type::named(name.clone(), Some(format!("{file}#{name}")))
    }

    fn struct_type(
        &mut self,
        schema: &Schema,
        file: &str,
        parent: &str,
        field: &str,
    ) -> Result<Type, ConvertError> {
        let base = sanitize_name(&format!(
            "{}{}",
            to_pascal_case(parent),
            to_pascal_case(field)
        ));
        let mut message = self.build_struct(&base, schema, file)?;
        if let Some(name) = self.matching_struct(file, &base, &mut message) {
            return Ok(Type::named(name.clone(), Some(format!("{file}#{name}"))));
        }
        let name = self.claim(file, &base);
        message.fqn = format!("{file}#{name}");
        message.name.clone_from(&name);
        self.definitions_mut(file).messages.push(message);
        Ok(Type::named(name.clone(), Some(format!("{file}#{name}"))))
    }

    /// An already synthesized struct among `base`, `base_2`, ... in `file`
    /// with the same shape as `message`.
    fn matching_struct(&self, file: &str, base: &str, message: &mut Message) -> Option<String> {
        let defs = self.files.get(file)?;
        let taken = self.taken.get(file)?;
        let candidates =
            std::iter::once(base.to_string()).chain((2..).map(|n| format!("{base}_{n}")));
        for candidate in candidates {
            if !taken.contains(&candidate) {
                break;
            }
            message.name.clone_from(&candidate);
            if defs.message(&candidate).is_some_and(|m| m.same_shape(message)) {
                return Some(candidate);
            }
        }
        None
    }

    /// A struct named `name` from the properties of an already flattened
    /// object schema. Property types are synthesized first.
    fn build_struct(
        &mut self,
        name: &str,
        schema: &Schema,
        file: &str,
    ) -> Result<Message, ConvertError> {
        let mut fields = Vec::with_capacity(schema.properties.len());
        for (property, prop_schema) in &schema.properties {
            let field_type = self.type_of(Some(prop_schema), file, name, property)?;
            let requiredness = Requiredness::from_required(schema.required.contains(property));
            let mut field = Field::new(sanitize_field_name(property), field_type, requiredness);
            field.default = self.default_for(property, prop_schema, &field.field_type, file)?;
            field.comments = describe(prop_schema.description.as_deref());
            fields.push(field);
        }
        renumber_fields(&mut fields);
        Ok(Message {
            name: name.to_string(),
            fqn: format!("{file}#{name}"),
            fields,
            comments: describe(schema.description.as_deref()),
            ..Message::default()
        })
    }

    /// Default literal of a property. A default of a synthesized enumeration
    /// is written as a reference to the matching member.
    fn default_for(
        &self,
        property: &str,
        schema: &Schema,
        field_type: &Type,
        file: &str,
    ) -> Result<Option<ConstantValue>, ConvertError> {
        let Some(value) = &schema.default else {
            return Ok(None);
        };
        if let Type::Named { name, .. } = field_type
            && let Some(member) = self.enum_default(schema, name, file, value)
        {
            return Ok(Some(ConstantValue::Text(format!("{name}.{member}"))));
        }
        convert_default(property, value)
    }

    fn enum_default(&self, schema: &Schema, name: &str, file: &str, value: &Value) -> Option<String> {
        let position = schema
            .enum_values
            .iter()
            .position(|candidate| enum_value_matches(candidate, value))?;
        let definition = self.files.get(file)?.enumeration(name)?;
        definition.values.get(position).map(|m| m.name.clone())
    }

    /// Emit every named schema into the file of its namespace. Names are
    /// reserved for all of them before any type is synthesized.
    pub fn process_schemas(&mut self) -> Result<(), ConvertError> {
        let definitions = self.definitions;
        for key in definitions.keys() {
            let (namespace, short) = split_definition_name(key);
            let file = self.file_for(&namespace);
            let name = self.claim(&file, &identifier(short));
            self.def_names.insert(key.clone(), name);
        }

        for (key, schema) in definitions {
            let (namespace, _) = split_definition_name(key);
            let file = self.file_for(&namespace);
            let Some(name) = self.def_names.get(key).cloned() else {
                continue;
            };
            let fqn = format!("{file}#{name}");
            let comments = describe(schema.description.as_deref());

            if !schema.enum_values.is_empty() {
                let mut definition = build_enum(&name, &file, schema);
                definition.comments = comments;
                self.definitions_mut(&file).enums.push(definition);
                self.inline_enums.insert((file.clone(), name.clone()), name);
            } else if is_typedef_candidate(schema) {
                self.inlining.push(key.clone());
                let target = self.type_of(Some(schema), &file, &name, "");
                self.inlining.pop();
                let definition = Typedef {
                    alias: name,
                    fqn,
                    target: target?,
                    comments,
                    ..Typedef::default()
                };
                self.definitions_mut(&file).typedefs.push(definition);
            } else {
                let flat = self.resolver.effective_object(schema)?;
                let message = self.build_struct(&name, &flat, &file)?;
                self.definitions_mut(&file).messages.push(message);
            }
            debug!(definition = %key, file = %file, "converted named schema");
        }
        Ok(())
    }

    pub(crate) fn prefix(&self) -> &str {
        &self.prefix
    }
}

/// Sanitized stem of the input file name.
fn input_stem(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let stem = base.rsplit_once('.').map_or(base, |(stem, _)| stem);
    let stem = sanitize_namespace(stem);
    if stem.is_empty() {
        "idl".to_string()
    } else {
        stem
    }
}

pub(crate) fn describe(description: Option<&str>) -> Vec<Comment> {
    description.map(Comment::from_description).unwrap_or_default()
}

/// An enumeration whose members follow `x-enum-varnames` when it lines up
/// with the values, else `<Name>_<value>`.
///
/// Integer values are kept, floats are floored, anything else takes its
/// position.
fn build_enum(name: &str, file: &str, schema: &Schema) -> Enum {
    let named = schema.enum_var_names.len() == schema.enum_values.len();
    let values = schema
        .enum_values
        .iter()
        .enumerate()
        .map(|(position, value)| {
            let member = if named {
                enum_member_name(&schema.enum_var_names[position])
            } else {
                enum_member_name(&format!("{name}_{value}"))
            };
            let value = match value {
                EnumValue::Integer(i) => *i,
                EnumValue::Float(f) => f.floor() as i64,
                _ => position as i64,
            };
            EnumMember {
                name: member,
                value,
                ..EnumMember::default()
            }
        })
        .collect();
    Enum {
        name: name.to_string(),
        fqn: format!("{file}#{name}"),
        values,
        comments: describe(schema.description.as_deref()),
        ..Enum::default()
    }
}

fn enum_value_matches(candidate: &EnumValue, value: &Value) -> bool {
    match (candidate, value) {
        (EnumValue::String(a), Value::String(b)) => a == b,
        (EnumValue::Integer(a), Value::Number(b)) => b.as_i64() == Some(*a),
        (EnumValue::Float(a), Value::Number(b)) => b.as_f64() == Some(*a),
        (EnumValue::Bool(a), Value::Bool(b)) => a == b,
        _ => false,
    }
}

/// Literal for a schema `default`; `null` means no default.
pub(crate) fn convert_default(
    name: &str,
    value: &Value,
) -> Result<Option<ConstantValue>, ConvertError> {
    if value.is_null() {
        return Ok(None);
    }
    literal(value)
        .map(Some)
        .map_err(|source| ConvertError::DefaultValue {
            name: name.to_string(),
            source,
        })
}

fn literal(value: &Value) -> Result<ConstantValue, ConstantError> {
    match value {
        Value::Null => Err(ConstantError::Unsupported("null".to_string())),
        Value::Bool(b) => Ok(ConstantValue::Bool(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(ConstantValue::Int(i))
            } else if n.is_u64() {
                Err(ConstantError::Unsupported(format!("integer {n} does not fit in i64")))
            } else {
                n.as_f64()
                    .map(ConstantValue::Float)
                    .ok_or_else(|| ConstantError::Unsupported(n.to_string()))
            }
        }
        Value::String(s) => Ok(ConstantValue::quoted(s)),
        Value::Sequence(items) => items
            .iter()
            .map(literal)
            .collect::<Result<Vec<_>, _>>()
            .map(ConstantValue::List),
        Value::Mapping(mapping) => {
            let mut entries = Vec::with_capacity(mapping.len());
            for (key, value) in mapping {
                let Value::String(key) = key else {
                    return Err(ConstantError::Unsupported(format!("map key {key:?}")));
                };
                entries.push((key.clone(), literal(value)?));
            }
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Ok(ConstantValue::Map {
                entries: entries
                    .into_iter()
                    .map(|(key, value)| ConstantEntry {
                        key: ConstantValue::quoted(&key),
                        value,
                    })
                    .collect(),
            })
        }
        Value::Tagged(tagged) => Err(ConstantError::Unsupported(format!("tagged value {}", tagged.tag))),
    }
}

//! Swagger 2 / OpenAPI 3 document structs for serde deserialization.
//!
//! Both dialects are read into one model. Dialect-specific locations (the
//! schema table, request bodies, response schemas) are normalized here so the
//! converter works on a single shape.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::error::ConvertError;

/// Source dialect of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Swagger 2.x: schemas under `definitions`, bodies as `in: body` parameters.
    Swagger2,
    /// OpenAPI 3.x: schemas under `components.schemas`, `requestBody`.
    OpenApi3,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Swagger2 => "swagger 2",
            Self::OpenApi3 => "openapi 3",
        })
    }
}

/// One parsed document.
#[derive(Debug, Clone)]
pub struct SpecDocument {
    pub dialect: Dialect,
    /// Value of the version field, empty when the dialect was guessed.
    pub version: String,
    pub paths: BTreeMap<String, PathItem>,
    /// Named schemas keyed by their definition name.
    pub definitions: BTreeMap<String, Schema>,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    paths: BTreeMap<String, PathItem>,
    components: Option<Components>,
    #[serde(default)]
    definitions: BTreeMap<String, Schema>,
}

/// Components section containing reusable schemas.
#[derive(Debug, Deserialize)]
struct Components {
    #[serde(default)]
    schemas: BTreeMap<String, Schema>,
}

/// HTTP methods that produce service functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Patch,
}

impl HttpMethod {
    /// Visiting order for the methods of one path.
    pub const ORDER: [Self; 5] = [Self::Get, Self::Put, Self::Post, Self::Delete, Self::Patch];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Put => "put",
            Self::Post => "post",
            Self::Delete => "delete",
            Self::Patch => "patch",
        }
    }
}

/// A path item containing operations for different HTTP methods.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathItem {
    pub get: Option<Operation>,
    pub put: Option<Operation>,
    pub post: Option<Operation>,
    pub delete: Option<Operation>,
    pub patch: Option<Operation>,
    /// Path-level parameters shared by all operations.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl PathItem {
    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
        }
    }
}

/// An API operation (endpoint).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub summary: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    pub request_body: Option<RequestBody>,
    #[serde(default)]
    pub responses: BTreeMap<StatusCode, Response>,
}

impl Operation {
    /// Path-level parameters overridden by operation parameters with the same
    /// name and location, in declaration order.
    pub fn effective_parameters<'a>(&'a self, item: &'a PathItem) -> Vec<&'a Parameter> {
        let mut params: Vec<&Parameter> = item
            .parameters
            .iter()
            .filter(|shared| {
                !self
                    .parameters
                    .iter()
                    .any(|p| p.name == shared.name && p.location == shared.location)
            })
            .collect();
        params.extend(&self.parameters);
        params
    }

    /// Description for the generated function, falling back to the summary.
    pub fn doc(&self) -> Option<&str> {
        self.description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .or(self.summary.as_deref())
    }
}

/// A response status key. YAML documents often write these as integers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct StatusCode(pub String);

impl StatusCode {
    pub fn is_success(&self) -> bool {
        self.0.starts_with('2')
    }
}

impl<'de> Deserialize<'de> for StatusCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CodeVisitor;

        impl Visitor<'_> for CodeVisitor {
            type Value = StatusCode;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a response status code")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<StatusCode, E> {
                Ok(StatusCode(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<StatusCode, E> {
                Ok(StatusCode(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<StatusCode, E> {
                Ok(StatusCode(v.to_string()))
            }
        }

        deserializer.deserialize_any(CodeVisitor)
    }
}

/// Where a parameter travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Cookie,
    Form,
    Body,
    RawBody,
}

impl ParamLocation {
    /// Location for an `in` value; unknown locations yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        Some(match value {
            "path" => Self::Path,
            "query" => Self::Query,
            "header" => Self::Header,
            "cookie" => Self::Cookie,
            "formData" => Self::Form,
            "body" => Self::Body,
            "raw_body" => Self::RawBody,
            _ => return None,
        })
    }

    /// Name of the field annotation recording this location.
    pub fn annotation(self) -> &'static str {
        match self {
            Self::Path => "api.path",
            Self::Query => "api.query",
            Self::Header => "api.header",
            Self::Cookie => "api.cookie",
            Self::Form => "api.form",
            Self::Body => "api.body",
            Self::RawBody => "api.raw_body",
        }
    }
}

/// A parameter. Swagger 2 non-body parameters describe their type inline.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    pub schema: Option<Schema>,
    #[serde(rename = "type")]
    pub param_type: Option<String>,
    pub format: Option<String>,
    pub items: Option<Box<Schema>>,
    #[serde(rename = "enum", default)]
    pub enum_values: Vec<EnumValue>,
    #[serde(rename = "x-enum-varnames", default)]
    pub enum_var_names: Vec<String>,
}

impl Parameter {
    /// The parameter's schema; inline Swagger 2 typing is turned into one,
    /// defaulting to `string`.
    pub fn effective_schema(&self) -> Schema {
        if let Some(schema) = &self.schema {
            return schema.clone();
        }
        Schema {
            schema_type: Some(SchemaType::Single(
                self.param_type.clone().unwrap_or_else(|| "string".to_string()),
            )),
            format: self.format.clone(),
            items: self.items.clone(),
            enum_values: self.enum_values.clone(),
            enum_var_names: self.enum_var_names.clone(),
            description: self.description.clone(),
            ..Schema::default()
        }
    }
}

/// A request body definition.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestBody {
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub content: BTreeMap<String, MediaType>,
}

/// A response definition.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Response {
    pub description: Option<String>,
    #[serde(default)]
    pub content: BTreeMap<String, MediaType>,
    /// Swagger 2 response schema.
    pub schema: Option<Schema>,
}

impl Response {
    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref().or_else(|| json_schema(&self.content))
    }
}

/// Media type content (e.g., application/json).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaType {
    pub schema: Option<Schema>,
}

/// Schema of the `application/json` entry, else of the first entry that has one.
pub fn json_schema(content: &BTreeMap<String, MediaType>) -> Option<&Schema> {
    content
        .get("application/json")
        .and_then(|m| m.schema.as_ref())
        .or_else(|| content.values().find_map(|m| m.schema.as_ref()))
}

/// The request body of an operation, from either dialect.
#[derive(Debug, Clone, Copy)]
pub struct Body<'a> {
    pub schema: &'a Schema,
    pub required: bool,
    pub description: Option<&'a str>,
}

impl Operation {
    /// The request body: OpenAPI 3 `requestBody`, else a Swagger 2 `in: body`
    /// parameter.
    pub fn body<'a>(&'a self, params: &[&'a Parameter]) -> Option<Body<'a>> {
        if let Some(body) = &self.request_body {
            return json_schema(&body.content).map(|schema| Body {
                schema,
                required: body.required,
                description: body.description.as_deref(),
            });
        }
        params
            .iter()
            .filter(|p| p.location == "body")
            .find_map(|p| {
                p.schema.as_ref().map(|schema| Body {
                    schema,
                    required: p.required,
                    description: p.description.as_deref(),
                })
            })
    }
}

/// JSON Schema definition used in both dialects.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// Reference to another schema.
    #[serde(rename = "$ref")]
    pub ref_path: Option<String>,

    /// The type of the schema (string, number, integer, boolean, object, array).
    #[serde(rename = "type")]
    pub schema_type: Option<SchemaType>,

    /// Format hint (e.g., int64, float).
    pub format: Option<String>,

    pub description: Option<String>,

    /// Properties for object types.
    #[serde(default)]
    pub properties: BTreeMap<String, Schema>,

    /// Required property names for object types.
    #[serde(default)]
    pub required: Vec<String>,

    /// Item schema for array types.
    pub items: Option<Box<Schema>>,

    #[serde(rename = "enum", default)]
    pub enum_values: Vec<EnumValue>,

    /// Member names aligned by position with `enum`.
    #[serde(rename = "x-enum-varnames", default)]
    pub enum_var_names: Vec<String>,

    /// Intersection type (all of these schemas combined).
    #[serde(rename = "allOf", default)]
    pub all_of: Vec<Schema>,

    /// Additional properties for object types (for map types).
    pub additional_properties: Option<AdditionalProperties>,

    /// Default value for the schema.
    pub default: Option<Value>,
}

/// Closed set of schema kinds the converter dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    /// A type name outside the JSON Schema core set, e.g. Swagger 2 `file`.
    Other,
}

impl Schema {
    /// Declared kind; `None` when the schema has no `type`.
    pub fn kind(&self) -> Option<SchemaKind> {
        let name = match self.schema_type.as_ref()? {
            SchemaType::Single(name) => name.as_str(),
            SchemaType::Multiple(names) => names.iter().find(|n| *n != "null")?.as_str(),
        };
        Some(match name {
            "string" => SchemaKind::String,
            "integer" => SchemaKind::Integer,
            "number" => SchemaKind::Number,
            "boolean" => SchemaKind::Boolean,
            "array" => SchemaKind::Array,
            "object" => SchemaKind::Object,
            "" => return None,
            _ => SchemaKind::Other,
        })
    }

    /// Whether the schema is an object (declared or implied by a missing type).
    pub fn is_object_like(&self) -> bool {
        matches!(self.kind(), None | Some(SchemaKind::Object))
    }

    /// A schema that places no constraint on its values.
    pub fn is_unconstrained(&self) -> bool {
        self.ref_path.is_none()
            && self.schema_type.is_none()
            && self.properties.is_empty()
            && self.items.is_none()
            && self.enum_values.is_empty()
            && self.all_of.is_empty()
            && self.additional_properties.is_none()
    }
}

/// Schema type can be a single type or an array of types (for nullable).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    Single(String),
    Multiple(Vec<String>),
}

/// Enum value can be string, integer, float, boolean, or null.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EnumValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Null => f.write_str("null"),
        }
    }
}

/// Additional properties can be a boolean or a schema.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Bool(#[allow(dead_code)] bool),
    Schema(Box<Schema>),
}

// =============================================================================
// Parsing and dialect detection
// =============================================================================

/// Version string of `key`; YAML may give a number (`swagger: 2.0`).
fn version_field(root: &Mapping, key: &str) -> Option<String> {
    match root.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn detect_dialect(file: &str, root: &Mapping) -> Result<(Dialect, String), ConvertError> {
    if let Some(version) = version_field(root, "swagger")
        && (version == "2" || version.starts_with("2."))
    {
        return Ok((Dialect::Swagger2, version));
    }
    if let Some(version) = version_field(root, "openapi")
        && version.starts_with("3.")
    {
        return Ok((Dialect::OpenApi3, version));
    }

    if !root.contains_key("paths") {
        return Err(ConvertError::MissingVersion {
            file: file.to_string(),
            reason: "no 'paths' section either",
        });
    }
    if root.contains_key("components") {
        debug!(file, "no version field, guessing openapi 3 from 'components'");
        return Ok((Dialect::OpenApi3, String::new()));
    }
    if root.contains_key("definitions") {
        debug!(file, "no version field, guessing swagger 2 from 'definitions'");
        return Ok((Dialect::Swagger2, String::new()));
    }
    Err(ConvertError::MissingVersion {
        file: file.to_string(),
        reason: "neither 'components' nor 'definitions' is present",
    })
}

impl SpecDocument {
    /// Parse JSON or YAML bytes and detect the dialect.
    pub fn parse(file: &str, bytes: &[u8]) -> Result<Self, ConvertError> {
        let value: Value = serde_yaml::from_slice(bytes).map_err(|source| ConvertError::Parse {
            file: file.to_string(),
            source,
        })?;
        let Value::Mapping(root) = &value else {
            return Err(ConvertError::NotADocument {
                file: file.to_string(),
            });
        };
        let (dialect, version) = detect_dialect(file, root)?;
        debug!(file, %dialect, version = %version, "detected document dialect");

        let raw: RawDocument =
            serde_yaml::from_value(value).map_err(|source| ConvertError::Unmarshal {
                file: file.to_string(),
                dialect,
                source,
            })?;
        let definitions = match dialect {
            Dialect::OpenApi3 => raw.components.map(|c| c.schemas).unwrap_or_default(),
            Dialect::Swagger2 => raw.definitions,
        };
        Ok(Self {
            dialect,
            version,
            paths: raw.paths,
            definitions,
        })
    }
}

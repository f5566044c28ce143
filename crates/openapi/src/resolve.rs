//! `$ref` resolution, `allOf` flattening and typedef-candidate detection.

use std::collections::BTreeMap;

use tracing::warn;

use crate::error::ConvertError;
use crate::options::RefPolicy;
use crate::spec::{AdditionalProperties, Schema, SchemaKind};

const REF_PREFIXES: [&str; 2] = ["#/components/schemas/", "#/definitions/"];

/// Definition name a `$ref` points at, with dialect prefixes removed and
/// JSON-pointer escapes decoded.
pub fn definition_key(reference: &str) -> String {
    let stripped = REF_PREFIXES
        .iter()
        .find_map(|prefix| reference.strip_prefix(prefix))
        .unwrap_or(reference);
    stripped.replace("~1", "/").replace("~0", "~")
}

/// Whether a referenced schema is a pure alias that gets inlined at the
/// point of reference: no properties and a primitive/array kind, or an open
/// map. Enumerations are named types and never qualify.
pub fn is_typedef_candidate(schema: &Schema) -> bool {
    if !schema.properties.is_empty() || !schema.enum_values.is_empty() {
        return false;
    }
    match schema.kind() {
        Some(
            SchemaKind::String
            | SchemaKind::Integer
            | SchemaKind::Number
            | SchemaKind::Boolean
            | SchemaKind::Array,
        ) => true,
        None | Some(SchemaKind::Object) => schema.additional_properties.is_some(),
        Some(SchemaKind::Other) => false,
    }
}

/// Looks up references in one document's definition table.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    definitions: &'a BTreeMap<String, Schema>,
    policy: RefPolicy,
}

impl<'a> Resolver<'a> {
    pub fn new(definitions: &'a BTreeMap<String, Schema>, policy: RefPolicy) -> Self {
        Self {
            definitions,
            policy,
        }
    }

    /// The referenced schema, or `None` when the reference dangles.
    pub fn resolve(&self, reference: &str) -> Option<&'a Schema> {
        self.definitions.get(&definition_key(reference))
    }

    /// Like [`Resolver::resolve`], but applies the reference policy to
    /// dangling references: strict fails, lenient logs and yields `None`.
    pub fn resolve_checked(&self, reference: &str) -> Result<Option<&'a Schema>, ConvertError> {
        match self.resolve(reference) {
            Some(schema) => Ok(Some(schema)),
            None if self.policy == RefPolicy::Strict => Err(ConvertError::DanglingRef {
                reference: reference.to_string(),
            }),
            None => {
                warn!(reference, "unresolved $ref, keeping the name as written");
                Ok(None)
            }
        }
    }

    /// Merge composed schemas into one.
    ///
    /// Members are taken in list order: a `$ref` member is resolved first, a
    /// member with its own `allOf` is flattened first. Later properties
    /// replace earlier ones with the same name, required names are unioned in
    /// first-seen order, and the first non-empty description is kept.
    pub fn flatten_all_of(&self, schemas: &[Schema]) -> Result<Schema, ConvertError> {
        let mut merged = Schema::default();
        let mut visiting = Vec::new();
        for member in schemas {
            self.merge_member(member, &mut merged, &mut visiting)?;
        }
        Ok(merged)
    }

    /// An object schema with its `allOf` members and its own properties
    /// merged, own properties last.
    pub fn effective_object(&self, schema: &Schema) -> Result<Schema, ConvertError> {
        let mut merged = self.flatten_all_of(std::slice::from_ref(schema))?;
        merged.additional_properties = schema.additional_properties.clone();
        Ok(merged)
    }

    fn merge_member(
        &self,
        member: &Schema,
        into: &mut Schema,
        visiting: &mut Vec<String>,
    ) -> Result<(), ConvertError> {
        if let Some(reference) = &member.ref_path {
            let key = definition_key(reference);
            if visiting.contains(&key) {
                warn!(reference = %reference, "cyclic allOf composition, skipping member");
                return Ok(());
            }
            let Some(target) = self.resolve_checked(reference)? else {
                return Ok(());
            };
            visiting.push(key);
            self.merge_member(target, into, visiting)?;
            visiting.pop();
            return Ok(());
        }

        for nested in &member.all_of {
            self.merge_member(nested, into, visiting)?;
        }
        for (name, property) in &member.properties {
            into.properties.insert(name.clone(), property.clone());
        }
        for name in &member.required {
            if !into.required.contains(name) {
                into.required.push(name.clone());
            }
        }
        if into.description.as_deref().is_none_or(str::is_empty)
            && let Some(description) = member.description.as_deref().filter(|d| !d.is_empty())
        {
            into.description = Some(description.to_string());
        }
        Ok(())
    }
}

/// `additionalProperties` holding a schema.
pub fn map_value_schema(schema: &Schema) -> Option<&Schema> {
    match schema.additional_properties.as_ref()? {
        AdditionalProperties::Schema(value) => Some(value),
        AdditionalProperties::Bool(_) => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn schema(json: &str) -> Schema {
        serde_json::from_str(json).unwrap()
    }

    fn definitions() -> BTreeMap<String, Schema> {
        BTreeMap::from([
            (
                "Base".to_string(),
                schema(
                    r#"{"description": "base", "required": ["id"],
                        "properties": {"id": {"type": "integer"}, "name": {"type": "integer"}}}"#,
                ),
            ),
            (
                "Named".to_string(),
                schema(
                    r##"{"allOf": [{"$ref": "#/components/schemas/Base"}],
                        "properties": {"name": {"type": "string"}}, "required": ["name"]}"##,
                ),
            ),
            (
                "Loop".to_string(),
                schema(r##"{"allOf": [{"$ref": "#/definitions/Loop"}], "properties": {"x": {"type": "string"}}}"##),
            ),
        ])
    }

    fn names(s: &Schema) -> Vec<&str> {
        s.properties.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_resolve_normalizes_prefixes() {
        let defs = definitions();
        let resolver = Resolver::new(&defs, RefPolicy::Lenient);
        assert!(resolver.resolve("#/components/schemas/Base").is_some());
        assert!(resolver.resolve("#/definitions/Base").is_some());
        assert!(resolver.resolve("#/definitions/Missing").is_none());
        assert_eq!(definition_key("#/definitions/a~1b"), "a/b");
    }

    #[test]
    fn test_dangling_ref_policy() {
        let defs = definitions();
        let lenient = Resolver::new(&defs, RefPolicy::Lenient);
        assert!(lenient.resolve_checked("#/definitions/Nope").unwrap().is_none());
        let strict = Resolver::new(&defs, RefPolicy::Strict);
        let err = strict.resolve_checked("#/definitions/Nope").unwrap_err();
        assert!(matches!(err, ConvertError::DanglingRef { ref reference } if reference == "#/definitions/Nope"));
    }

    #[test]
    fn test_flatten_later_members_override() {
        let defs = definitions();
        let resolver = Resolver::new(&defs, RefPolicy::Lenient);
        let flat = resolver
            .flatten_all_of(&[
                schema(r##"{"$ref": "#/definitions/Base"}"##),
                schema(r#"{"description": "second", "required": ["name", "id"], "properties": {"name": {"type": "string"}}}"#),
            ])
            .unwrap();
        assert_eq!(names(&flat), ["id", "name"]);
        assert_eq!(flat.properties["name"].kind(), Some(SchemaKind::String));
        assert_eq!(flat.required, ["id", "name"]);
        assert_eq!(flat.description.as_deref(), Some("base"));
    }

    #[test]
    fn test_flatten_nested_equals_flat_list() {
        let defs = definitions();
        let resolver = Resolver::new(&defs, RefPolicy::Lenient);
        let x = schema(r#"{"properties": {"a": {"type": "string"}}, "required": ["a"]}"#);
        let y = schema(r#"{"properties": {"b": {"type": "string"}}, "description": "y"}"#);
        let z = schema(r#"{"properties": {"a": {"type": "integer"}}, "required": ["c"]}"#);
        let nested = Schema {
            all_of: vec![y.clone(), z.clone()],
            ..Schema::default()
        };
        let a = resolver.flatten_all_of(&[x.clone(), nested]).unwrap();
        let b = resolver.flatten_all_of(&[x, y, z]).unwrap();
        assert_eq!(names(&a), names(&b));
        assert_eq!(a.required, b.required);
        assert_eq!(a.description, b.description);
        assert_eq!(a.properties["a"].kind(), Some(SchemaKind::Integer));
    }

    #[test]
    fn test_flatten_is_idempotent_on_flat_schema() {
        let defs = definitions();
        let resolver = Resolver::new(&defs, RefPolicy::Lenient);
        let flat = resolver.flatten_all_of(&[defs["Base"].clone()]).unwrap();
        let again = resolver.flatten_all_of(&[flat.clone()]).unwrap();
        assert_eq!(names(&flat), names(&again));
        assert_eq!(flat.required, again.required);
        assert_eq!(flat.description, again.description);
    }

    #[test]
    fn test_effective_object_applies_own_properties_last() {
        let defs = definitions();
        let resolver = Resolver::new(&defs, RefPolicy::Lenient);
        let named = resolver.effective_object(&defs["Named"]).unwrap();
        assert_eq!(names(&named), ["id", "name"]);
        assert_eq!(named.properties["name"].kind(), Some(SchemaKind::String));
        assert_eq!(named.required, ["id", "name"]);
    }

    #[test]
    fn test_cyclic_composition_terminates() {
        let defs = definitions();
        let resolver = Resolver::new(&defs, RefPolicy::Lenient);
        let flat = resolver.effective_object(&defs["Loop"]).unwrap();
        assert_eq!(names(&flat), ["x"]);
    }

    #[test]
    fn test_typedef_candidates() {
        assert!(is_typedef_candidate(&schema(r#"{"type": "string"}"#)));
        assert!(is_typedef_candidate(&schema(r#"{"type": "array", "items": {"type": "string"}}"#)));
        assert!(is_typedef_candidate(&schema(r#"{"additionalProperties": true}"#)));
        assert!(!is_typedef_candidate(&schema(r#"{"type": "object"}"#)));
        assert!(!is_typedef_candidate(&schema(
            r#"{"type": "object", "properties": {"a": {"type": "string"}}}"#
        )));
        assert!(!is_typedef_candidate(&schema(r#"{"type": "string", "enum": ["a"]}"#)));
    }
}

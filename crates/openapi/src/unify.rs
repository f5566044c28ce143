//! Merging of request messages produced under the same name.

use std::collections::BTreeMap;

use idlbridge_ir::{Field, Message, renumber_fields};
use tracing::debug;

/// One message per request name.
///
/// A single variant is kept as is. Several variants are merged into their
/// superset: fields are unioned by name, the first occurrence of a field is
/// kept and later occurrences only add annotations it lacks. The merged
/// fields are sorted by name and renumbered from 1.
pub fn unify_requests(requests: BTreeMap<String, Vec<Message>>) -> Vec<Message> {
    requests
        .into_iter()
        .filter_map(|(name, variants)| {
            let mut variants = variants.into_iter();
            let first = variants.next()?;
            Some(variants.fold(first, |merged, next| merge(&name, merged, next)))
        })
        .collect()
}

fn merge(name: &str, mut base: Message, other: Message) -> Message {
    if base.same_shape(&other) {
        return base;
    }
    debug!(request = name, "merging request variants");
    for field in other.fields {
        match base.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => add_missing_annotations(existing, field),
            None => base.fields.push(field),
        }
    }
    base.fields.sort_by(|a, b| a.name.cmp(&b.name));
    renumber_fields(&mut base.fields);
    base
}

fn add_missing_annotations(existing: &mut Field, field: Field) {
    for annotation in field.annotations {
        if !existing.has_annotation(&annotation.name) {
            existing.annotations.push(annotation);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use idlbridge_ir::{Annotation, Requiredness, Type};
    use pretty_assertions::assert_eq;

    fn request(fields: &[(&str, &str)]) -> Message {
        let mut fields: Vec<Field> = fields
            .iter()
            .map(|(name, location)| {
                let mut field = Field::new(*name, Type::string(), Requiredness::Optional);
                field.annotations.push(Annotation::quoted(*location, name));
                field
            })
            .collect();
        renumber_fields(&mut fields);
        Message {
            name: "R".into(),
            fields,
            ..Message::default()
        }
    }

    #[test]
    fn test_single_variant_is_unchanged() {
        let only = request(&[("z", "api.query"), ("a", "api.query")]);
        let unified = unify_requests(BTreeMap::from([("R".to_string(), vec![only.clone()])]));
        assert_eq!(unified, [only]);
    }

    #[test]
    fn test_superset_keeps_every_field_and_annotation() {
        let unified = unify_requests(BTreeMap::from([(
            "R".to_string(),
            vec![
                request(&[("a", "api.query"), ("b", "api.query")]),
                request(&[("b", "api.body"), ("c", "api.header")]),
            ],
        )]));
        assert_eq!(unified.len(), 1);
        let fields: Vec<_> = unified[0].fields.iter().map(|f| (f.id, f.name.as_str())).collect();
        assert_eq!(fields, [(1, "a"), (2, "b"), (3, "c")]);
        assert_eq!(
            unified[0].fields[1].annotations,
            [Annotation::quoted("api.query", "b"), Annotation::quoted("api.body", "b")]
        );
    }

    #[test]
    fn test_annotation_names_stay_unique() {
        let mut other = request(&[("a", "api.query"), ("b", "api.query")]);
        other.fields[0].annotations = vec![Annotation::quoted("api.query", "a.alt")];
        let unified = unify_requests(BTreeMap::from([(
            "R".to_string(),
            vec![request(&[("a", "api.query")]), other],
        )]));
        assert_eq!(unified[0].fields.len(), 2);
        assert_eq!(unified[0].fields[0].annotations, [Annotation::quoted("api.query", "a")]);
    }

    #[test]
    fn test_identical_variants_collapse() {
        let a = request(&[("a", "api.query")]);
        let unified = unify_requests(BTreeMap::from([("R".to_string(), vec![a.clone(), a.clone(), a.clone()])]));
        assert_eq!(unified, [a]);
    }
}

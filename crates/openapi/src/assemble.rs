//! Final assembly of the converted files: namespaces, includes, ordering.

use std::collections::BTreeSet;

use idlbridge_ir::{Definitions, File, IdlSchema, Import, Namespace, Type, split_fqn};
use tracing::debug;

use crate::types::Converter;
use crate::unify::unify_requests;

impl Converter<'_> {
    /// Consume the converter and build the schema.
    ///
    /// Request variants are unified into the main file first. Every file then
    /// gets one namespace line and one include per other file its services,
    /// messages and typedefs reference. The main file is always present.
    pub fn finish(mut self, version: &str) -> IdlSchema {
        let main = self.main_file();
        let requests = std::mem::take(&mut self.requests);
        let unified = unify_requests(requests);
        self.definitions_mut(&main).messages.extend(unified);

        let scope = self.options.namespace_scope().to_string();
        let files = std::mem::take(&mut self.files);
        let files = files
            .into_iter()
            .map(|(path, definitions)| {
                let mut file = File::new(path);
                file.syntax = version.to_string();
                file.namespaces.push(Namespace {
                    scope: scope.clone(),
                    name: self.namespace_name(file.stem()),
                    ..Namespace::default()
                });
                file.imports = imports(&file.path, &definitions);
                debug!(file = %file.path, includes = file.imports.len(), "assembled file");
                file.definitions = definitions;
                file
            })
            .collect();

        let mut schema = IdlSchema::new("thrift", files);
        schema.sort_definitions();
        schema
    }

    /// `<base>` for the main file, `<base>.<stem>` for the others.
    fn namespace_name(&self, stem: &str) -> String {
        if stem == self.prefix() {
            self.base_namespace.clone()
        } else {
            format!("{}.{stem}", self.base_namespace)
        }
    }
}

/// Includes for every file referenced from `definitions` other than `path`,
/// sorted by path.
fn imports(path: &str, definitions: &Definitions) -> Vec<Import> {
    let mut targets = BTreeSet::new();
    let mut visit = |ty: &Type| {
        ty.walk(&mut |t| {
            if let Some((file, _)) = t.fqn().and_then(split_fqn)
                && file != path
            {
                targets.insert(file.to_string());
            }
        });
    };

    for service in &definitions.services {
        for function in &service.functions {
            visit(&function.return_type);
            for field in function.parameters.iter().chain(&function.throws) {
                visit(&field.field_type);
            }
        }
    }
    for message in &definitions.messages {
        for field in &message.fields {
            visit(&field.field_type);
        }
    }
    for typedef in &definitions.typedefs {
        visit(&typedef.target);
    }

    targets
        .into_iter()
        .map(|target| {
            let value = format!("\"{}\"", include_name(&target));
            Import {
                path: target,
                value,
                ..Import::default()
            }
        })
        .collect()
}

/// File name of an include target relative to its sibling files.
fn include_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use idlbridge_ir::{Field, Message, Requiredness};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_imports_are_sorted_and_unique() {
        let definitions = Definitions {
            messages: vec![Message {
                name: "Team".into(),
                fields: vec![
                    Field::new("a", Type::named("user.User", Some("org/user.thrift#User".into())), Requiredness::Optional),
                    Field::new(
                        "b",
                        Type::list(Type::named("auth.Role", Some("org/auth.thrift#Role".into()))),
                        Requiredness::Optional,
                    ),
                    Field::new("c", Type::named("user.User", Some("org/user.thrift#User".into())), Requiredness::Optional),
                    Field::new("d", Type::named("Local", Some("org/org.thrift#Local".into())), Requiredness::Optional),
                    Field::new("e", Type::named("Dangling", None), Requiredness::Optional),
                ],
                ..Message::default()
            }],
            ..Definitions::default()
        };
        let imports = imports("org/org.thrift", &definitions);
        let summary: Vec<_> = imports.iter().map(|i| (i.path.as_str(), i.value.as_str())).collect();
        assert_eq!(
            summary,
            [
                ("org/auth.thrift", "\"auth.thrift\""),
                ("org/user.thrift", "\"user.thrift\"")
            ]
        );
    }
}

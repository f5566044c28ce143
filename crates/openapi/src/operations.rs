//! Path operations to service functions, request messages and throws.

use std::collections::BTreeMap;

use idlbridge_ir::{
    Annotation, Field, Function, Message, Requiredness, Service, Type, renumber_fields,
};
use tracing::{debug, warn};

use crate::error::ConvertError;
use crate::naming::{
    format_path_for_annotation, function_name, path_suffix, sanitize_field_name, sanitize_name,
};
use crate::spec::{
    Body, HttpMethod, Operation, ParamLocation, Parameter, PathItem, Response, StatusCode,
};
use crate::types::{Converter, describe};

/// Name of the single parameter of every generated function.
const REQUEST_PARAM: &str = "req";

impl Converter<'_> {
    /// Map every operation of every path, paths in sorted order and methods
    /// in [`HttpMethod::ORDER`].
    pub fn process_paths(&mut self, paths: &BTreeMap<String, PathItem>) -> Result<(), ConvertError> {
        for (path, item) in paths {
            for method in HttpMethod::ORDER {
                let Some(operation) = item.operation(method) else {
                    continue;
                };
                self.process_operation(path, method, item, operation)?;
            }
        }
        Ok(())
    }

    fn process_operation(
        &mut self,
        path: &str,
        method: HttpMethod,
        item: &PathItem,
        operation: &Operation,
    ) -> Result<(), ConvertError> {
        let main = self.main_file();
        let base = function_name(method, path);

        let return_type = self.response_type(operation, &main, &base)?;
        if return_type.is_void() {
            debug!(method = method.as_str(), path, "no success response schema, skipping operation");
            return Ok(());
        }

        let service_name = self.options.service_name().to_string();
        let name = self.disambiguate(&main, &service_name, &base, path);
        let request = self.build_request(&main, &base, item, operation)?;
        let throws = self.build_throws(operation, &main)?;

        let function = Function {
            name: name.clone(),
            fqn: format!("{main}#{service_name}.{name}"),
            return_type,
            parameters: vec![Field {
                id: 1,
                ..Field::new(
                    REQUEST_PARAM,
                    Type::named(request.clone(), Some(format!("{main}#{request}"))),
                    Requiredness::Default,
                )
            }],
            throws,
            annotations: vec![Annotation::quoted(
                format!("api.{}", method.as_str()),
                &format_path_for_annotation(path),
            )],
            comments: describe(operation.doc()),
            ..Function::default()
        };

        let defs = self.definitions_mut(&main);
        if defs.service_mut(&service_name).is_none() {
            defs.services.push(Service {
                name: service_name.clone(),
                fqn: format!("{main}#{service_name}"),
                ..Service::default()
            });
        }
        if let Some(service) = defs.service_mut(&service_name) {
            service.functions.push(function);
        }
        debug!(method = method.as_str(), path, function = %name, "mapped operation");
        Ok(())
    }

    /// Return type of the success response: `200`, else the first `2xx`
    /// response carrying a schema. A wrapper whose `data` property is a
    /// reference is unwrapped to the referenced type.
    fn response_type(
        &mut self,
        operation: &Operation,
        main: &str,
        base: &str,
    ) -> Result<Type, ConvertError> {
        let ok = StatusCode("200".to_string());
        let success = operation
            .responses
            .get(&ok)
            .and_then(Response::schema)
            .or_else(|| {
                operation
                    .responses
                    .iter()
                    .filter(|(code, _)| code.is_success())
                    .find_map(|(_, response)| response.schema())
            });
        let Some(schema) = success else {
            return Ok(Type::void());
        };

        let resolved = match &schema.ref_path {
            Some(reference) => self.resolver.resolve(reference),
            None => Some(schema),
        };
        if let Some(wrapper) = resolved.filter(|s| s.is_object_like())
            && let Some(data) = ["Data", "data"]
                .iter()
                .find_map(|key| wrapper.properties.get(*key))
                .filter(|data| data.ref_path.is_some())
        {
            return self.type_of(Some(data), main, base, "Data");
        }
        self.type_of(Some(schema), main, base, "Response")
    }

    /// `base`, else `base` + last static path segment, else a numeric suffix.
    fn disambiguate(&self, main: &str, service: &str, base: &str, path: &str) -> String {
        let taken = |name: &str| {
            self.files
                .get(main)
                .and_then(|defs| defs.services.iter().find(|s| s.name == service))
                .is_some_and(|s| s.function(name).is_some())
        };
        if !taken(base) {
            return base.to_string();
        }
        let stem = match path_suffix(path) {
            Some(suffix) => sanitize_name(&format!("{base}{suffix}")),
            None => base.to_string(),
        };
        if !taken(&stem) {
            debug!(base, name = %stem, "function name taken, using path suffix");
            return stem;
        }
        let name = (2..)
            .map(|n| format!("{stem}{n}"))
            .find(|candidate| !taken(candidate))
            .unwrap_or(stem);
        debug!(base, name = %name, "function name taken, using numeric suffix");
        name
    }

    /// Name of the request message for `base`; every operation with the same
    /// base name shares it.
    fn request_name(&mut self, main: &str, base: &str) -> String {
        if let Some(name) = self.request_names.get(base) {
            return name.clone();
        }
        let name = self.claim(main, &sanitize_name(&format!("{base}Request")));
        self.request_names.insert(base.to_string(), name.clone());
        name
    }

    /// The request message of one operation, queued for unification.
    fn build_request(
        &mut self,
        main: &str,
        base: &str,
        item: &PathItem,
        operation: &Operation,
    ) -> Result<String, ConvertError> {
        let name = self.request_name(main, base);
        let params = operation.effective_parameters(item);
        let mut fields: Vec<Field> = Vec::new();

        for param in params.iter().filter(|p| p.location != "body") {
            let Some(location) = ParamLocation::parse(&param.location) else {
                warn!(parameter = %param.name, location = %param.location, "unknown parameter location, skipping");
                continue;
            };
            let field = self.param_field(param, location, main, &name)?;
            merge_field(&mut fields, field);
        }

        if let Some(body) = operation.body(&params) {
            for field in self.body_fields(&body, main, &name)? {
                merge_field(&mut fields, field);
            }
        }

        fields.sort_by(|a, b| a.name.cmp(&b.name));
        renumber_fields(&mut fields);
        let message = Message {
            name: name.clone(),
            fqn: format!("{main}#{name}"),
            fields,
            ..Message::default()
        };
        self.requests.entry(name.clone()).or_default().push(message);
        Ok(name)
    }

    fn param_field(
        &mut self,
        param: &Parameter,
        location: ParamLocation,
        main: &str,
        request: &str,
    ) -> Result<Field, ConvertError> {
        let schema = param.effective_schema();
        let field_type = self.type_of(Some(&schema), main, request, &param.name)?;
        let mut field = Field::new(
            sanitize_field_name(&param.name),
            field_type,
            Requiredness::from_required(param.required),
        );
        field.annotations.push(Annotation::quoted(location.annotation(), &param.name));
        field.comments = describe(param.description.as_deref());
        Ok(field)
    }

    /// A reference or a non-object body becomes one `body` field; an inline
    /// object body contributes its properties.
    fn body_fields(
        &mut self,
        body: &Body<'_>,
        main: &str,
        request: &str,
    ) -> Result<Vec<Field>, ConvertError> {
        let schema = body.schema;
        let spreads = schema.ref_path.is_none()
            && (!schema.properties.is_empty() || !schema.all_of.is_empty())
            && schema.is_object_like();
        if !spreads {
            let field_type = self.type_of(Some(schema), main, request, "body")?;
            let mut field = Field::new("body", field_type, Requiredness::from_required(body.required));
            field.annotations.push(Annotation::quoted(ParamLocation::Body.annotation(), "body"));
            field.comments = describe(body.description);
            return Ok(vec![field]);
        }

        let flat = self.resolver.effective_object(schema)?;
        let mut fields = Vec::with_capacity(flat.properties.len());
        for (property, prop_schema) in &flat.properties {
            let field_type = self.type_of(Some(prop_schema), main, request, property)?;
            let mut field = Field::new(
                sanitize_field_name(property),
                field_type,
                Requiredness::from_required(flat.required.contains(property)),
            );
            field.annotations.push(Annotation::quoted(ParamLocation::Body.annotation(), property));
            field.comments = describe(prop_schema.description.as_deref());
            fields.push(field);
        }
        Ok(fields)
    }

    /// One field per non-2xx response with a schema, named `error<code>`.
    fn build_throws(&mut self, operation: &Operation, main: &str) -> Result<Vec<Field>, ConvertError> {
        let mut throws = Vec::new();
        for (code, response) in &operation.responses {
            if code.is_success() {
                continue;
            }
            let Some(schema) = response.schema() else {
                continue;
            };
            let name = sanitize_field_name(&format!("error{}", code.0));
            let field_type = self.type_of(Some(schema), main, &name, "")?;
            let mut field = Field::new(name, field_type, Requiredness::Default);
            field.comments = describe(response.description.as_deref());
            throws.push(field);
        }
        renumber_fields(&mut throws);
        Ok(throws)
    }
}

/// Add `field`, or fold it into an existing field of the same name: its
/// annotations are appended and `required` wins.
fn merge_field(fields: &mut Vec<Field>, field: Field) {
    let Some(existing) = fields.iter_mut().find(|f| f.name == field.name) else {
        fields.push(field);
        return;
    };
    for annotation in field.annotations {
        if !existing.has_annotation(&annotation.name) {
            existing.annotations.push(annotation);
        }
    }
    if field.requiredness == Requiredness::Required {
        existing.requiredness = Requiredness::Required;
    }
    if existing.comments.is_empty() {
        existing.comments = field.comments;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::options::ConvertOptions;
    use crate::spec::SpecDocument;
    use pretty_assertions::assert_eq;

    fn convert(json: &str) -> (Converter<'static>, String) {
        let doc: &'static SpecDocument =
            Box::leak(Box::new(SpecDocument::parse("api.json", json.as_bytes()).unwrap()));
        let options: &'static ConvertOptions = Box::leak(Box::new(ConvertOptions::default()));
        let mut conv = Converter::new("api.json", &doc.definitions, options);
        conv.process_schemas().unwrap();
        conv.process_paths(&doc.paths).unwrap();
        let main = conv.main_file();
        (conv, main)
    }

    fn function_names(conv: &Converter<'_>, main: &str) -> Vec<String> {
        conv.files[main].services[0]
            .functions
            .iter()
            .map(|f| f.name.clone())
            .collect()
    }

    #[test]
    fn test_ping_operation() {
        let (conv, main) = convert(
            r#"{"openapi": "3.0.0", "paths": {"/ping": {"get": {"responses": {"200": {
                "description": "ok",
                "content": {"application/json": {"schema": {"type": "object", "properties": {"message": {"type": "string"}}}}}
            }}}}}}"#,
        );
        let service = &conv.files[&main].services[0];
        assert_eq!(service.name, "HTTPService");
        let function = &service.functions[0];
        assert_eq!(function.name, "GetPing");
        assert_eq!(function.return_type.name(), "GetPingResponse");
        assert_eq!(function.annotations, [Annotation::quoted("api.get", "/ping")]);
        assert_eq!(function.parameters[0].name, "req");
        assert_eq!(function.parameters[0].field_type.name(), "GetPingRequest");
        assert!(conv.requests["GetPingRequest"][0].fields.is_empty());
    }

    #[test]
    fn test_operations_without_success_schema_are_skipped() {
        let (conv, main) = convert(
            r#"{"openapi": "3.0.0", "paths": {"/a": {
                "delete": {"responses": {"204": {"description": "gone"}}},
                "get": {"responses": {"201": {"description": "ok", "content": {"application/json": {"schema": {"type": "string"}}}}}}
            }}}"#,
        );
        assert_eq!(function_names(&conv, &main), ["GetA"]);
        assert!(!conv.requests.contains_key("DeleteARequest"));
    }

    #[test]
    fn test_data_wrapper_is_unwrapped() {
        let (conv, main) = convert(
            r##"{"swagger": "2.0", "paths": {"/pets": {"get": {"responses": {"200": {
                "description": "ok",
                "schema": {"type": "object", "properties": {"code": {"type": "integer"}, "data": {"$ref": "#/definitions/Pet"}}}
            }}}}},
            "definitions": {"Pet": {"type": "object", "properties": {"id": {"type": "string"}}}}}"##,
        );
        let function = &conv.files[&main].services[0].functions[0];
        assert_eq!(function.return_type.name(), "Pet");
    }

    #[test]
    fn test_parameters_and_body_fields() {
        let (conv, _) = convert(
            r#"{"openapi": "3.0.0", "paths": {"/users/{id}": {
                "parameters": [{"name": "id", "in": "path", "required": true, "schema": {"type": "integer", "format": "int64"}}],
                "put": {
                    "parameters": [{"name": "X-Trace", "in": "header", "schema": {"type": "string"}}],
                    "requestBody": {"required": true, "content": {"application/json": {"schema": {
                        "type": "object", "required": ["name"],
                        "properties": {"name": {"type": "string"}, "id": {"type": "integer", "format": "int64"}}
                    }}}},
                    "responses": {"200": {"description": "ok", "content": {"application/json": {"schema": {"type": "string"}}}}}
                }
            }}}"#,
        );
        let request = &conv.requests["PutUsersByIdRequest"][0];
        let summary: Vec<_> = request
            .fields
            .iter()
            .map(|f| (f.id, f.name.as_str(), f.requiredness, f.annotations.len()))
            .collect();
        assert_eq!(
            summary,
            [
                (1, "X_Trace", Requiredness::Optional, 1),
                (2, "id", Requiredness::Required, 2),
                (3, "name", Requiredness::Required, 1),
            ]
        );
        assert_eq!(
            request.fields[0].annotations,
            [Annotation::quoted("api.header", "X-Trace")]
        );
        assert_eq!(
            request.fields[1].annotations,
            [Annotation::quoted("api.path", "id"), Annotation::quoted("api.body", "id")]
        );
    }

    #[test]
    fn test_params_with_same_field_name_keep_first_location() {
        let (conv, _) = convert(
            r#"{"openapi": "3.0.0", "paths": {"/a": {"get": {
                "parameters": [
                    {"name": "a-b", "in": "query", "schema": {"type": "string"}},
                    {"name": "a.b", "in": "query", "required": true, "schema": {"type": "string"}}
                ],
                "responses": {"200": {"description": "ok", "content": {"application/json": {"schema": {"type": "string"}}}}}
            }}}}"#,
        );
        let request = &conv.requests["GetARequest"][0];
        assert_eq!(request.fields.len(), 1);
        let field = request.field("a_b").unwrap();
        assert_eq!(field.annotations, [Annotation::quoted("api.query", "a-b")]);
        assert_eq!(field.requiredness, Requiredness::Required);
    }

    #[test]
    fn test_ref_body_is_single_field_and_alias_is_inlined() {
        let (conv, _) = convert(
            r##"{"swagger": "2.0", "paths": {"/notes": {"post": {
                "parameters": [
                    {"name": "text", "in": "body", "required": true, "schema": {"$ref": "#/definitions/NoteText"}},
                    {"name": "file", "in": "formData", "type": "file"}
                ],
                "responses": {"200": {"description": "ok", "schema": {"type": "boolean"}}}
            }}},
            "definitions": {"NoteText": {"type": "string"}}}"##,
        );
        let request = &conv.requests["PostNotesRequest"][0];
        let body = request.field("body").unwrap();
        assert_eq!(body.field_type, Type::string());
        assert_eq!(body.requiredness, Requiredness::Required);
        let file = request.field("file").unwrap();
        assert_eq!(file.annotations, [Annotation::quoted("api.form", "file")]);
    }

    #[test]
    fn test_function_name_disambiguation() {
        let ok = r#"{"200": {"description": "ok", "schema": {"type": "string"}}}"#;
        let (conv, main) = convert(&format!(
            r#"{{"swagger": "2.0", "paths": {{
                "/user": {{"post": {{"responses": {ok}}}}},
                "/user/user": {{"post": {{"responses": {ok}}}}},
                "/user/{{id}}/user": {{"post": {{"responses": {ok}}}}}
            }}, "definitions": {{}}}}"#
        ));
        assert_eq!(
            function_names(&conv, &main),
            ["PostUser", "PostUserForUser", "PostUserByIdUser"]
        );
        assert_eq!(conv.requests["PostUserRequest"].len(), 2);
    }

    #[test]
    fn test_error_responses_become_throws() {
        let (conv, main) = convert(
            r##"{"swagger": "2.0", "paths": {"/x": {"get": {"responses": {
                "200": {"description": "ok", "schema": {"type": "string"}},
                "404": {"description": "missing", "schema": {"$ref": "#/definitions/Problem"}},
                "500": {"description": "no schema"}
            }}}}, "definitions": {"Problem": {"type": "object", "properties": {"msg": {"type": "string"}}}}}"##,
        );
        let function = &conv.files[&main].services[0].functions[0];
        assert_eq!(function.throws.len(), 1);
        assert_eq!(function.throws[0].id, 1);
        assert_eq!(function.throws[0].name, "error404");
        assert_eq!(function.throws[0].field_type.name(), "Problem");
    }
}

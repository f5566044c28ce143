//! Swagger 2 / OpenAPI 3 to Thrift IDL conversion.
//!
//! A document goes through these stages:
//! 1. `spec`: parse JSON or YAML, detect the dialect, normalize both dialects
//!    into one document model
//! 2. `types`: named schemas become structs, enums and typedefs; inline schemas
//!    are synthesized on demand by `type_of`, with `resolve` handling `$ref`
//!    and `allOf`
//! 3. `operations`: every path operation becomes a service function with a
//!    request message and thrown error fields
//! 4. `unify`: request messages produced under one name are merged
//! 5. `assemble`: namespaces and includes are added and the IR is finalized
//!
//! The resulting [`IdlSchema`] is rendered by [`idlbridge_ir::generate`].

#![forbid(unsafe_code)]
#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]

mod assemble;
mod error;
mod naming;
mod operations;
mod options;
mod resolve;
mod spec;
mod types;
mod unify;

use std::collections::BTreeMap;

use idlbridge_ir::{IdlSchema, WriterOptions, generate};
use tracing::{info, warn};

pub use error::ConvertError;
pub use options::{ConvertOptions, DEFAULT_NAMESPACE_SCOPE, DEFAULT_SERVICE_NAME, RefPolicy};
pub use spec::Dialect;

use spec::SpecDocument;
use types::Converter;

/// Convert one document into the IR.
pub fn convert_document(
    file_name: &str,
    bytes: &[u8],
    options: &ConvertOptions,
) -> Result<IdlSchema, ConvertError> {
    let document = SpecDocument::parse(file_name, bytes)?;
    info!(
        file = file_name,
        dialect = %document.dialect,
        paths = document.paths.len(),
        schemas = document.definitions.len(),
        "converting document"
    );

    let mut converter = Converter::new(file_name, &document.definitions, options);
    converter.process_schemas()?;
    converter.process_paths(&document.paths)?;
    let schema = converter.finish(&document.version);

    info!(file = file_name, files = schema.files().len(), "conversion finished");
    Ok(schema)
}

/// Convert one document and render it: generated file path to Thrift source.
pub fn convert_spec(
    file_name: &str,
    bytes: &[u8],
    options: &ConvertOptions,
) -> Result<BTreeMap<String, Vec<u8>>, ConvertError> {
    let schema = convert_document(file_name, bytes, options)?;
    let writer_options = WriterOptions {
        no_comments: options.no_comments,
    };
    Ok(generate(&schema, writer_options)?)
}

/// Outcome of [`convert_specs`], keyed by input file name.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Rendered files of every input that converted.
    pub outputs: BTreeMap<String, BTreeMap<String, Vec<u8>>>,
    /// Error of every input that failed.
    pub failures: BTreeMap<String, ConvertError>,
}

impl BatchReport {
    /// Whether every input converted.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Convert every input independently. A failing document does not stop the
/// others; an empty batch is reported as a failure under the empty name.
pub fn convert_specs(inputs: &BTreeMap<String, Vec<u8>>, options: &ConvertOptions) -> BatchReport {
    let mut report = BatchReport::default();
    if inputs.is_empty() {
        warn!("no input documents to convert");
        report.failures.insert(String::new(), ConvertError::EmptyInput);
        return report;
    }
    for (file_name, bytes) in inputs {
        match convert_spec(file_name, bytes, options) {
            Ok(files) => {
                report.outputs.insert(file_name.clone(), files);
            }
            Err(err) => {
                warn!(file = %file_name, error = %err, "conversion failed");
                report.failures.insert(file_name.clone(), err);
            }
        }
    }
    report
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PING_SPEC: &str = r#"{
        "openapi": "3.0.0",
        "info": {"title": "Ping", "version": "1.0"},
        "paths": {
            "/ping": {
                "get": {
                    "summary": "Health check",
                    "responses": {
                        "200": {
                            "description": "pong",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "required": ["message"],
                                        "properties": {"message": {"type": "string"}}
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }"#;

    fn render(name: &str, spec: &str, options: &ConvertOptions) -> BTreeMap<String, String> {
        convert_spec(name, spec.as_bytes(), options)
            .unwrap()
            .into_iter()
            .map(|(path, bytes)| (path, String::from_utf8(bytes).unwrap()))
            .collect()
    }

    #[test]
    fn test_ping_renders_exactly() {
        let files = render("ping.json", PING_SPEC, &ConvertOptions::default());
        assert_eq!(files.keys().collect::<Vec<_>>(), ["ping/ping.thrift"]);
        assert_eq!(
            files["ping/ping.thrift"],
            r#"namespace go ping

struct GetPingResponse {
    1: required string message,
}

struct GetPingRequest {
}

service HTTPService {
    /** Health check */
    GetPingResponse GetPing(1: GetPingRequest req) (api.get = "/ping")
}

"#
        );
    }

    #[test]
    fn test_options_change_names() {
        let options = ConvertOptions::default()
            .with_namespace("health")
            .with_service_name("Health")
            .with_namespace_scope("java")
            .with_no_comments(true);
        let files = render("ping.json", PING_SPEC, &options);
        let text = &files["ping/ping.thrift"];
        assert!(text.starts_with("namespace java health\n"));
        assert!(text.contains("service Health {"));
        assert!(!text.contains("Health check"));
    }

    #[test]
    fn test_output_is_deterministic() {
        let a = convert_spec("ping.json", PING_SPEC.as_bytes(), &ConvertOptions::default()).unwrap();
        let b = convert_spec("ping.json", PING_SPEC.as_bytes(), &ConvertOptions::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_document_ir_is_queryable() {
        let schema = convert_document("ping.json", PING_SPEC.as_bytes(), &ConvertOptions::default()).unwrap();
        assert_eq!(schema.idl_type, "thrift");
        assert_eq!(schema.find_functions("HTTPService.GetPing").len(), 1);
        assert_eq!(schema.find_structs("ping/ping.thrift#GetPingRequest").len(), 1);
    }

    #[test]
    fn test_batch_reports_each_input() {
        let inputs = BTreeMap::from([
            ("ok.json".to_string(), PING_SPEC.as_bytes().to_vec()),
            ("broken.json".to_string(), b"{\"info\": {}}".to_vec()),
        ]);
        let report = convert_specs(&inputs, &ConvertOptions::default());
        assert!(!report.is_success());
        assert!(report.outputs.contains_key("ok.json"));
        assert!(matches!(
            report.failures["broken.json"],
            ConvertError::MissingVersion { .. }
        ));

        let empty = convert_specs(&BTreeMap::new(), &ConvertOptions::default());
        assert!(matches!(empty.failures[""], ConvertError::EmptyInput));
    }
}

//! Converter configuration.

use serde::Deserialize;

use crate::error::ConvertError;

/// Service name used when none is configured.
pub const DEFAULT_SERVICE_NAME: &str = "HTTPService";

/// Namespace scope used when none is configured.
pub const DEFAULT_NAMESPACE_SCOPE: &str = "go";

/// What to do with a `$ref` whose target does not exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefPolicy {
    /// Keep the referenced name as written and log a warning.
    #[default]
    Lenient,
    /// Abort the conversion with [`ConvertError::DanglingRef`].
    Strict,
}

/// Options recognized by the converter.
///
/// Keys are camelCase in every serialized form:
///
/// ```toml
/// namespace = "petstore"
/// serviceName = "PetService"
/// refPolicy = "strict"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConvertOptions {
    /// Base namespace; derived from the input file name when unset.
    pub namespace: Option<String>,
    /// Name of the aggregate service.
    pub service_name: Option<String>,
    /// Scope written in `namespace <scope> <name>` lines.
    pub namespace_scope: Option<String>,
    /// Handling of `$ref`s without a target.
    pub ref_policy: RefPolicy,
    /// Leave description comments out of the rendered output.
    pub no_comments: bool,
}

impl ConvertOptions {
    /// Read options from a TOML table.
    pub fn from_toml_str(text: &str) -> Result<Self, ConvertError> {
        Ok(toml::from_str(text)?)
    }

    /// Set the base namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the service name.
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Set the namespace scope.
    pub fn with_namespace_scope(mut self, scope: impl Into<String>) -> Self {
        self.namespace_scope = Some(scope.into());
        self
    }

    /// Set the dangling reference policy.
    pub fn with_ref_policy(mut self, policy: RefPolicy) -> Self {
        self.ref_policy = policy;
        self
    }

    /// Drop or keep description comments.
    pub fn with_no_comments(mut self, no_comments: bool) -> Self {
        self.no_comments = no_comments;
        self
    }

    /// Configured service name, or [`DEFAULT_SERVICE_NAME`].
    pub fn service_name(&self) -> &str {
        self.service_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SERVICE_NAME)
    }

    /// Configured namespace scope, or [`DEFAULT_NAMESPACE_SCOPE`].
    pub fn namespace_scope(&self) -> &str {
        self.namespace_scope
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_NAMESPACE_SCOPE)
    }
}

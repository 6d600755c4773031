//! Server cache path derivation.

use regex::Regex;

/// Version prefix for the server cache layout. Bumping it orphans every
/// existing entry, so it only changes when the key derivation does.
pub const CACHE_VERSION: &str = "v1";

/// Namespace for server cache paths:
/// `cache/<version>/<sanitized-model-id>/<key>`.
#[derive(Debug, Clone)]
pub struct CacheNamespace {
    version: String,
    model_identifier: String,
    sanitized: String,
}

impl CacheNamespace {
    /// Namespace for `model_identifier` under the current cache version.
    pub fn new(model_identifier: impl Into<String>) -> Self {
        Self::with_version(model_identifier, CACHE_VERSION)
    }

    /// Namespace under an explicit cache version.
    pub fn with_version(model_identifier: impl Into<String>, version: impl Into<String>) -> Self {
        let model_identifier = model_identifier.into();
        let sanitizer = Regex::new("[^a-zA-Z0-9]").expect("static pattern compiles");
        let sanitized = sanitizer.replace_all(&model_identifier, "_").into_owned();
        Self {
            version: version.into(),
            model_identifier,
            sanitized,
        }
    }

    /// The unsanitized model identifier (used for key scoping).
    pub fn model_identifier(&self) -> &str {
        &self.model_identifier
    }

    /// Cache path for a derived key.
    pub fn path_for(&self, key: &str) -> String {
        format!("cache/{}/{}/{}", self.version, self.sanitized, key)
    }
}

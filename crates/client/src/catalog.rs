//! Named model configurations.
//!
//! The backend routes models by opaque ids that change without notice, so
//! the catalog is populated from configuration. An empty model name resolves
//! to the default target.

use std::collections::HashMap;

use lariat_core::{ClientError, ModelTarget};

#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    default: ModelTarget,
    targets: HashMap<String, ModelTarget>,
}

impl ModelCatalog {
    pub fn new(default: ModelTarget) -> Self {
        Self {
            default,
            targets: HashMap::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, target: ModelTarget) {
        self.targets.insert(name.into(), target);
    }

    pub fn with_target(mut self, name: impl Into<String>, target: ModelTarget) -> Self {
        self.insert(name, target);
        self
    }

    /// Resolve a request's model name. Unknown names are a configuration
    /// error, not a silent fallback.
    pub fn resolve(&self, name: &str) -> Result<ModelTarget, ClientError> {
        if name.is_empty() {
            return Ok(self.default.clone());
        }
        self.targets
            .get(name)
            .cloned()
            .ok_or_else(|| ClientError::NotConfigured(format!("unknown model: {name}")))
    }

    pub fn names(&self) -> Vec<&str> {
        self.targets.keys().map(String::as_str).collect()
    }
}

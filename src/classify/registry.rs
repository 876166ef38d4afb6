use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};

use super::backend::PredictionBackend;

/// Registry of named prediction backends.
///
/// Backends are shared as `Arc` since `PredictionBackend::predict` takes `&self`.
pub struct BackendRegistry {
    backends: HashMap<String, Arc<dyn PredictionBackend>>,
    default_name: Option<String>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
            default_name: None,
        }
    }

    /// Register a backend. The first registered backend becomes the default.
    pub fn register<B: PredictionBackend + 'static>(&mut self, backend: B) {
        let name = backend.name().to_string();
        if self.default_name.is_none() {
            self.default_name = Some(name.clone());
        }
        log::debug!("registered prediction backend '{}'", name);
        self.backends.insert(name, Arc::new(backend));
    }

    /// Set default backend by name.
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.backends.contains_key(name) {
            return Err(anyhow!("backend '{}' not registered", name));
        }
        self.default_name = Some(name.to_string());
        Ok(())
    }

    /// Get backend by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn PredictionBackend>> {
        self.backends.get(name).cloned()
    }

    /// Get default backend.
    pub fn default_backend(&self) -> Option<Arc<dyn PredictionBackend>> {
        self.default_name.as_ref().and_then(|name| self.get(name))
    }

    /// Backend by name, or the default when `name` is `None`.
    ///
    /// The name is trimmed and lower-cased first, matching how configured
    /// backend kinds are normalized.
    pub fn select(&self, name: Option<&str>) -> Result<Arc<dyn PredictionBackend>> {
        match name {
            Some(name) => self
                .get(&name.trim().to_lowercase())
                .ok_or_else(|| anyhow!("backend '{}' not registered", name)),
            None => self
                .default_backend()
                .ok_or_else(|| anyhow!("no prediction backend registered")),
        }
    }

    /// Registered backend names, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.backends.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

//! Explicit provider table: scheme -> backend.
//!
//! Built once at process start and passed by reference into whatever
//! needs a store. Deliberately not a global: discovery-by-scan of
//! pluggable providers is out of core scope.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};

use super::ObjectStore;

#[derive(Default)]
pub struct StoreRegistry {
    providers: HashMap<String, Arc<dyn ObjectStore>>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend under a scheme (e.g. "local"). Replaces any
    /// previous registration for the same scheme.
    pub fn register<S: Into<String>>(&mut self, scheme: S, store: Arc<dyn ObjectStore>) {
        self.providers.insert(scheme.into(), store);
    }

    pub fn get(&self, scheme: &str) -> Result<Arc<dyn ObjectStore>> {
        self.providers
            .get(scheme)
            .cloned()
            .ok_or_else(|| anyhow!("no store provider registered for scheme {scheme:?}"))
    }

    pub fn schemes(&self) -> Vec<&str> {
        let mut v: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        v.sort();
        v
    }
}

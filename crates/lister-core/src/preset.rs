//! Named definitions, so sessions can be opened by kind

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::definition::ListerDefinition;

#[derive(Debug, Default)]
pub struct PresetRegistry {
    presets: RwLock<BTreeMap<String, Arc<ListerDefinition>>>,
}

impl PresetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `definition` under `kind`, replacing any previous one
    pub fn register(&self, kind: impl Into<String>, definition: ListerDefinition) {
        let mut presets = self.presets.write().unwrap_or_else(|p| p.into_inner());
        presets.insert(kind.into(), Arc::new(definition));
    }

    pub fn get(&self, kind: &str) -> Option<Arc<ListerDefinition>> {
        let presets = self.presets.read().unwrap_or_else(|p| p.into_inner());
        presets.get(kind).cloned()
    }

    pub fn kinds(&self) -> Vec<String> {
        let presets = self.presets.read().unwrap_or_else(|p| p.into_inner());
        presets.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{Mapping, Resolver, Source};

    #[test]
    fn test_register_and_get() {
        let registry = PresetRegistry::new();
        assert!(registry.get("users").is_none());

        registry.register(
            "users",
            ListerDefinition::new(Source::get("/users"), Mapping::new(Resolver::path("id"))),
        );
        registry.register(
            "teams",
            ListerDefinition::new(Source::get("/teams"), Mapping::new(Resolver::path("id"))),
        );

        assert_eq!(registry.get("users").unwrap().source.endpoint, "/users");
        assert_eq!(registry.kinds(), vec!["teams".to_string(), "users".to_string()]);
    }

    #[test]
    fn test_register_replaces() {
        let registry = PresetRegistry::new();
        let at = |endpoint: &str| {
            ListerDefinition::new(Source::get(endpoint), Mapping::new(Resolver::path("id")))
        };
        registry.register("x", at("/a"));
        registry.register("x", at("/b"));
        assert_eq!(registry.get("x").unwrap().source.endpoint, "/b");
    }
}

use super::model::CommandSpec;
use serde::Serialize;
use std::collections::HashMap;

/// Where a registered spec came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecOrigin {
    /// Compiled into the binary.
    Builtin,
    /// Loaded from a spec directory at startup.
    Dynamic,
}

/// Breakdown of registered specs by origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpecCount {
    pub builtin: usize,
    pub dynamic: usize,
    pub total: usize,
}

/// All command grammars known to one engine instance.
///
/// The registry is built at startup and handed to the engine. Nothing
/// here is global; tests construct as many isolated registries as they
/// need.
#[derive(Debug, Default)]
pub struct SpecRegistry {
    specs: HashMap<String, (SpecOrigin, CommandSpec)>,
}

impl SpecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a spec under its own name, replacing any previous entry.
    pub fn register(&mut self, origin: SpecOrigin, spec: CommandSpec) {
        self.specs.insert(spec.name.clone(), (origin, spec));
    }

    pub fn get(&self, name: &str) -> Option<&CommandSpec> {
        self.specs.get(name).map(|(_, spec)| spec)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.specs.contains_key(name)
    }

    /// Registered command names, sorted for stable output.
    pub fn command_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.specs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn count(&self) -> SpecCount {
        let builtin = self
            .specs
            .values()
            .filter(|(origin, _)| *origin == SpecOrigin::Builtin)
            .count();
        SpecCount {
            builtin,
            dynamic: self.specs.len() - builtin,
            total: self.specs.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

use crate::operators::Registry;

/// Per-compile configuration: the root entity type and the active operator registry.
/// Built fresh for each compile and never mutated afterwards.
#[derive(Clone, Debug)]
pub struct CompileContext {
    root: String,
    registry: Registry,
}

impl CompileContext {
    /// Context with the builtin operators.
    pub fn new(root: impl Into<String>) -> Self {
        Self::with_registry(root, Registry::with_builtins())
    }

    /// Context with a caller-supplied registry, e.g. one endpoint's extra operators.
    pub fn with_registry(root: impl Into<String>, registry: Registry) -> Self {
        Self {
            root: root.into(),
            registry,
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

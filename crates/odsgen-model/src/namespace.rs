//! Namespace definitions.

use serde::{Deserialize, Serialize};

/// A namespace groups entities and declares which other namespaces they may reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Namespace {
    /// Namespace name (unique within the graph).
    pub name: String,
    /// Whether this namespace extends core namespaces.
    #[serde(default)]
    pub is_extension: bool,
    /// Names of namespaces this one depends on, in declaration order.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl Namespace {
    /// Create a core namespace without dependencies.
    pub fn core(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_extension: false,
            dependencies: Vec::new(),
        }
    }

    /// Create an extension namespace.
    pub fn extension(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_extension: true,
            dependencies: Vec::new(),
        }
    }

    /// Add a dependency on another namespace.
    pub fn with_dependency(mut self, namespace: impl Into<String>) -> Self {
        self.dependencies.push(namespace.into());
        self
    }

    /// Check whether this namespace declares a direct dependency.
    pub fn depends_on(&self, namespace: &str) -> bool {
        self.dependencies.iter().any(|d| d == namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_builders() {
        let core = Namespace::core("EdFi");
        assert!(!core.is_extension);

        let ext = Namespace::extension("Sample").with_dependency("EdFi");
        assert!(ext.is_extension);
        assert!(ext.depends_on("EdFi"));
        assert!(!ext.depends_on("Other"));
    }

    #[test]
    fn test_namespace_defaults_from_json() {
        let ns: Namespace = serde_json::from_str(r#"{"name":"EdFi"}"#).unwrap();
        assert_eq!(ns, Namespace::core("EdFi"));
    }
}

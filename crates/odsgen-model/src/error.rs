//! Model construction errors.

use thiserror::Error;

/// Errors raised while assembling an [`EntityGraph`](crate::EntityGraph).
#[derive(Debug, Error)]
pub enum ModelError {
    /// Two namespaces share a name.
    #[error("duplicate namespace '{0}'")]
    DuplicateNamespace(String),

    /// An entity names a namespace that was never declared.
    #[error("entity '{entity}' belongs to unknown namespace '{namespace}'")]
    UnknownNamespace {
        /// Entity name.
        entity: String,
        /// Namespace it claims to belong to.
        namespace: String,
    },

    /// Two entities of the same kind group share a name within one namespace.
    #[error("duplicate entity '{namespace}.{name}'")]
    DuplicateEntity {
        /// Namespace name.
        namespace: String,
        /// Entity name.
        name: String,
    },

    /// The graph document could not be parsed.
    #[error("invalid graph document: {0}")]
    Json(#[from] serde_json::Error),
}

//! Error types for schema compilation.

use odsgen_model::ModelError;
use thiserror::Error;

/// Error raised while compiling an entity graph.
#[derive(Debug, Clone, Error)]
pub struct CompileError {
    /// The error message.
    pub message: String,
    /// Entity/property path the error was found at (`Namespace.Entity.Property`).
    pub path: String,
    /// Error kind for programmatic handling.
    pub kind: CompileErrorKind,
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Kinds of compilation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileErrorKind {
    /// A property target does not resolve to an entity of an acceptable kind.
    UnresolvedReference,
    /// A subclass or extension has a missing or unacceptable base entity.
    InvalidBaseEntity,
    /// A namespace dependency names an unknown namespace.
    UnknownNamespace,
    /// Namespace dependencies form a cycle.
    NamespaceCycle,
    /// A core namespace depends on an extension namespace.
    InvalidNamespaceDependency,
    /// A collection property is marked as identity.
    CollectionIdentity,
    /// Identity propagation revisits an entity.
    IdentityCycle,
    /// A merge directive is malformed.
    InvalidMergeDirective,
    /// A merge directive path resolves to no column.
    UnresolvedMergePath,
    /// Two merge directives substitute one column differently.
    ConflictingMergeDirectives,
    /// Two distinct tables or columns compute the same name.
    NameCollision,
    /// An entity could never be scheduled for building.
    UnresolvableDependency,
    /// The assembled schema broke an internal invariant.
    Internal,
}

impl CompileErrorKind {
    /// Check if this kind is a graph precondition violation.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            CompileErrorKind::UnresolvedReference
                | CompileErrorKind::InvalidBaseEntity
                | CompileErrorKind::UnknownNamespace
                | CompileErrorKind::NamespaceCycle
                | CompileErrorKind::InvalidNamespaceDependency
                | CompileErrorKind::CollectionIdentity
                | CompileErrorKind::IdentityCycle
                | CompileErrorKind::InvalidMergeDirective
                | CompileErrorKind::UnresolvedMergePath
                | CompileErrorKind::ConflictingMergeDirectives
                | CompileErrorKind::UnresolvableDependency
        )
    }
}

impl CompileError {
    /// Create a new compile error.
    pub fn new(
        message: impl Into<String>,
        path: impl Into<String>,
        kind: CompileErrorKind,
    ) -> Self {
        Self {
            message: message.into(),
            path: path.into(),
            kind,
        }
    }

    /// Create an unresolved reference error.
    pub fn unresolved_reference(path: &str, target: &str, expected: &str) -> Self {
        Self::new(
            format!("'{}' does not resolve to a {}", target, expected),
            path,
            CompileErrorKind::UnresolvedReference,
        )
    }

    /// Create an invalid base entity error.
    pub fn invalid_base(path: &str, message: impl Into<String>) -> Self {
        Self::new(message, path, CompileErrorKind::InvalidBaseEntity)
    }

    /// Create an unknown namespace error.
    pub fn unknown_namespace(namespace: &str, dependency: &str) -> Self {
        Self::new(
            format!(
                "namespace '{}' depends on unknown namespace '{}'",
                namespace, dependency
            ),
            namespace,
            CompileErrorKind::UnknownNamespace,
        )
    }

    /// Create a namespace cycle error.
    pub fn namespace_cycle(namespaces: &[String]) -> Self {
        Self::new(
            format!("namespace dependencies form a cycle among: {}", namespaces.join(", ")),
            namespaces.join(","),
            CompileErrorKind::NamespaceCycle,
        )
    }

    /// Create an invalid namespace dependency error.
    pub fn invalid_namespace_dependency(namespace: &str, dependency: &str) -> Self {
        Self::new(
            format!(
                "core namespace '{}' may not depend on extension namespace '{}'",
                namespace, dependency
            ),
            namespace,
            CompileErrorKind::InvalidNamespaceDependency,
        )
    }

    /// Create a collection identity error.
    pub fn collection_identity(path: &str) -> Self {
        Self::new(
            "a collection property cannot be part of an identity",
            path,
            CompileErrorKind::CollectionIdentity,
        )
    }

    /// Create an identity cycle error.
    pub fn identity_cycle(chain: &[String]) -> Self {
        Self::new(
            format!("identity propagation cycles through {}", chain.join(" -> ")),
            chain.first().cloned().unwrap_or_default(),
            CompileErrorKind::IdentityCycle,
        )
    }

    /// Create an invalid merge directive error.
    pub fn invalid_merge(path: &str, message: impl Into<String>) -> Self {
        Self::new(message, path, CompileErrorKind::InvalidMergeDirective)
    }

    /// Create an unresolved merge path error.
    pub fn unresolved_merge_path(path: &str, merge_path: &str) -> Self {
        Self::new(
            format!("merge path '{}' does not resolve to any column", merge_path),
            path,
            CompileErrorKind::UnresolvedMergePath,
        )
    }

    /// Create a conflicting merge directives error.
    pub fn conflicting_merges(path: &str, column: &str, first: &str, second: &str) -> Self {
        Self::new(
            format!(
                "column '{}' is merged into both '{}' and '{}'",
                column, first, second
            ),
            path,
            CompileErrorKind::ConflictingMergeDirectives,
        )
    }

    /// Create a naming collision error naming both contributors.
    pub fn name_collision(name: &str, first: &str, second: &str) -> Self {
        Self::new(
            format!("'{}' is produced by both '{}' and '{}'", name, first, second),
            second,
            CompileErrorKind::NameCollision,
        )
    }

    /// Create an unresolvable dependency error.
    pub fn unresolvable_dependency(path: &str, waiting_on: &str) -> Self {
        Self::new(
            format!("cannot be built before '{}', which never became available", waiting_on),
            path,
            CompileErrorKind::UnresolvableDependency,
        )
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(message, "", CompileErrorKind::Internal)
    }

    /// Format the error for terminal output.
    pub fn format_report(&self) -> String {
        let mut result = format!("error[{:?}]: {}\n", self.kind, self.message);
        if !self.path.is_empty() {
            result.push_str(&format!("  --> {}\n", self.path));
        }
        result
    }
}

/// Every error found during one compile; never empty.
#[derive(Debug, Clone, Error)]
pub struct CompileErrors(Vec<CompileError>);

impl CompileErrors {
    /// Wrap a non-empty error list.
    pub fn new(errors: Vec<CompileError>) -> Self {
        debug_assert!(!errors.is_empty());
        Self(errors)
    }

    /// The collected errors.
    pub fn errors(&self) -> &[CompileError] {
        &self.0
    }

    /// Check whether any collected error has the given kind.
    pub fn has_kind(&self, kind: CompileErrorKind) -> bool {
        self.0.iter().any(|e| e.kind == kind)
    }

    /// Number of collected errors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Format every error for terminal output.
    pub fn format_report(&self) -> String {
        self.0.iter().map(CompileError::format_report).collect()
    }
}

impl From<CompileError> for CompileErrors {
    fn from(error: CompileError) -> Self {
        Self(vec![error])
    }
}

impl IntoIterator for CompileErrors {
    type Item = CompileError;
    type IntoIter = std::vec::IntoIter<CompileError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl std::fmt::Display for CompileErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.as_slice() {
            [single] => write!(f, "{}", single),
            errors => {
                write!(f, "{} errors", errors.len())?;
                for error in errors {
                    write!(f, "; {}", error)?;
                }
                Ok(())
            }
        }
    }
}

/// A combined error type for the public API.
#[derive(Debug, Error)]
pub enum OdsError {
    /// The entity graph could not be built.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Compilation failed.
    #[error("compile error: {0}")]
    Compile(#[from] CompileErrors),

    /// A schema snapshot could not be written or read.
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_classification() {
        assert!(CompileErrorKind::NamespaceCycle.is_precondition());
        assert!(CompileErrorKind::ConflictingMergeDirectives.is_precondition());
        assert!(!CompileErrorKind::NameCollision.is_precondition());
        assert!(!CompileErrorKind::Internal.is_precondition());
    }

    #[test]
    fn test_name_collision_mentions_both_paths() {
        let err = CompileError::name_collision(
            "StudentAddress",
            "EdFi.Student.Address",
            "EdFi.StudentAddress",
        );
        assert!(err.message.contains("EdFi.Student.Address"));
        assert!(err.message.contains("EdFi.StudentAddress"));
        assert_eq!(err.kind, CompileErrorKind::NameCollision);
    }

    #[test]
    fn test_format_report() {
        let err = CompileError::collection_identity("EdFi.Student.Addresses");
        let report = err.format_report();
        assert!(report.starts_with("error[CollectionIdentity]"));
        assert!(report.contains("--> EdFi.Student.Addresses"));
    }

    #[test]
    fn test_errors_display() {
        let single: CompileErrors = CompileError::internal("boom").into();
        assert_eq!(single.to_string(), "boom");

        let many = CompileErrors::new(vec![
            CompileError::internal("first"),
            CompileError::internal("second"),
        ]);
        assert_eq!(many.to_string(), "2 errors; first; second");
        assert!(many.has_kind(CompileErrorKind::Internal));
    }
}

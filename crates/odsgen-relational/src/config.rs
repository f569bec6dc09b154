//! Compiler configuration.

use serde::{Deserialize, Serialize};

/// Default recursion limit for identity propagation.
pub const DEFAULT_MAX_IDENTITY_DEPTH: usize = 32;

/// Target dialect for default-constraint expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Microsoft SQL Server.
    #[default]
    SqlServer,
    /// PostgreSQL.
    PostgreSql,
}

impl Dialect {
    /// Expression producing a new unique identifier.
    pub fn new_guid_expression(&self) -> &'static str {
        match self {
            Dialect::SqlServer => "newid()",
            Dialect::PostgreSql => "gen_random_uuid()",
        }
    }

    /// Expression producing the current timestamp.
    pub fn now_expression(&self) -> &'static str {
        match self {
            Dialect::SqlServer => "getdate()",
            Dialect::PostgreSql => "now()",
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::SqlServer => write!(f, "sqlserver"),
            Dialect::PostgreSql => write!(f, "postgresql"),
        }
    }
}

/// Settings for one compile run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileConfig {
    /// Dialect used for default-constraint expressions.
    pub dialect: Dialect,
    /// Namespace receiving the shared `Descriptor` table.
    ///
    /// `None` selects the first core namespace in dependency order.
    pub base_descriptor_namespace: Option<String>,
    /// Maximum nesting depth for identity propagation.
    pub max_identity_depth: usize,
}

impl CompileConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self {
            dialect: Dialect::default(),
            base_descriptor_namespace: None,
            max_identity_depth: DEFAULT_MAX_IDENTITY_DEPTH,
        }
    }

    /// Set the dialect.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Set the namespace receiving the shared `Descriptor` table.
    pub fn with_base_descriptor_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.base_descriptor_namespace = Some(namespace.into());
        self
    }

    /// Set the identity propagation depth limit.
    pub fn with_max_identity_depth(mut self, depth: usize) -> Self {
        self.max_identity_depth = depth.max(1);
        self
    }
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self::new()
    }
}

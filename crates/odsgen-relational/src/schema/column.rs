//! Column definitions.

use odsgen_model::ScalarType;
use rkyv::Archive;
use serde::{Deserialize, Serialize};

/// A column of a table.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    /// Column name (unique within its table).
    pub name: String,
    /// Data type, including length or precision where applicable.
    pub data_type: ScalarType,
    /// Whether the column accepts nulls.
    pub nullable: bool,
    /// Documentation text.
    pub documentation: String,
    /// Default-constraint expression.
    pub default_constraint: Option<String>,
    /// Whether the database generates the value.
    pub is_generated_identity: bool,
}

impl Column {
    /// Create a new non-nullable column.
    pub fn new(name: impl Into<String>, data_type: ScalarType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: false,
            documentation: String::new(),
            default_constraint: None,
            is_generated_identity: false,
        }
    }

    /// Set nullability.
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Set documentation.
    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = documentation.into();
        self
    }

    /// Set the default-constraint expression.
    pub fn with_default(mut self, expression: impl Into<String>) -> Self {
        self.default_constraint = Some(expression.into());
        self
    }

    /// Mark the value as database generated.
    pub fn generated_identity(mut self) -> Self {
        self.is_generated_identity = true;
        self
    }
}

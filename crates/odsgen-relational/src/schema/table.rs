//! Table definitions.

use super::column::Column;
use super::foreign_key::ForeignKey;
use rkyv::Archive;
use serde::{Deserialize, Serialize};

/// Why a table exists. Drives resource column injection.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum TableKind {
    /// Main table of a domain entity, association or abstract entity.
    Entity,
    /// Child table of a common property.
    Common,
    /// Child table of a collection property.
    Collection,
    /// Table of a subclass.
    Subclass,
    /// `<Entity>Extension` table.
    Extension,
    /// `<CommonTable>Extension` table.
    CommonExtension,
    /// Shared `Descriptor` table.
    DescriptorBase,
    /// Per-descriptor table.
    Descriptor,
    /// Enumeration lookup table.
    Enumeration,
    /// Map-type lookup table of a descriptor.
    MapType,
}

impl TableKind {
    /// Check if rows of this table only exist through an owning row.
    pub fn is_owned_child(&self) -> bool {
        matches!(
            self,
            TableKind::Common
                | TableKind::Collection
                | TableKind::Extension
                | TableKind::CommonExtension
        )
    }

    /// Check if this table carries seed rows.
    pub fn is_lookup(&self) -> bool {
        matches!(self, TableKind::Enumeration | TableKind::MapType)
    }

    /// Check if this table gets the `Id` resource column.
    pub fn has_resource_id(&self) -> bool {
        matches!(
            self,
            TableKind::Entity
                | TableKind::DescriptorBase
                | TableKind::Enumeration
                | TableKind::MapType
        )
    }
}

/// One seeded row: column name and literal value pairs.
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
pub struct SeedRow {
    /// Values in column order.
    pub values: Vec<(String, String)>,
}

impl SeedRow {
    /// Create an empty row.
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Add a value.
    pub fn with_value(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.push((column.into(), value.into()));
        self
    }

    /// Get the value of a column.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }
}

impl Default for SeedRow {
    fn default() -> Self {
        Self::new()
    }
}

/// A table of the relational schema.
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
pub struct Table {
    /// Owning namespace.
    pub namespace: String,
    /// Table name (unique within its namespace).
    pub name: String,
    /// Why the table exists.
    pub kind: TableKind,
    /// Columns in output order.
    pub columns: Vec<Column>,
    /// Primary key column names, sorted.
    pub primary_key: Vec<String>,
    /// Foreign keys.
    pub foreign_keys: Vec<ForeignKey>,
    /// Unique constraints, each sorted.
    pub unique_constraints: Vec<Vec<String>>,
    /// Documentation text.
    pub documentation: String,
    /// Seed rows for lookup tables.
    pub seed_rows: Option<Vec<SeedRow>>,
}

impl Table {
    /// Create an empty table.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, kind: TableKind) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            kind,
            columns: Vec::new(),
            primary_key: Vec::new(),
            foreign_keys: Vec::new(),
            unique_constraints: Vec::new(),
            documentation: String::new(),
            seed_rows: None,
        }
    }

    /// Get a column by name.
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Check whether a column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.get_column(name).is_some()
    }

    /// Check whether a column is part of the primary key.
    pub fn is_primary_key(&self, name: &str) -> bool {
        self.primary_key.iter().any(|c| c == name)
    }

    /// Primary key columns in key order.
    pub fn primary_key_columns(&self) -> impl Iterator<Item = &Column> {
        self.primary_key
            .iter()
            .filter_map(|name| self.get_column(name))
    }

    /// Column names in output order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Foreign keys pointing at the given table.
    pub fn foreign_keys_to<'a>(
        &'a self,
        namespace: &'a str,
        table: &'a str,
    ) -> impl Iterator<Item = &'a ForeignKey> + 'a {
        self.foreign_keys
            .iter()
            .filter(move |fk| fk.targets(namespace, table))
    }

    /// Dotted `namespace.name` label.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }
}

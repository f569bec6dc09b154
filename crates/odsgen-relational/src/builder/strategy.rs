//! How properties are materialized at the current nesting position.

use crate::identity::PropertyPath;
use odsgen_model::Property;

/// Accumulated naming, nullability and key rules for one nesting position.
///
/// Flattening into an inline common or choice extends the current strategy;
/// starting a child table resets it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStrategy {
    /// Prefix of every column name emitted here.
    pub column_prefix: String,
    /// Path from the table's root entity to the structure being emitted.
    pub path_prefix: PropertyPath,
    /// Extra table-name segments for child tables created here.
    pub name_segments: Vec<String>,
    /// Force emitted columns nullable.
    pub make_nullable: bool,
    /// Identity properties emitted here do not join the primary key.
    pub suppress_primary_key: bool,
    /// Emit only primary-key columns.
    pub identity_only: bool,
    /// Number of structures entered so far.
    pub depth: usize,
}

impl BuildStrategy {
    /// Strategy for a table's root entity.
    pub fn root() -> Self {
        Self::default()
    }

    /// Strategy that only computes a key.
    pub fn identity_only() -> Self {
        Self {
            identity_only: true,
            ..Self::default()
        }
    }

    /// Keep identity properties out of the primary key.
    pub fn suppressing_primary_key(mut self) -> Self {
        self.suppress_primary_key = true;
        self
    }

    /// Check whether `property` is left out entirely.
    pub fn skips(&self, property: &Property) -> bool {
        self.identity_only && !self.is_primary_key(property)
    }

    /// Path of `property` at this position.
    pub fn property_path(&self, property: &Property) -> PropertyPath {
        let mut path = self.path_prefix.clone();
        path.push(property.full_name());
        path
    }

    /// Prefix for columns generated by `property`.
    pub fn property_prefix(&self, property: &Property) -> String {
        format!("{}{}", self.column_prefix, property.context_prefix())
    }

    /// Check whether columns of `property` join the primary key.
    pub fn is_primary_key(&self, property: &Property) -> bool {
        property.is_identity && !self.suppress_primary_key
    }

    /// Check whether columns of `property` are nullable.
    pub fn is_nullable(&self, property: &Property) -> bool {
        !self.is_primary_key(property) && (self.make_nullable || !property.is_required)
    }

    /// Strategy for the members of an inline common or choice flattened here.
    pub fn flatten_into(&self, property: &Property, is_choice: bool) -> Self {
        let mut next = self.clone();
        next.column_prefix.push_str(property.context_prefix());
        next.path_prefix.push(property.full_name());
        if !property.context_prefix().is_empty() {
            next.name_segments.push(property.context_prefix().to_string());
        }
        next.make_nullable |= is_choice || !property.is_required;
        next.suppress_primary_key |= !property.is_identity;
        next.depth += 1;
        next
    }

    /// Strategy for the members of a child table created for `property`.
    ///
    /// An optional single-valued common has the owner's key only.
    pub fn child_table(&self, property: &Property) -> Self {
        let mut path_prefix = self.path_prefix.clone();
        path_prefix.push(property.full_name());
        Self {
            column_prefix: property.context_prefix().to_string(),
            path_prefix,
            name_segments: Vec::new(),
            make_nullable: false,
            suppress_primary_key: !(property.is_collection || property.is_required),
            identity_only: false,
            depth: self.depth + 1,
        }
    }
}

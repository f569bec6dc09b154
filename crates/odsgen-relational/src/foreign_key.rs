//! Foreign Key & Cascade Engine.
//!
//! Builders record relationships as column paths while a table is still a
//! draft; once the draft's merges are resolved the paths are turned into final
//! column names here. Delete cascades depend only on the relationship kind;
//! update cascades are decided per reference from the key-update analysis.

use crate::context::TableRef;
use crate::error::CompileError;
use crate::identity::{IdentityColumn, PropertyPath};
use crate::schema::ForeignKey;
use std::collections::HashSet;

/// Kind of relationship a foreign key implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relationship {
    /// Child table owned by its parent (common, collection, extension, common extension).
    Owned,
    /// Subclass table to its superclass table.
    Subclass,
    /// Non-identity reference to an independently owned entity.
    Reference,
    /// Identity reference to an independently owned entity.
    IdentityReference,
    /// Reference to an enumeration, map type or descriptor table.
    Lookup,
    /// Descriptor table to the shared `Descriptor` table.
    DescriptorBase,
}

impl Relationship {
    /// Relationship for a reference property.
    pub fn for_reference(is_identity: bool) -> Self {
        if is_identity {
            Relationship::IdentityReference
        } else {
            Relationship::Reference
        }
    }

    /// Whether deleting the target row deletes the referencing rows.
    ///
    /// True exactly where child rows cannot exist without the parent.
    pub fn cascade_on_delete(&self) -> bool {
        match self {
            Relationship::Owned | Relationship::Subclass | Relationship::DescriptorBase => true,
            Relationship::Reference | Relationship::IdentityReference | Relationship::Lookup => {
                false
            }
        }
    }

    /// Whether a foreign key of this kind may cascade key updates.
    pub fn may_cascade_on_update(&self) -> bool {
        matches!(
            self,
            Relationship::Reference | Relationship::IdentityReference
        )
    }
}

/// A foreign key whose source columns are still identified by property path.
#[derive(Debug, Clone)]
pub struct PendingForeignKey {
    pub relationship: Relationship,
    pub target: TableRef,
    /// Source column path paired with the target column name, in target key order.
    pub pairs: Vec<(PropertyPath, String)>,
    pub cascade_on_update: bool,
}

impl PendingForeignKey {
    pub fn new(
        relationship: Relationship,
        target: TableRef,
        pairs: Vec<(PropertyPath, String)>,
    ) -> Self {
        Self {
            relationship,
            target,
            pairs,
            cascade_on_update: false,
        }
    }

    /// Cascade key updates of the target, where the relationship allows it.
    pub fn with_update_cascade(mut self, cascade: bool) -> Self {
        self.cascade_on_update = cascade && self.relationship.may_cascade_on_update();
        self
    }

    /// Foreign key whose source columns are copies of the target's key columns.
    pub fn to_key(relationship: Relationship, target: TableRef, key: &[IdentityColumn]) -> Self {
        let pairs = key
            .iter()
            .map(|column| (column.path().clone(), column.name.clone()))
            .collect();
        Self::new(relationship, target, pairs)
    }

    /// Resolve source paths to column names.
    pub fn materialize(
        &self,
        table: &str,
        resolve: impl Fn(&PropertyPath) -> Option<String>,
    ) -> Result<ForeignKey, CompileError> {
        let mut source_columns = Vec::with_capacity(self.pairs.len());
        let mut target_columns = Vec::with_capacity(self.pairs.len());
        for (path, target_column) in &self.pairs {
            let source = resolve(path).ok_or_else(|| {
                CompileError::internal(format!(
                    "{}: no column for path '{}' in foreign key to {}",
                    table,
                    path.join("."),
                    self.target
                ))
            })?;
            source_columns.push(source);
            target_columns.push(target_column.clone());
        }
        Ok(ForeignKey {
            source_columns,
            target_namespace: self.target.namespace.clone(),
            target_table: self.target.name.clone(),
            target_columns,
            cascade_on_delete: self.relationship.cascade_on_delete(),
            cascade_on_update: self.cascade_on_update,
        })
    }
}

/// Drop foreign keys identical in source columns and target, keeping the first.
pub(crate) fn dedupe(foreign_keys: Vec<ForeignKey>) -> Vec<ForeignKey> {
    let mut seen = HashSet::new();
    foreign_keys
        .into_iter()
        .filter(|fk| {
            seen.insert((
                fk.source_columns.clone(),
                fk.target_namespace.clone(),
                fk.target_table.clone(),
                fk.target_columns.clone(),
            ))
        })
        .collect()
}

//! A table under construction.

use crate::context::TableRef;
use crate::error::CompileError;
use crate::foreign_key::{self, PendingForeignKey, Relationship};
use crate::identity::{IdentityColumn, PropertyPath};
use crate::merge::MergeResolver;
use crate::schema::{Column, Table, TableKind};
use tracing::warn;

#[derive(Debug, Clone)]
struct DraftColumn {
    column: Column,
    primary_key: bool,
    paths: Vec<PropertyPath>,
    origin: String,
}

/// A finished table together with its key and the entity that produced it.
#[derive(Debug, Clone)]
pub struct BuiltTable {
    /// The table.
    pub table: Table,
    /// Primary key columns with their property paths.
    pub key: Vec<IdentityColumn>,
    /// Entity or property path that produced the table.
    pub origin: String,
}

impl BuiltTable {
    /// Reference to the table.
    pub fn table_ref(&self) -> TableRef {
        TableRef::new(&self.table.namespace, &self.table.name)
    }
}

/// Columns, keys and merges of a table before its shape is fixed.
#[derive(Debug)]
pub struct TableDraft {
    table: TableRef,
    kind: TableKind,
    origin: String,
    documentation: String,
    columns: Vec<DraftColumn>,
    merges: MergeResolver,
    foreign_keys: Vec<PendingForeignKey>,
    unique_constraints: Vec<Vec<String>>,
}

impl TableDraft {
    /// Start a draft.
    pub fn new(table: TableRef, kind: TableKind, origin: impl Into<String>) -> Self {
        Self {
            table,
            kind,
            origin: origin.into(),
            documentation: String::new(),
            columns: Vec::new(),
            merges: MergeResolver::new(),
            foreign_keys: Vec::new(),
            unique_constraints: Vec::new(),
        }
    }

    /// Set documentation.
    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = documentation.into();
        self
    }

    /// Number of columns added so far.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Merge state of this table.
    pub fn merges_mut(&mut self) -> &mut MergeResolver {
        &mut self.merges
    }

    /// Add a column reached by `paths`.
    ///
    /// Returns `false` when a merge directive dropped the column. A column whose
    /// name is already taken is merged into the existing one: primary key wins,
    /// then not-null wins.
    pub fn add_column(
        &mut self,
        column: Column,
        primary_key: bool,
        paths: Vec<PropertyPath>,
        origin: &str,
    ) -> Result<bool, CompileError> {
        if paths.is_empty() {
            return Err(CompileError::internal(format!(
                "{}: column '{}' has no property path",
                self.table, column.name
            )));
        }
        if self
            .merges
            .intercept(&column.name, column.data_type, &paths)?
        {
            return Ok(false);
        }

        let Some(existing) = self
            .columns
            .iter_mut()
            .find(|c| c.column.name == column.name)
        else {
            self.columns.push(DraftColumn {
                column,
                primary_key,
                paths,
                origin: origin.to_string(),
            });
            return Ok(true);
        };

        if existing.column.data_type != column.data_type {
            return Err(CompileError::name_collision(
                &format!("{}.{}", self.table, column.name),
                &existing.origin,
                origin,
            ));
        }
        warn!(
            table = %self.table,
            column = %column.name,
            first = %existing.origin,
            second = origin,
            "merging columns with the same name"
        );
        existing.primary_key |= primary_key;
        existing.column.nullable =
            !existing.primary_key && existing.column.nullable && column.nullable;
        for path in paths {
            if !existing.paths.contains(&path) {
                existing.paths.push(path);
            }
        }
        Ok(true)
    }

    /// Copy a parent key into this table as primary-key columns.
    pub fn seed_key(&mut self, key: &[IdentityColumn], origin: &str) -> Result<(), CompileError> {
        for column in key {
            self.add_column(
                Column::new(&column.name, column.data_type),
                true,
                column.paths().to_vec(),
                origin,
            )?;
        }
        Ok(())
    }

    /// Record a foreign key.
    pub fn add_foreign_key(&mut self, foreign_key: PendingForeignKey) {
        self.foreign_keys.push(foreign_key);
    }

    /// Foreign key to `target` whose source columns are copies of `key`.
    pub fn add_key_reference(
        &mut self,
        relationship: Relationship,
        target: TableRef,
        key: &[IdentityColumn],
    ) {
        self.add_foreign_key(PendingForeignKey::to_key(relationship, target, key));
    }

    /// Record a unique constraint; column names are sorted.
    pub fn add_unique_constraint(&mut self, mut columns: Vec<String>) {
        columns.sort();
        self.unique_constraints.push(columns);
    }

    /// Resolve merges and foreign keys, then fix column order.
    ///
    /// A merged column must have the type of the column it merges into.
    pub fn finish(self) -> Result<BuiltTable, CompileError> {
        let mut columns = self.columns;

        let resolved = self
            .merges
            .resolve(|path| columns.iter().any(|c| c.paths.contains(path)))?;
        for merge in resolved {
            let Some(kept) = columns.iter_mut().find(|c| c.paths.contains(&merge.target)) else {
                continue;
            };
            if kept.column.data_type != merge.data_type {
                return Err(CompileError::invalid_merge(
                    &merge.declared_at,
                    format!(
                        "'{}' ({}) cannot merge into '{}' ({})",
                        merge.source.join("."),
                        merge.data_type,
                        merge.target.join("."),
                        kept.column.data_type
                    ),
                ));
            }
            if !kept.paths.contains(&merge.source) {
                kept.paths.push(merge.source);
            }
        }

        let lookup = |path: &PropertyPath| {
            columns
                .iter()
                .find(|c| c.paths.contains(path))
                .map(|c| c.column.name.clone())
        };
        let foreign_keys = self
            .foreign_keys
            .iter()
            .map(|fk| fk.materialize(&self.table.name, &lookup))
            .collect::<Result<Vec<_>, _>>()?;

        let (mut key_columns, other_columns): (Vec<_>, Vec<_>) =
            columns.into_iter().partition(|c| c.primary_key);
        key_columns.sort_by(|a, b| a.column.name.cmp(&b.column.name));

        let key = key_columns
            .iter()
            .map(|c| {
                let mut paths = c.paths.iter();
                let first = paths.next().cloned().unwrap_or_default();
                paths.fold(
                    IdentityColumn::new(&c.column.name, c.column.data_type, first),
                    |column, alias| column.with_alias(alias.clone()),
                )
            })
            .collect();

        let mut table = Table::new(&self.table.namespace, &self.table.name, self.kind);
        table.documentation = self.documentation;
        table.primary_key = key_columns.iter().map(|c| c.column.name.clone()).collect();
        table.columns = key_columns
            .into_iter()
            .map(|c| c.column.with_nullable(false))
            .chain(other_columns.into_iter().map(|c| c.column))
            .collect();
        table.foreign_keys = foreign_key::dedupe(foreign_keys);
        table.unique_constraints = self.unique_constraints;

        Ok(BuiltTable {
            table,
            key,
            origin: self.origin,
        })
    }
}

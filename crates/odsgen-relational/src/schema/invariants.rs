//! Global invariants of an assembled schema.

use super::relational::RelationalSchema;
use std::collections::HashSet;

/// A broken schema invariant. Always a compiler defect, never bad input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// A primary key names a column the table does not have.
    PrimaryKeyColumnMissing { table: String, column: String },
    /// A primary key is not sorted.
    PrimaryKeyUnordered { table: String },
    /// A unique constraint is not sorted or names a missing column.
    UniqueConstraintInvalid { table: String },
    /// A column name appears twice in one table.
    DuplicateColumn { table: String, column: String },
    /// A table name appears twice in one namespace.
    DuplicateTable { table: String },
    /// A foreign key pairs unequal column lists.
    ForeignKeyArity { table: String, target: String },
    /// A foreign key targets a table that does not exist.
    ForeignKeyTargetMissing { table: String, target: String },
    /// A foreign key pairs a column with a missing or differently typed target column.
    ForeignKeyColumnMismatch {
        table: String,
        column: String,
        target: String,
    },
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvariantViolation::PrimaryKeyColumnMissing { table, column } => {
                write!(f, "{}: primary key column '{}' missing", table, column)
            }
            InvariantViolation::PrimaryKeyUnordered { table } => {
                write!(f, "{}: primary key not sorted", table)
            }
            InvariantViolation::UniqueConstraintInvalid { table } => {
                write!(f, "{}: unique constraint unsorted or dangling", table)
            }
            InvariantViolation::DuplicateColumn { table, column } => {
                write!(f, "{}: duplicate column '{}'", table, column)
            }
            InvariantViolation::DuplicateTable { table } => {
                write!(f, "duplicate table '{}'", table)
            }
            InvariantViolation::ForeignKeyArity { table, target } => {
                write!(f, "{}: foreign key to {} has unequal column lists", table, target)
            }
            InvariantViolation::ForeignKeyTargetMissing { table, target } => {
                write!(f, "{}: foreign key target {} does not exist", table, target)
            }
            InvariantViolation::ForeignKeyColumnMismatch {
                table,
                column,
                target,
            } => write!(
                f,
                "{}: foreign key column '{}' does not match {}",
                table, column, target
            ),
        }
    }
}

fn is_sorted(names: &[String]) -> bool {
    names.windows(2).all(|w| w[0] < w[1])
}

/// Check every global invariant, returning all violations found.
pub fn check_invariants(schema: &RelationalSchema) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    for namespace in &schema.namespaces {
        let mut table_names = HashSet::new();
        for table in &namespace.tables {
            let label = table.qualified_name();
            if !table_names.insert(table.name.as_str()) {
                violations.push(InvariantViolation::DuplicateTable {
                    table: label.clone(),
                });
            }

            let mut column_names = HashSet::new();
            for column in &table.columns {
                if !column_names.insert(column.name.as_str()) {
                    violations.push(InvariantViolation::DuplicateColumn {
                        table: label.clone(),
                        column: column.name.clone(),
                    });
                }
            }

            for column in &table.primary_key {
                if !column_names.contains(column.as_str()) {
                    violations.push(InvariantViolation::PrimaryKeyColumnMissing {
                        table: label.clone(),
                        column: column.clone(),
                    });
                }
            }
            if !is_sorted(&table.primary_key) {
                violations.push(InvariantViolation::PrimaryKeyUnordered {
                    table: label.clone(),
                });
            }

            for unique in &table.unique_constraints {
                if !is_sorted(unique) || unique.iter().any(|c| !column_names.contains(c.as_str()))
                {
                    violations.push(InvariantViolation::UniqueConstraintInvalid {
                        table: label.clone(),
                    });
                }
            }

            for fk in &table.foreign_keys {
                let target_label = format!("{}.{}", fk.target_namespace, fk.target_table);
                if fk.source_columns.len() != fk.target_columns.len() {
                    violations.push(InvariantViolation::ForeignKeyArity {
                        table: label.clone(),
                        target: target_label,
                    });
                    continue;
                }
                let Some(target) = schema.get_table(&fk.target_namespace, &fk.target_table) else {
                    violations.push(InvariantViolation::ForeignKeyTargetMissing {
                        table: label.clone(),
                        target: target_label,
                    });
                    continue;
                };
                for (source, target_column) in fk.pairs() {
                    let matches = match (
                        table.get_column(source),
                        target.get_column(target_column),
                    ) {
                        (Some(s), Some(t)) => s.data_type == t.data_type,
                        _ => false,
                    };
                    if !matches {
                        violations.push(InvariantViolation::ForeignKeyColumnMismatch {
                            table: label.clone(),
                            column: source.to_string(),
                            target: format!("{}.{}", target_label, target_column),
                        });
                    }
                }
            }
        }
    }

    violations
}

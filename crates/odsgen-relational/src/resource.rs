//! Resource Column Injector: audit and resource-id columns by table kind.

use crate::config::{CompileConfig, Dialect};
use crate::schema::{Column, Table, TableKind};
use odsgen_model::ScalarType;
use tracing::warn;

/// Resource identifier column.
pub const ID: &str = "Id";
/// Last modification timestamp column.
pub const LAST_MODIFIED_DATE: &str = "LastModifiedDate";
/// Creation timestamp column.
pub const CREATE_DATE: &str = "CreateDate";

/// Appends resource columns once a table's shape is fixed.
#[derive(Debug, Clone, Copy)]
pub struct ResourceColumnInjector {
    dialect: Dialect,
}

impl ResourceColumnInjector {
    /// Create an injector for the configured dialect.
    pub fn new(config: &CompileConfig) -> Self {
        Self {
            dialect: config.dialect,
        }
    }

    /// Resource columns a table of `kind` receives, in order.
    pub fn columns_for(&self, kind: TableKind) -> Vec<Column> {
        let now = self.dialect.now_expression();
        match kind {
            TableKind::Entity
            | TableKind::DescriptorBase
            | TableKind::Enumeration
            | TableKind::MapType => {
                vec![
                    Column::new(ID, ScalarType::Uuid)
                        .with_default(self.dialect.new_guid_expression()),
                    Column::new(LAST_MODIFIED_DATE, ScalarType::DateTime).with_default(now),
                    Column::new(CREATE_DATE, ScalarType::DateTime).with_default(now),
                ]
            }
            TableKind::Common | TableKind::Collection => {
                vec![Column::new(CREATE_DATE, ScalarType::DateTime).with_default(now)]
            }
            TableKind::Subclass
            | TableKind::Extension
            | TableKind::CommonExtension
            | TableKind::Descriptor => Vec::new(),
        }
    }

    /// Append the resource columns for the table's kind.
    ///
    /// A table with an `Id` column also gets a unique constraint on it.
    pub fn inject(&self, table: &mut Table) {
        for column in self.columns_for(table.kind) {
            if table.has_column(&column.name) {
                warn!(
                    table = %table.qualified_name(),
                    column = %column.name,
                    "declared column shadows a resource column"
                );
                continue;
            }
            table.columns.push(column);
        }

        let id = vec![ID.to_string()];
        if table.kind.has_resource_id() && !table.unique_constraints.contains(&id) {
            table.unique_constraints.push(id);
        }
    }
}

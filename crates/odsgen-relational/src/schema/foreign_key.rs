//! Foreign key definitions.

use rkyv::Archive;
use serde::{Deserialize, Serialize};

/// A foreign key from one table to another table's primary key.
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
pub struct ForeignKey {
    /// Columns of the owning table, paired by position with `target_columns`.
    pub source_columns: Vec<String>,
    /// Namespace of the target table.
    pub target_namespace: String,
    /// Target table name.
    pub target_table: String,
    /// Columns of the target table.
    pub target_columns: Vec<String>,
    /// Whether deleting a target row deletes the referencing rows.
    pub cascade_on_delete: bool,
    /// Whether a key change on a target row is copied into the referencing rows.
    #[serde(default)]
    pub cascade_on_update: bool,
}

impl ForeignKey {
    /// Column pairs in declaration order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.source_columns
            .iter()
            .map(String::as_str)
            .zip(self.target_columns.iter().map(String::as_str))
    }

    /// Check whether this key points at the given table.
    pub fn targets(&self, namespace: &str, table: &str) -> bool {
        self.target_namespace == namespace && self.target_table == table
    }
}

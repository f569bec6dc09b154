//! The compiled schema.

use super::table::Table;
use crate::error::OdsError;
use rkyv::Archive;
use serde::{Deserialize, Serialize};

/// Tables of one namespace.
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
pub struct NamespaceSchema {
    /// Namespace name.
    pub namespace: String,
    /// Tables sorted by name.
    pub tables: Vec<Table>,
}

/// Output of a compile: tables grouped by namespace, namespaces in dependency order.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Default,
    Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
    Serialize,
    Deserialize,
)]
pub struct RelationalSchema {
    /// Namespaces in dependency order.
    pub namespaces: Vec<NamespaceSchema>,
}

impl RelationalSchema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the tables of a namespace.
    pub fn namespace(&self, namespace: &str) -> Option<&NamespaceSchema> {
        self.namespaces.iter().find(|n| n.namespace == namespace)
    }

    /// Get a table by namespace and name.
    pub fn get_table(&self, namespace: &str, name: &str) -> Option<&Table> {
        self.namespace(namespace)
            .and_then(|n| n.tables.iter().find(|t| t.name == name))
    }

    /// Find a table by name in any namespace.
    pub fn find_table(&self, name: &str) -> Option<&Table> {
        self.tables().find(|t| t.name == name)
    }

    /// All tables, namespace by namespace.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.namespaces.iter().flat_map(|n| n.tables.iter())
    }

    /// Total number of tables.
    pub fn table_count(&self) -> usize {
        self.namespaces.iter().map(|n| n.tables.len()).sum()
    }

    /// Serialize to a binary snapshot.
    pub fn to_bytes(&self) -> Result<Vec<u8>, OdsError> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|bytes| bytes.to_vec())
            .map_err(|e| OdsError::Snapshot(e.to_string()))
    }

    /// Deserialize from a binary snapshot.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, OdsError> {
        let mut aligned = rkyv::util::AlignedVec::<16>::with_capacity(bytes.len());
        aligned.extend_from_slice(bytes);
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(&aligned)
            .map_err(|e| OdsError::Snapshot(e.to_string()))
    }

    /// Hex digest of the binary snapshot. Equal schemas have equal fingerprints.
    pub fn fingerprint(&self) -> Result<String, OdsError> {
        let bytes = self.to_bytes()?;
        Ok(hex::encode(blake3::hash(&bytes).as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, TableKind};
    use odsgen_model::ScalarType;
    use pretty_assertions::assert_eq;

    fn sample_schema() -> RelationalSchema {
        let mut school = Table::new("EdFi", "School", TableKind::Entity);
        school.columns = vec![Column::new("SchoolId", ScalarType::Integer)];
        school.primary_key = vec!["SchoolId".into()];

        let mut bus = Table::new("Sample", "Bus", TableKind::Entity);
        bus.columns = vec![Column::new("BusId", ScalarType::string(60))];
        bus.primary_key = vec!["BusId".into()];

        RelationalSchema {
            namespaces: vec![
                NamespaceSchema {
                    namespace: "EdFi".into(),
                    tables: vec![school],
                },
                NamespaceSchema {
                    namespace: "Sample".into(),
                    tables: vec![bus],
                },
            ],
        }
    }

    #[test]
    fn test_table_lookup() {
        let schema = sample_schema();
        assert_eq!(schema.table_count(), 2);
        assert!(schema.get_table("EdFi", "School").is_some());
        assert!(schema.get_table("EdFi", "Bus").is_none());
        assert_eq!(schema.find_table("Bus").unwrap().namespace, "Sample");
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let schema = sample_schema();
        let bytes = schema.to_bytes().unwrap();
        let restored = RelationalSchema::from_bytes(&bytes).unwrap();
        assert_eq!(schema, restored);
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let schema = sample_schema();
        let same = sample_schema();
        assert_eq!(schema.fingerprint().unwrap(), same.fingerprint().unwrap());

        let mut changed = sample_schema();
        changed.namespaces[0].tables[0].columns[0].nullable = true;
        assert_ne!(schema.fingerprint().unwrap(), changed.fingerprint().unwrap());
        assert_eq!(schema.fingerprint().unwrap().len(), 64);
    }
}

//! Lookup tables: enumerations, map types and the shared `Descriptor` table.

use crate::schema::{Column, SeedRow, Table, TableKind};
use crate::naming;
use odsgen_model::{EnumerationItem, ScalarType};

/// Name of the shared descriptor table.
pub const DESCRIPTOR_TABLE: &str = "Descriptor";
/// Primary key of the shared descriptor table.
pub const DESCRIPTOR_ID: &str = "DescriptorId";

const CODE_VALUE: &str = "CodeValue";
const SHORT_DESCRIPTION: &str = "ShortDescription";
const DESCRIPTION: &str = "Description";

/// The shared `Descriptor` table every descriptor table extends.
pub fn descriptor_base_table(namespace: &str) -> Table {
    let mut table = Table::new(namespace, DESCRIPTOR_TABLE, TableKind::DescriptorBase);
    table.documentation = "Base table for all descriptors.".to_string();
    table.columns = vec![
        Column::new(DESCRIPTOR_ID, ScalarType::Integer).generated_identity(),
        Column::new("Namespace", ScalarType::string(255)),
        Column::new(CODE_VALUE, ScalarType::string(50)),
        Column::new(SHORT_DESCRIPTION, ScalarType::string(75)),
        Column::new(DESCRIPTION, ScalarType::string(1024)).with_nullable(true),
        Column::new("PriorDescriptorId", ScalarType::Integer).with_nullable(true),
        Column::new("EffectiveBeginDate", ScalarType::Date).with_nullable(true),
        Column::new("EffectiveEndDate", ScalarType::Date).with_nullable(true),
    ];
    table.primary_key = vec![DESCRIPTOR_ID.to_string()];
    table.unique_constraints = vec![vec![CODE_VALUE.to_string(), "Namespace".to_string()]];
    table
}

/// An enumeration or map-type table with one seed row per item.
pub fn type_table(
    namespace: &str,
    name: &str,
    items: &[EnumerationItem],
    kind: TableKind,
    documentation: &str,
) -> Table {
    let key = naming::surrogate_key_name(name);
    let mut table = Table::new(namespace, name, kind);
    table.documentation = documentation.to_string();
    table.columns = vec![
        Column::new(&key, ScalarType::Integer).generated_identity(),
        Column::new(CODE_VALUE, ScalarType::string(50)),
        Column::new(SHORT_DESCRIPTION, ScalarType::string(450)),
        Column::new(DESCRIPTION, ScalarType::string(1024)),
    ];
    table.primary_key = vec![key];
    // ShortDescription and Description both carry the item text.
    table.seed_rows = Some(
        items
            .iter()
            .map(|item| {
                SeedRow::new()
                    .with_value(CODE_VALUE, "")
                    .with_value(SHORT_DESCRIPTION, &item.short_description)
                    .with_value(DESCRIPTION, &item.short_description)
            })
            .collect(),
    );
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_descriptor_base_table() {
        let table = descriptor_base_table("EdFi");
        assert_eq!(table.primary_key, vec!["DescriptorId"]);
        assert!(table.get_column("DescriptorId").unwrap().is_generated_identity);
        assert!(!table.get_column("Namespace").unwrap().nullable);
        assert!(table.get_column("Description").unwrap().nullable);
        assert_eq!(
            table.unique_constraints,
            vec![vec!["CodeValue".to_string(), "Namespace".to_string()]]
        );
    }

    #[test]
    fn test_type_table_seeds() {
        let items = vec![EnumerationItem::new("First"), EnumerationItem::new("Second")];
        let table = type_table("EdFi", "GradeType", &items, TableKind::Enumeration, "");
        assert_eq!(
            table.column_names(),
            vec!["GradeTypeId", "CodeValue", "ShortDescription", "Description"]
        );
        let rows = table.seed_rows.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("CodeValue"), Some(""));
        assert_eq!(rows[1].get("ShortDescription"), Some("Second"));
        assert_eq!(rows[1].get("Description"), Some("Second"));
    }
}

//! Naming Resolver: table and column names from ancestor chains and contexts.
//!
//! Naming is total. Distinct structures that still end up with the same name are
//! caught by the assembler's collision check, not here.

/// Suffix of extension tables.
pub const EXTENSION_SUFFIX: &str = "Extension";
/// Suffix of descriptor tables.
pub const DESCRIPTOR_SUFFIX: &str = "Descriptor";
/// Suffix of enumeration and map-type tables.
pub const TYPE_SUFFIX: &str = "Type";
/// Suffix of surrogate key columns.
pub const SURROGATE_SUFFIX: &str = "Id";

fn is_word_boundary(name: &str, index: usize) -> bool {
    if index == 0 || index == name.len() {
        return true;
    }
    name.is_char_boundary(index)
        && name[index..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_uppercase())
}

/// Append `segment` to `accumulated`, writing an overlapping segment only once.
///
/// A segment that already starts with the accumulated name replaces it. Otherwise
/// the longest suffix of `accumulated` that is also a prefix of `segment` is
/// collapsed, provided both cuts fall on capitalized word boundaries.
pub fn collapse(accumulated: &str, segment: &str) -> String {
    if accumulated.is_empty() || segment.starts_with(accumulated) {
        return segment.to_string();
    }
    if segment.is_empty() {
        return accumulated.to_string();
    }

    let max = accumulated.len().min(segment.len());
    for overlap in (1..=max).rev() {
        let start = accumulated.len() - overlap;
        if !is_word_boundary(accumulated, start) || !is_word_boundary(segment, overlap) {
            continue;
        }
        if accumulated[start..] == segment[..overlap] {
            return format!("{}{}", accumulated, &segment[overlap..]);
        }
    }
    format!("{}{}", accumulated, segment)
}

/// Compose a table name from an ancestor chain whose last element is the local name.
///
/// `context`, when present, is placed before the local name and collapses like any
/// other segment.
pub fn table_name(ancestor_chain: &[&str], context: Option<&str>) -> String {
    let Some((local, ancestors)) = ancestor_chain.split_last() else {
        return context.unwrap_or_default().to_string();
    };
    let mut name = ancestors
        .iter()
        .fold(String::new(), |acc, segment| collapse(&acc, segment));
    if let Some(context) = context.filter(|c| !c.is_empty()) {
        name = collapse(&name, context);
    }
    collapse(&name, local)
}

/// Compose a table name by plain concatenation, with no overlap collapse.
pub fn concat_table_name(ancestor_chain: &[&str], context: Option<&str>) -> String {
    let Some((local, ancestors)) = ancestor_chain.split_last() else {
        return context.unwrap_or_default().to_string();
    };
    let mut name: String = ancestors.concat();
    name.push_str(context.unwrap_or_default());
    name.push_str(local);
    name
}

/// Column name for a local name with an optional context prefix.
pub fn column_name(local: &str, context: Option<&str>) -> String {
    format!("{}{}", context.unwrap_or_default(), local)
}

/// `<Entity>Extension`.
pub fn extension_table_name(base: &str) -> String {
    format!("{}{}", base, EXTENSION_SUFFIX)
}

/// `<Name>Descriptor`.
pub fn descriptor_table_name(name: &str) -> String {
    format!("{}{}", name, DESCRIPTOR_SUFFIX)
}

/// `<Name>Type`, or `<Name>` when it already ends with `Type`.
pub fn type_table_name(name: &str) -> String {
    if name.ends_with(TYPE_SUFFIX) {
        name.to_string()
    } else {
        format!("{}{}", name, TYPE_SUFFIX)
    }
}

/// `<Table>Id`.
pub fn surrogate_key_name(table: &str) -> String {
    format!("{}{}", table, SURROGATE_SUFFIX)
}

/// Column referencing an enumeration or map type: `<prefix><TypeTable>Id`.
pub fn enumeration_column_name(prefix: &str, property_name: &str) -> String {
    format!("{}{}", prefix, surrogate_key_name(&type_table_name(property_name)))
}

/// Column referencing a descriptor: `<prefix><Name>DescriptorId`.
pub fn descriptor_column_name(prefix: &str, property_name: &str) -> String {
    format!("{}{}", prefix, surrogate_key_name(&descriptor_table_name(property_name)))
}

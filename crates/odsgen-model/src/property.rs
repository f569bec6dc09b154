//! Property definitions.

use crate::entity::EntityKind;
use crate::types::ScalarType;
use serde::{Deserialize, Serialize};

/// A by-name pointer to another entity of the graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    /// Namespace of the target entity.
    pub namespace: String,
    /// Name of the target entity.
    pub name: String,
}

impl EntityRef {
    /// Create a new entity reference.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

/// What a property holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PropertyKind {
    /// A plain scalar value.
    Simple {
        /// Scalar type of the value.
        scalar: ScalarType,
    },
    /// A scalar value typed by a named shared definition.
    SharedSimple {
        /// Name of the shared definition.
        shared: String,
        /// Scalar type the shared definition resolves to.
        scalar: ScalarType,
    },
    /// A reference to a domain entity, association, abstract entity or subclass.
    Reference {
        /// Referenced entity.
        target: EntityRef,
    },
    /// A composed structure materialized in its own table.
    Common {
        /// The common entity.
        target: EntityRef,
    },
    /// A composed structure exactly one of whose members is present.
    Choice {
        /// The choice entity.
        target: EntityRef,
    },
    /// A composed structure flattened into its owner.
    InlineCommon {
        /// The inline common entity.
        target: EntityRef,
    },
    /// A value from an enumeration.
    Enumeration {
        /// The enumeration entity.
        target: EntityRef,
    },
    /// A value from a descriptor.
    Descriptor {
        /// The descriptor entity.
        target: EntityRef,
    },
}

impl PropertyKind {
    /// The entity this property points at, if any.
    pub fn target(&self) -> Option<&EntityRef> {
        match self {
            PropertyKind::Simple { .. } | PropertyKind::SharedSimple { .. } => None,
            PropertyKind::Reference { target }
            | PropertyKind::Common { target }
            | PropertyKind::Choice { target }
            | PropertyKind::InlineCommon { target }
            | PropertyKind::Enumeration { target }
            | PropertyKind::Descriptor { target } => Some(target),
        }
    }

    /// Scalar type for simple and shared simple properties.
    pub fn scalar(&self) -> Option<ScalarType> {
        match self {
            PropertyKind::Simple { scalar } | PropertyKind::SharedSimple { scalar, .. } => {
                Some(*scalar)
            }
            _ => None,
        }
    }

    /// Entity kinds a target of this property may have.
    pub fn accepted_target_kinds(&self) -> &'static [EntityKind] {
        match self {
            PropertyKind::Simple { .. } | PropertyKind::SharedSimple { .. } => &[],
            PropertyKind::Reference { .. } => &[
                EntityKind::DomainEntity,
                EntityKind::Association,
                EntityKind::AbstractEntity,
                EntityKind::DomainEntitySubclass,
                EntityKind::AssociationSubclass,
            ],
            PropertyKind::Common { .. } => &[EntityKind::Common],
            PropertyKind::Choice { .. } => &[EntityKind::Choice],
            PropertyKind::InlineCommon { .. } => &[EntityKind::InlineCommon],
            PropertyKind::Enumeration { .. } => &[EntityKind::Enumeration],
            PropertyKind::Descriptor { .. } => &[EntityKind::Descriptor],
        }
    }

    /// Human-readable kind name.
    pub fn name(&self) -> &'static str {
        match self {
            PropertyKind::Simple { .. } => "simple",
            PropertyKind::SharedSimple { .. } => "shared simple",
            PropertyKind::Reference { .. } => "reference",
            PropertyKind::Common { .. } => "common",
            PropertyKind::Choice { .. } => "choice",
            PropertyKind::InlineCommon { .. } => "inline common",
            PropertyKind::Enumeration { .. } => "enumeration",
            PropertyKind::Descriptor { .. } => "descriptor",
        }
    }
}

/// Declared equivalence between two property paths of one entity.
///
/// Paths are dot-separated chains of property full names (`context + name`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeDirective {
    /// Path whose columns are dropped; starts with the declaring property.
    pub source_path: String,
    /// Path whose columns are kept.
    pub target_path: String,
}

impl MergeDirective {
    /// Create a merge directive.
    pub fn new(source_path: impl Into<String>, target_path: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            target_path: target_path.into(),
        }
    }

    /// Source path split into segments.
    pub fn source_segments(&self) -> Vec<String> {
        split_path(&self.source_path)
    }

    /// Target path split into segments.
    pub fn target_segments(&self) -> Vec<String> {
        split_path(&self.target_path)
    }
}

fn split_path(path: &str) -> Vec<String> {
    path.split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// A property of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    /// Property name.
    pub name: String,
    /// What the property holds.
    pub kind: PropertyKind,
    /// Documentation text.
    #[serde(default)]
    pub documentation: String,
    /// Whether the property participates in its entity's identity.
    #[serde(default)]
    pub is_identity: bool,
    /// Whether a value is required.
    #[serde(default)]
    pub is_required: bool,
    /// Whether the property holds many values.
    #[serde(default)]
    pub is_collection: bool,
    /// Optional rename prefix.
    #[serde(default)]
    pub context: Option<String>,
    /// Merge directives declared on this property.
    #[serde(default)]
    pub merge_directives: Vec<MergeDirective>,
    /// Name of the base entity identity property this subclass property renames.
    #[serde(default)]
    pub renames_identity: Option<String>,
}

impl Property {
    /// Create a new required, non-identity, single-valued property.
    pub fn new(name: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            kind,
            documentation: String::new(),
            is_identity: false,
            is_required: true,
            is_collection: false,
            context: None,
            merge_directives: Vec::new(),
            renames_identity: None,
        }
    }

    /// Create a simple property.
    pub fn simple(name: impl Into<String>, scalar: ScalarType) -> Self {
        Self::new(name, PropertyKind::Simple { scalar })
    }

    /// Create a shared simple property.
    pub fn shared_simple(
        name: impl Into<String>,
        shared: impl Into<String>,
        scalar: ScalarType,
    ) -> Self {
        Self::new(
            name,
            PropertyKind::SharedSimple {
                shared: shared.into(),
                scalar,
            },
        )
    }

    /// Create a reference property; the property is named after its target.
    pub fn reference(namespace: impl Into<String>, target: impl Into<String>) -> Self {
        let target = EntityRef::new(namespace, target);
        Self::new(target.name.clone(), PropertyKind::Reference { target })
    }

    /// Create a common property.
    pub fn common(namespace: impl Into<String>, target: impl Into<String>) -> Self {
        let target = EntityRef::new(namespace, target);
        Self::new(target.name.clone(), PropertyKind::Common { target })
    }

    /// Create a choice property.
    pub fn choice(namespace: impl Into<String>, target: impl Into<String>) -> Self {
        let target = EntityRef::new(namespace, target);
        Self::new(target.name.clone(), PropertyKind::Choice { target })
    }

    /// Create an inline common property.
    pub fn inline_common(namespace: impl Into<String>, target: impl Into<String>) -> Self {
        let target = EntityRef::new(namespace, target);
        Self::new(target.name.clone(), PropertyKind::InlineCommon { target })
    }

    /// Create an enumeration property.
    pub fn enumeration(namespace: impl Into<String>, target: impl Into<String>) -> Self {
        let target = EntityRef::new(namespace, target);
        Self::new(target.name.clone(), PropertyKind::Enumeration { target })
    }

    /// Create a descriptor property.
    pub fn descriptor(namespace: impl Into<String>, target: impl Into<String>) -> Self {
        let target = EntityRef::new(namespace, target);
        Self::new(target.name.clone(), PropertyKind::Descriptor { target })
    }

    /// Mark as part of the identity (implies required).
    pub fn identity(mut self) -> Self {
        self.is_identity = true;
        self.is_required = true;
        self
    }

    /// Mark as optional.
    pub fn optional(mut self) -> Self {
        self.is_required = false;
        self
    }

    /// Mark as a collection.
    pub fn collection(mut self) -> Self {
        self.is_collection = true;
        self
    }

    /// Set the context prefix.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Set documentation.
    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = documentation.into();
        self
    }

    /// Add a merge directive.
    pub fn with_merge(
        mut self,
        source_path: impl Into<String>,
        target_path: impl Into<String>,
    ) -> Self {
        self.merge_directives
            .push(MergeDirective::new(source_path, target_path));
        self
    }

    /// Declare that this property renames a base entity identity property.
    pub fn renaming(mut self, base_property: impl Into<String>) -> Self {
        self.renames_identity = Some(base_property.into());
        self.is_identity = true;
        self.is_required = true;
        self
    }

    /// Context prefix, or the empty string.
    pub fn context_prefix(&self) -> &str {
        self.context.as_deref().unwrap_or("")
    }

    /// Full property name: context followed by name.
    pub fn full_name(&self) -> String {
        format!("{}{}", self.context_prefix(), self.name)
    }

    /// Check whether this property is flattened into its owner without a table of its own.
    pub fn is_flattened_structure(&self) -> bool {
        matches!(
            self.kind,
            PropertyKind::InlineCommon { .. } | PropertyKind::Choice { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name_with_context() {
        let prop = Property::reference("EdFi", "School").with_context("Home");
        assert_eq!(prop.full_name(), "HomeSchool");
        assert_eq!(prop.context_prefix(), "Home");

        let plain = Property::simple("Name", ScalarType::string(20));
        assert_eq!(plain.full_name(), "Name");
    }

    #[test]
    fn test_identity_implies_required() {
        let prop = Property::simple("Code", ScalarType::Integer).optional().identity();
        assert!(prop.is_identity);
        assert!(prop.is_required);
    }

    #[test]
    fn test_merge_directive_segments() {
        let directive = MergeDirective::new("Session.School", " School ");
        assert_eq!(directive.source_segments(), vec!["Session", "School"]);
        assert_eq!(directive.target_segments(), vec!["School"]);
    }

    #[test]
    fn test_accepted_target_kinds() {
        let reference = Property::reference("EdFi", "Student");
        assert!(reference
            .kind
            .accepted_target_kinds()
            .contains(&EntityKind::DomainEntitySubclass));
        let descriptor = Property::descriptor("EdFi", "Sex");
        assert_eq!(
            descriptor.kind.accepted_target_kinds(),
            &[EntityKind::Descriptor]
        );
    }

    #[test]
    fn test_property_json() {
        let json = r#"{
            "name": "BirthDate",
            "kind": { "kind": "simple", "scalar": { "type": "date" } },
            "isRequired": true
        }"#;
        let prop: Property = serde_json::from_str(json).unwrap();
        assert_eq!(prop.kind.scalar(), Some(ScalarType::Date));
        assert!(prop.is_required);
        assert!(!prop.is_collection);
    }
}

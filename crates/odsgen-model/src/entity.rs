//! Entity definitions.

use crate::property::{EntityRef, Property};
use serde::{Deserialize, Serialize};

/// The closed set of entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    /// A top-level persistent entity.
    DomainEntity,
    /// A top-level persistent relationship between entities.
    Association,
    /// A persistent entity that only exists through its subclasses.
    AbstractEntity,
    /// A composed structure with its own table.
    Common,
    /// A composed structure flattened into its owner.
    InlineCommon,
    /// A composed structure of alternatives.
    Choice,
    /// A namespaced code set.
    Descriptor,
    /// A fixed code set.
    Enumeration,
    /// A subclass of a domain entity or abstract entity.
    DomainEntitySubclass,
    /// A subclass of an association.
    AssociationSubclass,
    /// Additional properties for a domain entity from another namespace.
    DomainEntityExtension,
    /// Additional properties for an association from another namespace.
    AssociationExtension,
    /// Additional properties for a common from another namespace.
    CommonExtension,
}

impl EntityKind {
    /// Check if this kind builds a table of its own when compiled.
    pub fn is_top_level(&self) -> bool {
        matches!(
            self,
            EntityKind::DomainEntity
                | EntityKind::Association
                | EntityKind::AbstractEntity
                | EntityKind::Descriptor
                | EntityKind::Enumeration
        )
    }

    /// Check if this kind is a subclass.
    pub fn is_subclass(&self) -> bool {
        matches!(
            self,
            EntityKind::DomainEntitySubclass | EntityKind::AssociationSubclass
        )
    }

    /// Check if this kind is an extension.
    pub fn is_extension(&self) -> bool {
        matches!(
            self,
            EntityKind::DomainEntityExtension
                | EntityKind::AssociationExtension
                | EntityKind::CommonExtension
        )
    }

    /// Check if this kind requires a base entity.
    pub fn requires_base(&self) -> bool {
        self.is_subclass() || self.is_extension()
    }

    /// Check if this kind is a composed structure used through a property.
    pub fn is_composition(&self) -> bool {
        matches!(
            self,
            EntityKind::Common | EntityKind::InlineCommon | EntityKind::Choice
        )
    }

    /// Kinds a base entity of this kind may have.
    pub fn accepted_base_kinds(&self) -> &'static [EntityKind] {
        match self {
            EntityKind::DomainEntitySubclass => {
                &[EntityKind::DomainEntity, EntityKind::AbstractEntity]
            }
            EntityKind::AssociationSubclass => &[EntityKind::Association],
            EntityKind::DomainEntityExtension => {
                &[EntityKind::DomainEntity, EntityKind::DomainEntitySubclass]
            }
            EntityKind::AssociationExtension => {
                &[EntityKind::Association, EntityKind::AssociationSubclass]
            }
            EntityKind::CommonExtension => &[EntityKind::Common],
            _ => &[],
        }
    }

    /// Index key group. Kinds in different groups may share a name within a namespace.
    pub fn name_group(&self) -> u8 {
        match self {
            EntityKind::DomainEntity
            | EntityKind::Association
            | EntityKind::AbstractEntity
            | EntityKind::DomainEntitySubclass
            | EntityKind::AssociationSubclass => 0,
            EntityKind::Common | EntityKind::InlineCommon | EntityKind::Choice => 1,
            EntityKind::Descriptor => 2,
            EntityKind::Enumeration => 3,
            EntityKind::DomainEntityExtension | EntityKind::AssociationExtension => 4,
            EntityKind::CommonExtension => 5,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntityKind::DomainEntity => "domain entity",
            EntityKind::Association => "association",
            EntityKind::AbstractEntity => "abstract entity",
            EntityKind::Common => "common",
            EntityKind::InlineCommon => "inline common",
            EntityKind::Choice => "choice",
            EntityKind::Descriptor => "descriptor",
            EntityKind::Enumeration => "enumeration",
            EntityKind::DomainEntitySubclass => "domain entity subclass",
            EntityKind::AssociationSubclass => "association subclass",
            EntityKind::DomainEntityExtension => "domain entity extension",
            EntityKind::AssociationExtension => "association extension",
            EntityKind::CommonExtension => "common extension",
        };
        f.write_str(name)
    }
}

/// One value of an enumeration or map type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumerationItem {
    /// Short description, which is also the seeded description.
    pub short_description: String,
    /// Documentation text.
    #[serde(default)]
    pub documentation: String,
}

impl EnumerationItem {
    /// Create an item.
    pub fn new(short_description: impl Into<String>) -> Self {
        Self {
            short_description: short_description.into(),
            documentation: String::new(),
        }
    }
}

/// Enumeration-like value set declared inline on a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapType {
    /// Whether every descriptor value must map to an item.
    pub is_required: bool,
    /// Declared items.
    pub items: Vec<EnumerationItem>,
}

/// An entity of the metamodel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Entity kind.
    pub kind: EntityKind,
    /// Entity name (unique within its namespace and name group).
    pub name: String,
    /// Owning namespace.
    pub namespace: String,
    /// Documentation text.
    #[serde(default)]
    pub documentation: String,
    /// Base entity for subclass and extension kinds.
    #[serde(default)]
    pub base_entity: Option<EntityRef>,
    /// Properties in declaration order.
    #[serde(default)]
    pub properties: Vec<Property>,
    /// Items of an enumeration.
    #[serde(default)]
    pub enumeration_items: Vec<EnumerationItem>,
    /// Map type of a descriptor.
    #[serde(default)]
    pub map_type: Option<MapType>,
    /// Whether rows may change their primary key values.
    #[serde(default)]
    pub allow_primary_key_updates: bool,
}

impl Entity {
    /// Create a new entity without properties.
    pub fn new(kind: EntityKind, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            namespace: namespace.into(),
            documentation: String::new(),
            base_entity: None,
            properties: Vec::new(),
            enumeration_items: Vec::new(),
            map_type: None,
            allow_primary_key_updates: false,
        }
    }

    /// Create a domain entity.
    pub fn domain_entity(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(EntityKind::DomainEntity, namespace, name)
    }

    /// Create an association.
    pub fn association(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(EntityKind::Association, namespace, name)
    }

    /// Create an abstract entity.
    pub fn abstract_entity(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(EntityKind::AbstractEntity, namespace, name)
    }

    /// Create a common.
    pub fn common(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(EntityKind::Common, namespace, name)
    }

    /// Create an inline common.
    pub fn inline_common(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(EntityKind::InlineCommon, namespace, name)
    }

    /// Create a choice.
    pub fn choice(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(EntityKind::Choice, namespace, name)
    }

    /// Create a descriptor.
    pub fn descriptor(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(EntityKind::Descriptor, namespace, name)
    }

    /// Create an enumeration.
    pub fn enumeration(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(EntityKind::Enumeration, namespace, name)
    }

    /// Create a subclass or extension of `base`, named after the subclass.
    pub fn derived(
        kind: EntityKind,
        namespace: impl Into<String>,
        name: impl Into<String>,
        base: EntityRef,
    ) -> Self {
        let mut entity = Self::new(kind, namespace, name);
        entity.base_entity = Some(base);
        entity
    }

    /// Create an extension of `base`; extensions carry their base's name.
    pub fn extension(kind: EntityKind, namespace: impl Into<String>, base: EntityRef) -> Self {
        let name = base.name.clone();
        Self::derived(kind, namespace, name, base)
    }

    /// Add a property.
    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    /// Add multiple properties.
    pub fn with_properties(mut self, properties: impl IntoIterator<Item = Property>) -> Self {
        self.properties.extend(properties);
        self
    }

    /// Add an enumeration item.
    pub fn with_item(mut self, short_description: impl Into<String>) -> Self {
        self.enumeration_items
            .push(EnumerationItem::new(short_description));
        self
    }

    /// Set the map type of a descriptor.
    pub fn with_map_type(mut self, map_type: MapType) -> Self {
        self.map_type = Some(map_type);
        self
    }

    /// Allow primary key values to be updated.
    pub fn allowing_primary_key_updates(mut self) -> Self {
        self.allow_primary_key_updates = true;
        self
    }

    /// Set documentation.
    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = documentation.into();
        self
    }

    /// Get a property by name.
    pub fn get_property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Identity properties in declaration order.
    pub fn identity_properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter().filter(|p| p.is_identity)
    }

    /// Dotted `namespace.name` label used in diagnostics.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }
}

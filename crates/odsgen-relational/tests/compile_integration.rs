//! Integration tests for whole-graph compiles.

use odsgen_model::{
    Entity, EntityGraph, EntityKind, EntityRef, EnumerationItem, MapType, Namespace, Property,
    ScalarType,
};
use odsgen_relational::{
    compile, CompileConfig, CompileErrorKind, ForeignKey, RelationalSchema, Table, TableKind,
};
use pretty_assertions::assert_eq;

fn school() -> Entity {
    Entity::domain_entity("EdFi", "School")
        .with_property(Property::simple("SchoolId", ScalarType::Integer).identity())
}

fn student() -> Entity {
    Entity::domain_entity("EdFi", "Student")
        .with_property(Property::simple("StudentUniqueId", ScalarType::string(32)).identity())
}

fn core(entities: Vec<Entity>) -> EntityGraph {
    EntityGraph::new(vec![Namespace::core("EdFi")], entities).unwrap()
}

fn with_sample(entities: Vec<Entity>) -> EntityGraph {
    EntityGraph::new(
        vec![
            Namespace::core("EdFi"),
            Namespace::extension("Sample").with_dependency("EdFi"),
        ],
        entities,
    )
    .unwrap()
}

fn compiled(graph: &EntityGraph) -> RelationalSchema {
    compile(graph, &CompileConfig::default()).unwrap()
}

fn table<'a>(schema: &'a RelationalSchema, namespace: &str, name: &str) -> &'a Table {
    schema
        .get_table(namespace, name)
        .unwrap_or_else(|| panic!("missing table {}.{}", namespace, name))
}

fn fk_to<'a>(table: &'a Table, target: &str) -> &'a ForeignKey {
    table
        .foreign_keys
        .iter()
        .find(|fk| fk.target_table == target)
        .unwrap_or_else(|| panic!("{} has no foreign key to {}", table.name, target))
}

#[test]
fn test_required_common_gets_create_date_only() {
    let graph = core(vec![
        school().with_property(Property::common("EdFi", "Address")),
        Entity::common("EdFi", "Address").with_properties([
            Property::simple("City", ScalarType::string(30)).identity(),
            Property::simple("Street", ScalarType::string(150)),
        ]),
    ]);
    let schema = compiled(&graph);

    let school = table(&schema, "EdFi", "School");
    assert_eq!(
        school.column_names(),
        vec!["SchoolId", "Id", "LastModifiedDate", "CreateDate"]
    );

    let address = table(&schema, "EdFi", "SchoolAddress");
    assert_eq!(address.kind, TableKind::Common);
    assert_eq!(
        address.column_names(),
        vec!["City", "SchoolId", "Street", "CreateDate"]
    );
    assert_eq!(address.primary_key, vec!["City", "SchoolId"]);
    assert!(!address.get_column("Street").unwrap().nullable);
    assert!(address.unique_constraints.is_empty());

    let owner = &address.foreign_keys[0];
    assert_eq!(owner.target_table, "School");
    assert_eq!(owner.source_columns, vec!["SchoolId"]);
    assert!(owner.cascade_on_delete);
}

#[test]
fn test_association_extension_with_collection_only() {
    let graph = with_sample(vec![
        student(),
        school(),
        Entity::association("EdFi", "StudentSchoolAssociation").with_properties([
            Property::reference("EdFi", "Student").identity(),
            Property::reference("EdFi", "School").identity(),
            Property::simple("EntryDate", ScalarType::Date).identity(),
        ]),
        Entity::extension(
            EntityKind::AssociationExtension,
            "Sample",
            EntityRef::new("EdFi", "StudentSchoolAssociation"),
        )
        .with_property(Property::simple("Note", ScalarType::string(100)).collection()),
    ]);
    let schema = compiled(&graph);

    let association = table(&schema, "EdFi", "StudentSchoolAssociation");
    assert_eq!(
        association.primary_key,
        vec!["EntryDate", "SchoolId", "StudentUniqueId"]
    );
    let targets: Vec<&str> = association
        .foreign_keys
        .iter()
        .map(|fk| fk.target_table.as_str())
        .collect();
    assert_eq!(targets, vec!["Student", "School"]);
    assert!(association.foreign_keys.iter().all(|fk| !fk.cascade_on_delete));

    let sample = schema.namespace("Sample").unwrap();
    let names: Vec<&str> = sample.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["StudentSchoolAssociationNote"]);

    let note = &sample.tables[0];
    assert_eq!(note.kind, TableKind::Collection);
    assert_eq!(
        note.column_names(),
        vec!["EntryDate", "Note", "SchoolId", "StudentUniqueId", "CreateDate"]
    );
    let owner = &note.foreign_keys[0];
    assert_eq!(owner.target_namespace, "EdFi");
    assert_eq!(owner.target_table, "StudentSchoolAssociation");
    assert_eq!(
        owner.source_columns,
        vec!["EntryDate", "SchoolId", "StudentUniqueId"]
    );
    assert!(owner.cascade_on_delete);
}

#[test]
fn test_descriptor_with_required_map_type() {
    let graph = core(vec![Entity::descriptor("EdFi", "AcademicSubject").with_map_type(
        MapType {
            is_required: true,
            items: vec![
                EnumerationItem::new("Mathematics"),
                EnumerationItem::new("Science"),
                EnumerationItem::new("Social Studies"),
            ],
        },
    )]);
    let schema = compiled(&graph);

    let names: Vec<&str> = schema.tables().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["AcademicSubjectDescriptor", "AcademicSubjectType", "Descriptor"]
    );

    let descriptor = table(&schema, "EdFi", "AcademicSubjectDescriptor");
    assert_eq!(
        descriptor.column_names(),
        vec!["AcademicSubjectDescriptorId", "AcademicSubjectTypeId"]
    );
    assert!(!descriptor.get_column("AcademicSubjectTypeId").unwrap().nullable);
    let base = fk_to(descriptor, "Descriptor");
    assert_eq!(base.source_columns, vec!["AcademicSubjectDescriptorId"]);
    assert_eq!(base.target_columns, vec!["DescriptorId"]);
    assert!(base.cascade_on_delete);
    assert!(!fk_to(descriptor, "AcademicSubjectType").cascade_on_delete);

    let map = table(&schema, "EdFi", "AcademicSubjectType");
    assert_eq!(map.kind, TableKind::MapType);
    assert_eq!(
        map.column_names(),
        vec![
            "AcademicSubjectTypeId",
            "CodeValue",
            "ShortDescription",
            "Description",
            "Id",
            "LastModifiedDate",
            "CreateDate"
        ]
    );
    assert!(map.get_column("AcademicSubjectTypeId").unwrap().is_generated_identity);
    let rows = map.seed_rows.as_ref().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2].get("ShortDescription"), Some("Social Studies"));
    assert_eq!(rows[2].get("Description"), Some("Social Studies"));
    assert_eq!(rows[2].get("CodeValue"), Some(""));

    let shared = table(&schema, "EdFi", "Descriptor");
    assert_eq!(shared.kind, TableKind::DescriptorBase);
    assert_eq!(
        shared.unique_constraints,
        vec![
            vec!["CodeValue".to_string(), "Namespace".to_string()],
            vec!["Id".to_string()],
        ]
    );
}

#[test]
fn test_optional_map_type_and_extension_descriptor() {
    let graph = with_sample(vec![
        school(),
        Entity::descriptor("Sample", "Mascot").with_map_type(MapType {
            is_required: false,
            items: vec![EnumerationItem::new("Bear")],
        }),
    ]);
    let schema = compiled(&graph);

    assert!(schema.get_table("EdFi", "Descriptor").is_some());
    assert!(schema.get_table("Sample", "Descriptor").is_none());

    let mascot = table(&schema, "Sample", "MascotDescriptor");
    assert!(mascot.get_column("MascotTypeId").unwrap().nullable);
    assert_eq!(fk_to(mascot, "Descriptor").target_namespace, "EdFi");
    assert_eq!(fk_to(mascot, "MascotType").target_namespace, "Sample");
}

fn diamond_graph(class_period_merge: &str) -> EntityGraph {
    core(vec![
        school(),
        Entity::domain_entity("EdFi", "Session").with_properties([
            Property::reference("EdFi", "School").identity(),
            Property::simple("SessionName", ScalarType::string(60)).identity(),
        ]),
        Entity::domain_entity("EdFi", "CourseOffering").with_properties([
            Property::simple("LocalCourseCode", ScalarType::string(60)).identity(),
            Property::reference("EdFi", "School").identity(),
            Property::reference("EdFi", "Session")
                .identity()
                .with_merge("Session.School", "School"),
        ]),
        Entity::domain_entity("EdFi", "ClassPeriod").with_properties([
            Property::simple("ClassPeriodName", ScalarType::string(60)).identity(),
            Property::reference("EdFi", "School").identity(),
        ]),
        Entity::domain_entity("EdFi", "Section").with_properties([
            Property::simple("SectionIdentifier", ScalarType::string(255)).identity(),
            Property::reference("EdFi", "CourseOffering").identity(),
            Property::reference("EdFi", "ClassPeriod")
                .optional()
                .with_merge("ClassPeriod.School", class_period_merge),
        ]),
    ])
}

#[test]
fn test_merge_directives_collapse_diamonds() {
    let schema = compiled(&diamond_graph("CourseOffering.School"));

    let offering = table(&schema, "EdFi", "CourseOffering");
    assert_eq!(
        offering.primary_key,
        vec!["LocalCourseCode", "SchoolId", "SessionName"]
    );
    let session = fk_to(offering, "Session");
    assert_eq!(session.source_columns, vec!["SchoolId", "SessionName"]);
    assert_eq!(session.target_columns, vec!["SchoolId", "SessionName"]);
    assert!(!session.cascade_on_delete);
    assert_eq!(fk_to(offering, "School").source_columns, vec!["SchoolId"]);

    let section = table(&schema, "EdFi", "Section");
    assert_eq!(
        section.column_names(),
        vec![
            "LocalCourseCode",
            "SchoolId",
            "SectionIdentifier",
            "SessionName",
            "ClassPeriodName",
            "Id",
            "LastModifiedDate",
            "CreateDate"
        ]
    );
    assert!(section.get_column("ClassPeriodName").unwrap().nullable);

    let offering_fk = fk_to(section, "CourseOffering");
    assert_eq!(
        offering_fk.source_columns,
        vec!["LocalCourseCode", "SchoolId", "SessionName"]
    );
    let period_fk = fk_to(section, "ClassPeriod");
    assert_eq!(period_fk.source_columns, vec!["ClassPeriodName", "SchoolId"]);
    assert_eq!(period_fk.target_columns, vec!["ClassPeriodName", "SchoolId"]);
    assert!(!period_fk.cascade_on_delete);
}

#[test]
fn test_merge_to_missing_path_is_reported() {
    let errors = compile(&diamond_graph("Nowhere"), &CompileConfig::default()).unwrap_err();
    assert!(errors.has_kind(CompileErrorKind::UnresolvedMergePath));
    assert!(errors.errors()[0].path.starts_with("EdFi.Section"));
}

#[test]
fn test_subclass_identity_rename() {
    let graph = core(vec![
        Entity::abstract_entity("EdFi", "EducationOrganization").with_properties([
            Property::simple("EducationOrganizationId", ScalarType::Integer).identity(),
            Property::simple("NameOfInstitution", ScalarType::string(75)),
        ]),
        Entity::derived(
            EntityKind::DomainEntitySubclass,
            "EdFi",
            "School",
            EntityRef::new("EdFi", "EducationOrganization"),
        )
        .with_properties([
            Property::simple("SchoolId", ScalarType::Integer).renaming("EducationOrganizationId"),
            Property::simple("CharterApprovalYear", ScalarType::Year).optional(),
        ]),
        Entity::domain_entity("EdFi", "Course").with_properties([
            Property::simple("CourseCode", ScalarType::string(60)).identity(),
            Property::reference("EdFi", "School").identity(),
        ]),
    ]);
    let schema = compiled(&graph);

    let organization = table(&schema, "EdFi", "EducationOrganization");
    assert_eq!(organization.kind, TableKind::Entity);
    assert!(organization.has_column("Id"));

    let school = table(&schema, "EdFi", "School");
    assert_eq!(school.kind, TableKind::Subclass);
    assert_eq!(school.column_names(), vec!["SchoolId", "CharterApprovalYear"]);
    let base = fk_to(school, "EducationOrganization");
    assert_eq!(base.source_columns, vec!["SchoolId"]);
    assert_eq!(base.target_columns, vec!["EducationOrganizationId"]);
    assert!(base.cascade_on_delete);

    let course = table(&schema, "EdFi", "Course");
    assert_eq!(course.primary_key, vec!["CourseCode", "SchoolId"]);
    let reference = fk_to(course, "School");
    assert_eq!(reference.target_columns, vec!["SchoolId"]);
    assert!(!reference.cascade_on_delete);
}

#[test]
fn test_enumeration_table_and_reference() {
    let graph = core(vec![
        Entity::enumeration("EdFi", "GradeLevel")
            .with_item("First grade")
            .with_item("Second grade"),
        student().with_property(Property::enumeration("EdFi", "GradeLevel").optional()),
    ]);
    let schema = compiled(&graph);

    let grade = table(&schema, "EdFi", "GradeLevelType");
    assert_eq!(grade.kind, TableKind::Enumeration);
    assert_eq!(grade.primary_key, vec!["GradeLevelTypeId"]);
    let rows = grade.seed_rows.as_ref().unwrap();
    let items: Vec<&str> = rows
        .iter()
        .filter_map(|row| row.get("ShortDescription"))
        .collect();
    assert_eq!(items, vec!["First grade", "Second grade"]);

    let student = table(&schema, "EdFi", "Student");
    let column = student.get_column("GradeLevelTypeId").unwrap();
    assert_eq!(column.data_type, ScalarType::Integer);
    assert!(column.nullable);
    let lookup = fk_to(student, "GradeLevelType");
    assert_eq!(lookup.target_columns, vec!["GradeLevelTypeId"]);
    assert!(!lookup.cascade_on_delete);
}

#[test]
fn test_inline_common_and_choice_nullability() {
    let graph = core(vec![
        Entity::inline_common("EdFi", "Name").with_properties([
            Property::simple("FirstName", ScalarType::string(75)),
            Property::simple("MiddleName", ScalarType::string(75)).optional(),
            Property::simple("Nickname", ScalarType::string(75)).collection(),
        ]),
        Entity::choice("EdFi", "Contact").with_properties([
            Property::simple("Email", ScalarType::string(128)),
            Property::simple("Phone", ScalarType::string(24)),
        ]),
        student().with_properties([
            Property::inline_common("EdFi", "Name"),
            Property::inline_common("EdFi", "Name").with_context("Alias").optional(),
            Property::choice("EdFi", "Contact"),
        ]),
    ]);
    let schema = compiled(&graph);

    let student = table(&schema, "EdFi", "Student");
    let nullable: Vec<(&str, bool)> = student
        .columns
        .iter()
        .take(7)
        .map(|c| (c.name.as_str(), c.nullable))
        .collect();
    assert_eq!(
        nullable,
        vec![
            ("StudentUniqueId", false),
            ("FirstName", false),
            ("MiddleName", true),
            ("AliasFirstName", true),
            ("AliasMiddleName", true),
            ("Email", true),
            ("Phone", true),
        ]
    );

    let nickname = table(&schema, "EdFi", "StudentNickname");
    assert_eq!(nickname.primary_key, vec!["Nickname", "StudentUniqueId"]);
    let alias = table(&schema, "EdFi", "StudentAliasNickname");
    assert_eq!(alias.primary_key, vec!["Nickname", "StudentUniqueId"]);
    assert_eq!(fk_to(alias, "Student").source_columns, vec!["StudentUniqueId"]);
}

#[test]
fn test_common_extension_extends_every_usage() {
    let graph = with_sample(vec![
        school().with_property(Property::common("EdFi", "Address")),
        student().with_property(Property::common("EdFi", "Address").collection()),
        Entity::common("EdFi", "Address").with_properties([
            Property::simple("City", ScalarType::string(30)).identity(),
            Property::simple("Street", ScalarType::string(150)),
        ]),
        Entity::extension(
            EntityKind::CommonExtension,
            "Sample",
            EntityRef::new("EdFi", "Address"),
        )
        .with_properties([
            Property::simple("Complex", ScalarType::string(30)).optional(),
            Property::simple("Tag", ScalarType::string(20)).collection(),
        ]),
    ]);
    let schema = compiled(&graph);

    let sample: Vec<&str> = schema
        .namespace("Sample")
        .unwrap()
        .tables
        .iter()
        .map(|t| t.name.as_str())
        .collect();
    assert_eq!(
        sample,
        vec![
            "SchoolAddressExtension",
            "SchoolAddressTag",
            "StudentAddressExtension",
            "StudentAddressTag"
        ]
    );

    let extension = table(&schema, "Sample", "SchoolAddressExtension");
    assert_eq!(extension.kind, TableKind::CommonExtension);
    assert_eq!(extension.column_names(), vec!["City", "SchoolId", "Complex"]);
    assert!(extension.get_column("Complex").unwrap().nullable);
    let owner = fk_to(extension, "SchoolAddress");
    assert_eq!(owner.target_namespace, "EdFi");
    assert_eq!(owner.source_columns, vec!["City", "SchoolId"]);
    assert!(owner.cascade_on_delete);

    let tag = table(&schema, "Sample", "StudentAddressTag");
    assert_eq!(tag.primary_key, vec!["City", "StudentUniqueId", "Tag"]);
    assert_eq!(fk_to(tag, "StudentAddress").target_namespace, "EdFi");
}

#[test]
fn test_column_type_collision() {
    let graph = core(vec![
        school(),
        Entity::domain_entity("EdFi", "Enrollment").with_properties([
            Property::simple("EnrollmentId", ScalarType::Integer).identity(),
            Property::simple("SchoolId", ScalarType::string(10)),
            Property::reference("EdFi", "School"),
        ]),
    ]);
    let errors = compile(&graph, &CompileConfig::default()).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.errors()[0].kind, CompileErrorKind::NameCollision);
    assert!(errors.errors()[0].message.contains("EdFi.Enrollment.SchoolId"));
    assert!(errors.errors()[0].message.contains("EdFi.Enrollment.School"));
}

#[test]
fn test_preconditions_reported_together() {
    let graph = core(vec![
        school(),
        Entity::domain_entity("EdFi", "Staff").with_properties([
            Property::simple("StaffUniqueId", ScalarType::string(32)).identity(),
            Property::reference("EdFi", "Campus"),
            Property::simple("Credential", ScalarType::string(20))
                .identity()
                .collection(),
        ]),
    ]);
    let errors = compile(&graph, &CompileConfig::default()).unwrap_err();
    let kinds: Vec<CompileErrorKind> = errors.errors().iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            CompileErrorKind::UnresolvedReference,
            CompileErrorKind::CollectionIdentity
        ]
    );
    assert!(kinds.iter().all(CompileErrorKind::is_precondition));
}

#[test]
fn test_merge_between_different_types_is_rejected() {
    let graph = core(vec![
        school(),
        Entity::domain_entity("EdFi", "Thing").with_properties([
            Property::simple("Code", ScalarType::string(10)).identity(),
            Property::reference("EdFi", "School").with_merge("School.SchoolId", "Code"),
        ]),
    ]);
    let errors = compile(&graph, &CompileConfig::default()).unwrap_err();
    assert_eq!(errors.len(), 1);
    let error = &errors.errors()[0];
    assert_eq!(error.kind, CompileErrorKind::InvalidMergeDirective);
    assert_eq!(error.path, "EdFi.Thing.School");
    assert!(error.message.contains("School.SchoolId"));
}

fn renamed_school_graph(calendar_merge: &str) -> EntityGraph {
    core(vec![
        Entity::abstract_entity("EdFi", "EducationOrganization").with_property(
            Property::simple("EducationOrganizationId", ScalarType::Integer).identity(),
        ),
        Entity::derived(
            EntityKind::DomainEntitySubclass,
            "EdFi",
            "School",
            EntityRef::new("EdFi", "EducationOrganization"),
        )
        .with_properties([
            Property::simple("SchoolId", ScalarType::Integer).renaming("EducationOrganizationId"),
            Property::reference("EdFi", "Calendar")
                .optional()
                .with_merge("Calendar.School.SchoolId", calendar_merge),
        ]),
        Entity::domain_entity("EdFi", "Calendar").with_properties([
            Property::simple("CalendarCode", ScalarType::string(60)).identity(),
            Property::reference("EdFi", "School").identity(),
        ]),
        Entity::domain_entity("EdFi", "Session").with_properties([
            Property::reference("EdFi", "School").identity(),
            Property::simple("SessionName", ScalarType::string(60)).identity(),
        ]),
        Entity::domain_entity("EdFi", "CourseOffering").with_properties([
            Property::simple("LocalCourseCode", ScalarType::string(60)).identity(),
            Property::reference("EdFi", "School").identity(),
            Property::reference("EdFi", "Session").identity().with_merge(
                "Session.School.EducationOrganizationId",
                "School.EducationOrganizationId",
            ),
        ]),
    ])
}

#[test]
fn test_merge_through_renamed_identity() {
    for target in ["SchoolId", "EducationOrganizationId"] {
        let schema = compiled(&renamed_school_graph(target));

        let school = table(&schema, "EdFi", "School");
        assert_eq!(school.column_names(), vec!["SchoolId", "CalendarCode"], "{}", target);
        let calendar = fk_to(school, "Calendar");
        assert_eq!(calendar.source_columns, vec!["CalendarCode", "SchoolId"]);
        assert_eq!(calendar.target_columns, vec!["CalendarCode", "SchoolId"]);
        let base = fk_to(school, "EducationOrganization");
        assert_eq!(base.source_columns, vec!["SchoolId"]);
        assert_eq!(base.target_columns, vec!["EducationOrganizationId"]);

        let offering = table(&schema, "EdFi", "CourseOffering");
        assert_eq!(
            offering.primary_key,
            vec!["LocalCourseCode", "SchoolId", "SessionName"]
        );
        let session = fk_to(offering, "Session");
        assert_eq!(session.source_columns, vec!["SchoolId", "SessionName"]);
        assert_eq!(session.target_columns, vec!["SchoolId", "SessionName"]);
        assert_eq!(fk_to(offering, "School").source_columns, vec!["SchoolId"]);
    }
}

#[test]
fn test_key_updates_cascade_along_references() {
    let graph = core(vec![
        student()
            .allowing_primary_key_updates()
            .with_property(Property::simple("Nickname", ScalarType::string(30)).collection()),
        school().with_property(Property::reference("EdFi", "Student").with_context("Favorite")),
        Entity::association("EdFi", "StudentSchoolAssociation").with_properties([
            Property::reference("EdFi", "Student").identity(),
            Property::reference("EdFi", "School").identity(),
            Property::simple("EntryDate", ScalarType::Date).identity(),
        ]),
        Entity::domain_entity("EdFi", "Transcript").with_properties([
            Property::reference("EdFi", "Student").identity(),
            Property::reference("EdFi", "StudentSchoolAssociation")
                .identity()
                .with_merge("StudentSchoolAssociation.Student", "Student"),
        ]),
    ]);
    let schema = compiled(&graph);

    let association = table(&schema, "EdFi", "StudentSchoolAssociation");
    assert!(fk_to(association, "Student").cascade_on_update);
    assert!(!fk_to(association, "School").cascade_on_update);

    let favorite = fk_to(table(&schema, "EdFi", "School"), "Student");
    assert_eq!(favorite.source_columns, vec!["FavoriteStudentUniqueId"]);
    assert!(favorite.cascade_on_update);
    assert!(!favorite.cascade_on_delete);

    let transcript = table(&schema, "EdFi", "Transcript");
    assert_eq!(
        transcript.primary_key,
        vec!["EntryDate", "SchoolId", "StudentUniqueId"]
    );
    assert!(fk_to(transcript, "Student").cascade_on_update);
    assert!(!fk_to(transcript, "StudentSchoolAssociation").cascade_on_update);

    let nickname = table(&schema, "EdFi", "StudentNickname");
    assert!(!fk_to(nickname, "Student").cascade_on_update);
    assert!(schema
        .tables()
        .flat_map(|t| t.foreign_keys.iter())
        .filter(|fk| fk.cascade_on_update)
        .all(|fk| !fk.cascade_on_delete));
}

use pretty_assertions::assert_eq;
use recordkit_model::{EntitySchema, FieldDef, FieldPath, FieldType, ModelError};
use serde_json::json;

fn appointment() -> EntitySchema {
    EntitySchema::new(
        "Appointment",
        vec![
            FieldDef::text("Title", true),
            FieldDef::integer("Priority"),
            FieldDef::decimal("Fee"),
            FieldDef::bool("Billable"),
            FieldDef::datetime("ScheduledAt").optional(),
            FieldDef::enumeration("Status", vec!["Open".into(), "Closed".into()]),
            FieldDef::navigation(
                "Patient",
                vec![FieldDef::text("Name", true), FieldDef::integer("Age")],
            ),
            FieldDef::collection("Notes", vec![FieldDef::text("Text", true)]),
        ],
    )
}

// ── FieldDef constructors ────────────────────────────────────────

#[test]
fn text_field_carries_search_flag() {
    let f = FieldDef::text("Title", true);
    assert_eq!(f.field_type, FieldType::Text);
    assert!(f.searchable);
    assert!(!f.nullable);
}

#[test]
fn navigation_is_always_nullable() {
    let f = FieldDef::navigation("Patient", vec![]);
    assert!(f.nullable);
    assert_eq!(f.field_type, FieldType::Navigation);
}

#[test]
fn enumeration_keeps_options() {
    let f = FieldDef::enumeration("Status", vec!["Open".into()]);
    assert_eq!(f.enum_options, Some(vec!["Open".to_string()]));
}

#[test]
fn builders_set_flags() {
    let f = FieldDef::integer("Count").optional().with_search();
    assert!(f.nullable);
    assert!(f.searchable);
}

// ── FieldType classification ─────────────────────────────────────

#[test]
fn orderable_types() {
    assert!(FieldType::Text.is_orderable());
    assert!(FieldType::DateTime.is_orderable());
    assert!(FieldType::Enum.is_orderable());
    assert!(!FieldType::Bool.is_orderable());
    assert!(!FieldType::Uuid.is_orderable());
    assert!(!FieldType::Collection.is_orderable());
}

#[test]
fn textual_types() {
    assert!(FieldType::Text.is_textual());
    assert!(FieldType::Enum.is_textual());
    assert!(!FieldType::Integer.is_textual());
}

#[test]
fn field_type_deserializes_snake_case_and_alias() {
    let t: FieldType = serde_json::from_value(json!("date_time")).unwrap();
    assert_eq!(t, FieldType::DateTime);
    let t: FieldType = serde_json::from_value(json!("datetime")).unwrap();
    assert_eq!(t, FieldType::DateTime);
}

// ── Defaults ─────────────────────────────────────────────────────

#[test]
fn type_defaults() {
    assert_eq!(FieldDef::text("a", false).default_value(), json!(""));
    assert_eq!(FieldDef::integer("a").default_value(), json!(0));
    assert_eq!(FieldDef::bool("a").default_value(), json!(false));
    assert_eq!(FieldDef::datetime("a").default_value(), json!("1970-01-01T00:00:00Z"));
    assert_eq!(
        FieldDef::uuid("a").default_value(),
        json!("00000000-0000-0000-0000-000000000000")
    );
    assert_eq!(
        FieldDef::enumeration("a", vec!["X".into(), "Y".into()]).default_value(),
        json!("X")
    );
    assert_eq!(FieldDef::navigation("a", vec![]).default_value(), json!(null));
    assert_eq!(FieldDef::collection("a", vec![]).default_value(), json!([]));
    assert_eq!(FieldDef::integer("a").optional().default_value(), json!(null));
}

// ── Searchable paths ─────────────────────────────────────────────

#[test]
fn searchable_paths_include_navigation_but_not_collections() {
    let paths: Vec<String> = appointment()
        .searchable_paths()
        .iter()
        .map(FieldPath::dotted)
        .collect();
    assert_eq!(paths, vec!["Title".to_string(), "Patient.Name".to_string()]);
}

// ── Conform ──────────────────────────────────────────────────────

#[test]
fn conform_backfills_and_coerces() {
    let data = appointment()
        .conform(json!({"Title": "Checkup", "Priority": "3", "ScheduledAt": "2024-05-01"}))
        .unwrap();
    assert_eq!(data["Priority"], json!(3));
    assert_eq!(data["ScheduledAt"], json!("2024-05-01T00:00:00Z"));
    assert_eq!(data["Status"], json!("Open"));
    assert_eq!(data["Patient"], json!(null));
    assert_eq!(data["Notes"], json!([]));
}

#[test]
fn conform_strips_id() {
    let data = appointment()
        .conform(json!({"Id": "whatever", "Title": "x"}))
        .unwrap();
    assert!(data.get("Id").is_none());
}

#[test]
fn conform_rejects_unknown_key() {
    let err = appointment().conform(json!({"Bogus": 1})).unwrap_err();
    assert!(matches!(err, ModelError::UnknownField(ref p) if p == "/Bogus"));
}

#[test]
fn conform_rejects_unknown_nested_key() {
    let err = appointment()
        .conform(json!({"Patient": {"Name": "A", "Height": 2}}))
        .unwrap_err();
    assert!(matches!(err, ModelError::UnknownField(ref p) if p == "/Patient/Height"));
}

#[test]
fn conform_rejects_bad_enum_and_null_on_required() {
    assert!(matches!(
        appointment().conform(json!({"Status": "Pending"})),
        Err(ModelError::InvalidValue { .. })
    ));
    assert!(matches!(
        appointment().conform(json!({"Priority": null})),
        Err(ModelError::InvalidValue { .. })
    ));
}

#[test]
fn conform_rejects_non_object() {
    assert!(matches!(
        appointment().conform(json!([1, 2])),
        Err(ModelError::InvalidEntity(_))
    ));
}

#[test]
fn conform_coerces_collection_elements() {
    let data = appointment()
        .conform(json!({"Notes": [{"Text": 12}, {}]}))
        .unwrap();
    assert_eq!(data["Notes"], json!([{"Text": "12"}, {"Text": ""}]));
}

#[test]
fn schema_roundtrips_through_json_catalog_form() {
    let raw = json!({
        "entity_type": "Qualification",
        "fields": [
            {"name": "Name", "field_type": "text", "searchable": true},
            {"name": "Level", "field_type": "enum", "options": ["A", "B"]}
        ]
    });
    let schema: EntitySchema = serde_json::from_value(raw).unwrap();
    assert_eq!(schema.field("Level").unwrap().enum_options.as_ref().unwrap().len(), 2);
    assert!(schema.field("Name").unwrap().searchable);
    assert!(schema.field("name").is_none());
}

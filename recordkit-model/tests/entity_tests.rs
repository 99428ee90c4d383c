use pretty_assertions::assert_eq;
use recordkit_model::{Entity, EntitySchema, FieldDef, ModelError};
use recordkit_types::EntityId;
use serde_json::json;

fn make_entity(data: serde_json::Value) -> Entity {
    Entity {
        id: EntityId::new(),
        entity_type: "PatientNotes".to_string(),
        data,
        version: 3,
        created_at: 1000,
        modified_at: 2000,
    }
}

// ── Construction ─────────────────────────────────────────────────

#[test]
fn draft_has_nil_id() {
    let e = Entity::draft("PatientNotes", json!({}));
    assert!(e.id.is_nil());
    assert_eq!(e.version, 0);
}

#[test]
fn entity_serde_roundtrip() {
    let e = make_entity(json!({"Text": "hello"}));
    let back: Entity = serde_json::from_str(&serde_json::to_string(&e).unwrap()).unwrap();
    assert_eq!(back, e);
}

// ── Wire form ────────────────────────────────────────────────────

#[test]
fn from_json_reads_id() {
    let id = EntityId::new();
    let e = Entity::from_json("PatientNotes", json!({"Id": id.to_string(), "Text": "a"})).unwrap();
    assert_eq!(e.id, id);
    assert_eq!(e.data, json!({"Text": "a"}));
}

#[test]
fn from_json_without_id_is_draft() {
    let e = Entity::from_json("PatientNotes", json!({"Id": null})).unwrap();
    assert!(e.id.is_nil());
}

#[test]
fn from_json_rejects_bad_id() {
    let err = Entity::from_json("PatientNotes", json!({"Id": "nope"})).unwrap_err();
    assert!(matches!(err, ModelError::InvalidValue { ref field, .. } if field == "Id"));
    assert!(Entity::from_json("PatientNotes", json!({"Id": 5})).is_err());
}

#[test]
fn from_json_rejects_non_object() {
    assert!(matches!(
        Entity::from_json("PatientNotes", json!("text")),
        Err(ModelError::InvalidEntity(_))
    ));
}

#[test]
fn to_json_merges_id() {
    let e = make_entity(json!({"Text": "a"}));
    let wire = e.to_json();
    assert_eq!(wire["Id"], json!(e.id.to_string()));
    assert_eq!(wire["Text"], json!("a"));
}

#[test]
fn to_json_carries_stored_version() {
    let e = make_entity(json!({"Text": "a"}));
    assert_eq!(e.to_json()["Version"], json!(3));
    assert!(Entity::draft("PatientNotes", json!({})).to_json().get("Version").is_none());
}

#[test]
fn from_json_reads_version() {
    let e = make_entity(json!({"Text": "a"}));
    let back = Entity::from_json("PatientNotes", e.to_json()).unwrap();
    assert_eq!(back.id, e.id);
    assert_eq!(back.version, 3);
    assert_eq!(back.data, json!({"Text": "a"}));

    let unversioned = Entity::from_json("PatientNotes", json!({"Text": "a"})).unwrap();
    assert_eq!(unversioned.version, 0);
}

#[test]
fn from_json_rejects_bad_version() {
    for bad in [json!("2"), json!(-1), json!(1.5)] {
        let err = Entity::from_json("PatientNotes", json!({"Version": bad})).unwrap_err();
        assert!(matches!(err, ModelError::InvalidValue { ref field, .. } if field == "Version"));
    }
}

#[test]
fn conform_strips_wire_members() {
    let schema = EntitySchema::new("PatientNotes", vec![FieldDef::text("Text", true)]);
    let data = schema
        .conform(json!({"Id": EntityId::new().to_string(), "Version": 2, "Text": "a"}))
        .unwrap();
    assert_eq!(data, json!({"Text": "a"}));
}

// ── Validation ───────────────────────────────────────────────────

#[test]
fn validate_checks_type_and_payload() {
    let schema = EntitySchema::new("PatientNotes", vec![FieldDef::text("Text", true)]);
    assert!(schema.validate(&make_entity(json!({"Text": "ok"}))).is_ok());

    let mut wrong_type = make_entity(json!({"Text": "ok"}));
    wrong_type.entity_type = "Appointment".into();
    assert!(matches!(schema.validate(&wrong_type), Err(ModelError::InvalidEntity(_))));

    assert!(matches!(
        schema.validate(&make_entity(json!({"Other": 1}))),
        Err(ModelError::UnknownField(_))
    ));
}

use clap::Parser;
use pretty_assertions::assert_eq;
use recordkit_cli::{run, Args};
use recordkit_query::QueryError;
use recordkit_service::ServiceError;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const FIRST: &str = "01929b4e-7a10-7c3e-9a51-3f0d1c2b4a01";
const SECOND: &str = "01929b4e-7a10-7c3e-9a51-3f0d1c2b4a02";
const THIRD: &str = "01929b4e-7a10-7c3e-9a51-3f0d1c2b4a03";

fn demo(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("demos").join(name)
}

/// Copies the demo seed into a scratch directory so `--save` can write it.
fn scratch_seed() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("seed.json");
    fs::copy(demo("seed.json"), &path).unwrap();
    (dir, path)
}

fn exec(data: &Path, extra: &[&str]) -> anyhow::Result<Value> {
    let schemas = demo("catalog.json");
    let mut argv = vec![
        "recordkit".to_string(),
        "--schemas".to_string(),
        schemas.display().to_string(),
        "--data".to_string(),
        data.display().to_string(),
    ];
    argv.extend(extra.iter().map(|s| s.to_string()));
    let args = Args::try_parse_from(argv)?;
    let out = run(&args)?;
    Ok(serde_json::from_str(&out)?)
}

fn ids(listing: &Value) -> Vec<&str> {
    listing
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["Id"].as_str().unwrap())
        .collect()
}

// ── Catalog ─────────────────────────────────────────────────────

#[test]
fn types_lists_catalog_in_name_order() {
    let out = exec(&demo("seed.json"), &["types"]).unwrap();
    assert_eq!(
        out,
        json!([
            "Appointment",
            "PatientEnrollmentLink",
            "PatientMedicalHistoryNote",
            "PatientNotes",
            "Qualification"
        ])
    );
}

#[test]
fn missing_catalog_is_reported() {
    let args = Args::try_parse_from(["recordkit", "--schemas", "/nonexistent/catalog.json", "types"]).unwrap();
    let err = run(&args).unwrap_err();
    assert!(err.to_string().contains("schema catalog"));
}

#[test]
fn save_requires_data() {
    let schemas = demo("catalog.json");
    let parsed = Args::try_parse_from([
        "recordkit",
        "--schemas",
        schemas.to_str().unwrap(),
        "--save",
        "types",
    ]);
    assert!(parsed.is_err());
}

// ── Query ───────────────────────────────────────────────────────

#[test]
fn query_without_parameters_returns_first_page() {
    let out = exec(&demo("seed.json"), &["query", "Appointment"]).unwrap();
    assert_eq!(ids(&out), vec![FIRST, SECOND, THIRD]);
}

#[test]
fn query_searches_and_sorts() {
    let out = exec(
        &demo("seed.json"),
        &[
            "query",
            "Appointment",
            "--search",
            "clinic",
            "--sort-field",
            "ScheduledAt",
            "--sort-order",
            "desc",
        ],
    )
    .unwrap();
    assert_eq!(ids(&out), vec![THIRD, FIRST]);
}

#[test]
fn query_search_reaches_navigation_text() {
    let out = exec(&demo("seed.json"), &["query", "Appointment", "--search", "lind"]).unwrap();
    assert_eq!(ids(&out), vec![SECOND]);
}

#[test]
fn query_applies_filters() {
    let filters = r#"[{"PropertyName":"DurationMinutes","Operator":"GreaterOrEqual","Value":30}]"#;
    let out = exec(&demo("seed.json"), &["query", "Appointment", "--filters", filters]).unwrap();
    assert_eq!(ids(&out), vec![FIRST, SECOND]);
}

#[test]
fn query_pages_through_results() {
    let out = exec(
        &demo("seed.json"),
        &["query", "Appointment", "--page", "2", "--page-size", "2"],
    )
    .unwrap();
    assert_eq!(ids(&out), vec![THIRD]);
}

#[test]
fn query_rejects_non_positive_page() {
    let err = exec(&demo("seed.json"), &["query", "Appointment", "--page", "-1"]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ServiceError>(),
        Some(ServiceError::Query(QueryError::InvalidPage { number: -1, .. }))
    ));
}

#[test]
fn query_rejects_bad_sort_order() {
    let err = exec(
        &demo("seed.json"),
        &["query", "Appointment", "--sort-field", "Title", "--sort-order", "sideways"],
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ServiceError>(),
        Some(ServiceError::Query(QueryError::InvalidSortOrder(_)))
    ));
}

#[test]
fn query_ignores_sort_order_without_field() {
    let out = exec(&demo("seed.json"), &["query", "Appointment", "--sort-order", "sideways"]).unwrap();
    assert_eq!(ids(&out), vec![FIRST, SECOND, THIRD]);
}

#[test]
fn query_unknown_type_fails() {
    let err = exec(&demo("seed.json"), &["query", "Invoice"]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ServiceError>(),
        Some(ServiceError::UnknownEntityType(t)) if t == "Invoice"
    ));
}

// ── Get / Delete ────────────────────────────────────────────────

#[test]
fn get_returns_entity_or_null() {
    let found = exec(&demo("seed.json"), &["get", "Appointment", FIRST]).unwrap();
    assert_eq!(found["Title"], json!("Annual checkup"));

    let missing = exec(
        &demo("seed.json"),
        &["get", "Appointment", "01929b4e-7a10-7c3e-9a51-3f0d1c2b4aff"],
    )
    .unwrap();
    assert_eq!(missing, Value::Null);
}

#[test]
fn get_rejects_malformed_id() {
    let err = exec(&demo("seed.json"), &["get", "Appointment", "not-a-uuid"]).unwrap_err();
    assert!(err.to_string().contains("Invalid id"));
}

#[test]
fn delete_missing_entity_fails() {
    let err = exec(
        &demo("seed.json"),
        &["delete", "Appointment", "01929b4e-7a10-7c3e-9a51-3f0d1c2b4aff"],
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ServiceError>(),
        Some(ServiceError::EntityNotFound { .. })
    ));
}

#[test]
fn delete_with_save_removes_from_file() {
    let (_dir, seed) = scratch_seed();
    let out = exec(&seed, &["--save", "delete", "Appointment", SECOND]).unwrap();
    assert_eq!(out, json!({ "status": true }));

    let listing = exec(&seed, &["query", "Appointment"]).unwrap();
    assert_eq!(ids(&listing), vec![FIRST, THIRD]);
}

// ── Create / Update / Patch ─────────────────────────────────────

#[test]
fn create_with_save_persists_new_entity() {
    let (_dir, seed) = scratch_seed();
    let body = r#"{"Name":"Pediatric First Aid","Issuer":"Red Cross","Level":"Intermediate","Active":true}"#;
    let out = exec(&seed, &["--save", "create", "Qualification", body]).unwrap();
    let id = out["id"].as_str().unwrap().to_string();

    let fetched = exec(&seed, &["get", "Qualification", &id]).unwrap();
    assert_eq!(fetched["Name"], json!("Pediatric First Aid"));
    assert_eq!(fetched["ValidUntil"], Value::Null);
}

#[test]
fn create_without_save_leaves_file_untouched() {
    let (_dir, seed) = scratch_seed();
    let before = fs::read_to_string(&seed).unwrap();
    exec(
        &seed,
        &["create", "Qualification", r#"{"Name":"Triage","Level":"Basic","Active":true}"#],
    )
    .unwrap();
    assert_eq!(fs::read_to_string(&seed).unwrap(), before);
}

#[test]
fn create_reads_body_from_file() {
    let (dir, seed) = scratch_seed();
    let body = dir.path().join("body.json");
    fs::write(&body, r#"{"Name":"Phlebotomy","Level":"Basic","Active":false}"#).unwrap();
    let arg = format!("@{}", body.display());

    let out = exec(&seed, &["create", "Qualification", &arg]).unwrap();
    assert!(out["id"].is_string());
}

#[test]
fn create_rejects_unknown_field() {
    let err = exec(
        &demo("seed.json"),
        &["create", "Qualification", r#"{"Name":"X","Colour":"red"}"#],
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ServiceError>(),
        Some(ServiceError::Query(QueryError::UnknownField(_)))
    ));
}

#[test]
fn patch_replaces_field() {
    let patch = r#"[{"op":"replace","path":"/Status","value":"Closed"}]"#;
    let out = exec(&demo("seed.json"), &["patch", "Appointment", FIRST, patch]).unwrap();
    assert_eq!(out["Status"], json!("Closed"));
    assert_eq!(out["Title"], json!("Annual checkup"));
}

#[test]
fn patch_failed_test_aborts() {
    let (_dir, seed) = scratch_seed();
    let patch = r#"[
        {"op":"replace","path":"/Title","value":"Changed"},
        {"op":"test","path":"/Status","value":"Closed"}
    ]"#;
    let err = exec(&seed, &["--save", "patch", "Appointment", FIRST, patch]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ServiceError>(),
        Some(ServiceError::Query(QueryError::PatchTestFailed { .. }))
    ));

    let fetched = exec(&seed, &["get", "Appointment", FIRST]).unwrap();
    assert_eq!(fetched["Title"], json!("Annual checkup"));
}

#[test]
fn patch_empty_document_is_missing_patch() {
    let err = exec(&demo("seed.json"), &["patch", "Appointment", FIRST, "[]"]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ServiceError>(),
        Some(ServiceError::Query(QueryError::MissingPatch))
    ));
}

#[test]
fn update_replaces_whole_entity() {
    let (_dir, seed) = scratch_seed();
    let body = json!({
        "Id": THIRD,
        "Title": "Follow-up (moved)",
        "Location": "Annex",
        "ScheduledAt": "2024-03-12T10:15:00Z",
        "DurationMinutes": 20,
        "Status": "Open"
    })
    .to_string();
    let out = exec(&seed, &["--save", "update", "Appointment", THIRD, &body]).unwrap();
    assert_eq!(out["Location"], json!("Annex"));
    assert_eq!(out["Fee"], Value::Null);

    let listing = exec(&seed, &["query", "Appointment", "--search", "annex"]).unwrap();
    assert_eq!(ids(&listing), vec![SECOND, THIRD]);
}

#[test]
fn update_with_mismatched_id_fails() {
    let body = json!({ "Id": SECOND, "Title": "x" }).to_string();
    let err = exec(&demo("seed.json"), &["update", "Appointment", FIRST, &body]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ServiceError>(),
        Some(ServiceError::IdMismatch { .. })
    ));
}

// ── Optimistic concurrency ──────────────────────────────────────

#[test]
fn stale_update_conflicts_with_optimistic() {
    let (_dir, seed) = scratch_seed();
    let read = exec(&seed, &["get", "Appointment", FIRST]).unwrap();
    assert_eq!(read["Version"], json!(1));

    let mut first = read.clone();
    first["Title"] = json!("Annual checkup (rescheduled)");
    let out = exec(&seed, &["--optimistic", "--save", "update", "Appointment", FIRST, &first.to_string()])
        .unwrap();
    assert_eq!(out["Version"], json!(2));

    let mut stale = read;
    stale["Title"] = json!("Annual checkup (cancelled)");
    let err = exec(&seed, &["--optimistic", "--save", "update", "Appointment", FIRST, &stale.to_string()])
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ServiceError>(),
        Some(ServiceError::VersionConflict { expected: 1, actual: 2, .. })
    ));

    let stored = exec(&seed, &["get", "Appointment", FIRST]).unwrap();
    assert_eq!(stored["Title"], json!("Annual checkup (rescheduled)"));
}

#[test]
fn update_without_version_writes_unconditionally() {
    let (_dir, seed) = scratch_seed();
    let mut body = exec(&seed, &["get", "Appointment", FIRST]).unwrap();
    body.as_object_mut().unwrap().remove("Version");
    body["Title"] = json!("Walk-in");
    let out = exec(&seed, &["--optimistic", "update", "Appointment", FIRST, &body.to_string()]).unwrap();
    assert_eq!(out["Title"], json!("Walk-in"));
}

//! End-to-end submission tests: store a template, assign it, fill it in and
//! walk the record through review.
//!
//! Run with: cargo test --test submission_lifecycle

use hemo_forms::prelude::*;
use hemo_forms::records::ROWS_KEY;
use hemo_forms::registry::resolve_assignment;
use hemo_forms::template::{load_template_file, TemplateFormat};
use serde_json::json;
use std::path::PathBuf;

fn load_fixture(name: &str) -> FormTemplate {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    load_template_file(&path, TemplateFormat::Auto).expect("Failed to load fixture")
}

#[tokio::test]
async fn test_check_record_through_approval() {
    let store = MemoryTemplateStore::new();
    let template = store
        .save(load_fixture("pre_transfusion.json"))
        .await
        .expect("save");
    assert_eq!(template.version, 1);

    let assignment = FormAssignment {
        user_id: "nurse-7".into(),
        template_id: template.id.clone(),
        pin_version: false,
        assigned_version: None,
    };
    let template = resolve_assignment(&store, &assignment)
        .await
        .expect("resolve");

    let mut sub = Submission::new(&template, Some("nurse-7".into()));
    sub.set_value("patient_id", json!("P-2231")).unwrap();
    sub.set_value("unit_number", json!("U004512")).unwrap();
    sub.set_value("abo_rh", json!("O-")).unwrap();
    sub.set_value("identity_confirmed", json!(true)).unwrap();
    sub.set_value("reaction", json!(true)).unwrap();

    // Reaction recorded without notes: the rule makes notes required
    let err = sub
        .perform(&template, "submit", SystemRole::User, "nurse-7")
        .unwrap_err();
    let FormsError::InvalidRecord(errs) = err else {
        panic!("expected InvalidRecord, got {err:?}");
    };
    assert_eq!(errs.get("reaction_notes"), Some("Reaction notes is required"));

    sub.set_value("reaction_notes", json!("Mild urticaria, resolved"))
        .unwrap();
    sub.perform(&template, "submit", SystemRole::User, "nurse-7")
        .expect("submit");
    sub.perform(&template, "start_review", SystemRole::Admin, "dr-ortiz")
        .expect("start_review");
    sub.perform(&template, "reject", SystemRole::Admin, "dr-ortiz")
        .expect("reject");

    assert_eq!(sub.state, WorkflowState::Rejected);
    assert!(sub.is_terminal());
    let actions: Vec<_> = sub.history.iter().map(|h| h.action.as_str()).collect();
    assert_eq!(actions, vec!["submit", "start_review", "reject"]);
    assert!(sub.available_actions(&template, SystemRole::Superadmin).is_empty());
}

#[tokio::test]
async fn test_rows_record_with_pinned_version() {
    let store = MemoryTemplateStore::new();
    let v1 = store.save(load_fixture("fridge_log.yaml")).await.expect("save");

    let mut v2 = v1.clone();
    v2.name = "Blood fridge temperature log (rev. B)".into();
    let v2 = store.save(v2).await.expect("save v2");
    assert_eq!(v2.version, 2);

    let assignment = FormAssignment {
        user_id: "tech-3".into(),
        template_id: v1.id.clone(),
        pin_version: true,
        assigned_version: Some(1),
    };
    let template = resolve_assignment(&store, &assignment)
        .await
        .expect("resolve");
    assert_eq!(template.version, 1);

    let mut sub = Submission::new(&template, None);
    sub.set_value("rows", json!([])).unwrap();
    let err = sub
        .perform(&template, "submit", SystemRole::User, "tech-3")
        .unwrap_err();
    let FormsError::InvalidRecord(errs) = err else {
        panic!("expected InvalidRecord, got {err:?}");
    };
    assert!(errs.get(ROWS_KEY).is_some());

    sub.set_value(
        "rows",
        json!([
            { "day": "2024-05-01", "reading": 4.1 },
            { "day": "2024-05-02", "reading": 3.8, "shift": "PM", "checked_by": "tech-3" }
        ]),
    )
    .unwrap();
    assert!(validate_record(&template, &sub.values).is_empty());

    sub.perform(&template, "submit", SystemRole::Admin, "lead-1")
        .expect("admins may submit this log");
    assert_eq!(sub.state, WorkflowState::Submitted);
    assert_eq!(sub.template_version, 1);
}

#[tokio::test]
async fn test_invalid_template_is_never_stored() {
    let store = MemoryTemplateStore::new();
    let result = store.save(load_fixture("broken_rows.json")).await;
    assert!(matches!(result, Err(FormsError::InvalidTemplate(_))));
    assert!(store.list().await.expect("list").is_empty());
}

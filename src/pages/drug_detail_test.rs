use super::*;
use serde_json::json;

#[test]
fn section_label_splits_camel_case() {
    assert_eq!(section_label("goodFoods"), "Good foods");
    assert_eq!(section_label("departmentCategory"), "Department category");
    assert_eq!(section_label("cure_rate"), "Cure rate");
}

#[test]
fn knowledge_sections_render_lists_and_flags() {
    let entry: KnowledgeEntry = serde_json::from_value(json!({
        "name": "Hypertension",
        "symptoms": ["headache", "dizziness"],
        "insuranceCovered": true,
        "description": "",
        "nursing": null,
    }))
    .unwrap();

    let rows = knowledge_sections(&entry);

    assert_eq!(
        rows,
        vec![
            ("Insurance covered".to_owned(), "Yes".to_owned()),
            ("Symptoms".to_owned(), "headache, dizziness".to_owned()),
        ]
    );
}

use super::*;
use serde_json::json;

fn record(id: &str) -> QuestionRecord {
    QuestionRecord { id: id.to_owned(), question: format!("q{id}"), answer: None, created_at: None }
}

#[test]
fn preview_flattens_whitespace() {
    assert_eq!(preview("  Is   ibuprofen\nsafe? "), "Is ibuprofen safe?");
}

#[test]
fn preview_truncates_long_text() {
    let long = "word ".repeat(40);
    let shown = preview(&long);
    assert!(shown.ends_with("..."));
    assert!(shown.chars().count() <= PREVIEW_CHARS + 3);
}

#[test]
fn stats_rows_keep_scalars_only() {
    let stats: QuestionStats =
        serde_json::from_value(json!({"totalQuestions": 12, "lastAsked": "today", "byIntent": {"drug": 3}})).unwrap();

    assert_eq!(
        stats_rows(&stats),
        vec![("Last asked".to_owned(), "today".to_owned()), ("Total questions".to_owned(), "12".to_owned())]
    );
}

#[test]
fn without_record_removes_only_matching_id() {
    let records = vec![record("1"), record("2"), record("3")];
    let kept = without_record(&records, "2");
    assert_eq!(kept.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), vec!["1", "3"]);
}

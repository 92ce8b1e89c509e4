use serde_json::json;

use showif_spec::{FormSpec, LintReport, lint};

fn load(source: &str) -> FormSpec {
    serde_json::from_str(source).expect("deserialize form")
}

fn codes(report: &LintReport) -> Vec<&str> {
    report.issues.iter().map(|issue| issue.code.as_str()).collect()
}

#[test]
fn clean_form_passes_lint() {
    let report = lint(&load(include_str!("fixtures/signup.json")));
    assert!(report.valid, "unexpected issues: {:?}", report.issues);
    assert!(report.issues.is_empty());
}

#[test]
fn broken_form_reports_every_problem() {
    let report = lint(&load(include_str!("fixtures/broken.json")));
    assert!(!report.valid);

    let codes = codes(&report);
    for expected in [
        "invalid_choice",
        "duplicate_field",
        "parse_failure",
        "unresolved_reference",
        "dependency_cycle",
        "invalid_pattern",
    ] {
        assert!(codes.contains(&expected), "missing {expected} in {codes:?}");
    }

    let unresolved = report
        .issues
        .iter()
        .find(|issue| issue.code == "unresolved_reference")
        .expect("unresolved issue");
    assert_eq!(unresolved.field.as_deref(), Some("c"));

    let cycle = report
        .issues
        .iter()
        .find(|issue| issue.code == "dependency_cycle")
        .expect("cycle issue");
    assert_eq!(
        cycle.message,
        "dependency cycle: wrap_Inputfield_a -> wrap_Inputfield_b -> wrap_Inputfield_a"
    );

    let parse = report
        .issues
        .iter()
        .find(|issue| issue.code == "parse_failure")
        .expect("parse issue");
    assert_eq!(parse.field.as_deref(), Some("d"));
}

#[test]
fn bad_operator_table_stops_lint_early() {
    let spec: FormSpec = serde_json::from_value(json!({
        "id": "ops",
        "title": "Operators",
        "engine": { "operators": ["=", "=="] },
        "fields": [
            { "name": "a", "widget": { "kind": "text" }, "show_if": "b=1" }
        ]
    }))
    .expect("deserialize");
    let report = lint(&spec);
    assert!(!report.valid);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].field, None);
}

#[test]
fn invalid_field_names_are_reported() {
    let spec: FormSpec = serde_json::from_value(json!({
        "id": "names",
        "title": "Names",
        "fields": [
            { "name": "first name", "widget": { "kind": "text" } },
            { "name": "ok", "widget": { "kind": "text" } }
        ]
    }))
    .expect("deserialize");
    let report = lint(&spec);
    assert_eq!(codes(&report), vec!["invalid_field_id"]);
    assert_eq!(report.issues[0].field.as_deref(), Some("first name"));
}

#[test]
fn names_with_rule_syntax_cannot_be_referenced() {
    let spec: FormSpec = serde_json::from_value(json!({
        "id": "names",
        "title": "Names",
        "fields": [
            { "name": "first.name", "widget": { "kind": "text" } },
            { "name": "a=b", "widget": { "kind": "text" } },
            { "name": "score>", "widget": { "kind": "text" } },
            { "name": "wow!", "widget": { "kind": "text" } },
            { "name": "plain_name-2", "widget": { "kind": "text" } }
        ]
    }))
    .expect("deserialize");
    let report = lint(&spec);
    let flagged: Vec<&str> = report
        .issues
        .iter()
        .filter(|issue| issue.code == "invalid_field_name")
        .filter_map(|issue| issue.field.as_deref())
        .collect();
    assert_eq!(flagged, vec!["first.name", "a=b", "score>", "wow!"]);
    assert_eq!(report.issues.len(), 4);
}

#[test]
fn radio_group_with_two_preselections_is_flagged() {
    let spec: FormSpec = serde_json::from_value(json!({
        "id": "radios",
        "title": "Radios",
        "fields": [
            { "name": "r1", "widget": { "kind": "radio", "group": "g", "options": ["a"], "selected": "a" } },
            { "name": "r2", "widget": { "kind": "radio", "group": "g", "options": ["b"], "selected": "b" } },
            { "name": "r3", "widget": { "kind": "radio", "group": "h", "options": ["c"], "selected": "c" } }
        ]
    }))
    .expect("deserialize");
    let report = lint(&spec);
    assert!(!report.valid);
    assert_eq!(codes(&report), vec!["conflicting_selection"]);
    assert_eq!(report.issues[0].field.as_deref(), Some("r2"));
    assert!(report.issues[0].message.contains("'r1'"));
}

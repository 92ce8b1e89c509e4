use std::collections::BTreeMap;

use showif_spec::{
    ConditionParser, Engine, EngineError, FieldDeclaration, FieldId, FieldNaming, Report,
    VisibilityMap,
};

type Values = BTreeMap<FieldId, String>;

fn id(name: &str) -> FieldId {
    FieldNaming::default().resolve(name).expect("field id")
}

fn decl(name: &str, rule: &str) -> FieldDeclaration {
    FieldDeclaration::new(id(name), rule)
}

fn values(pairs: &[(&str, &str)]) -> Values {
    pairs
        .iter()
        .map(|(name, value)| (id(name), value.to_string()))
        .collect()
}

fn boot(declarations: Vec<FieldDeclaration>, values: &Values) -> (Engine, Report, VisibilityMap) {
    let mut rendered = VisibilityMap::new();
    let (engine, report) = Engine::bootstrap(
        declarations,
        &ConditionParser::default(),
        values,
        &mut rendered,
    )
    .expect("bootstrap");
    (engine, report, rendered)
}

fn visible(engine: &Engine, name: &str) -> bool {
    engine.is_visible(&id(name)).expect("registered field")
}

#[test]
fn dependent_follows_referenced_value() {
    let mut live = values(&[("A", "no")]);
    let (mut engine, report, mut rendered) =
        boot(vec![decl("A", ""), decl("B", "A=yes")], &live);
    assert!(report.is_clean());
    assert!(visible(&engine, "A"));
    assert!(!visible(&engine, "B"));
    assert!(!rendered[&id("B")]);

    live.insert(id("A"), "yes".into());
    engine
        .notify_changed(&id("A"), &live, &mut rendered)
        .expect("notify");
    assert!(visible(&engine, "B"));
    assert!(rendered[&id("B")]);
}

#[test]
fn declaration_order_does_not_matter() {
    let live = values(&[("A", "yes")]);
    let (engine, report, _) = boot(vec![decl("B", "A=yes"), decl("A", "")], &live);
    assert!(report.is_clean());
    assert!(visible(&engine, "B"));
    assert_eq!(
        engine.graph().get(&id("A")).expect("A").dependents(),
        &[id("B")]
    );
}

#[test]
fn conditions_are_and_combined() {
    let mut live = values(&[("P", "1"), ("Q", "2")]);
    let (mut engine, _, mut rendered) = boot(
        vec![decl("P", ""), decl("Q", ""), decl("F", "P=1,Q=2")],
        &live,
    );
    assert!(visible(&engine, "F"));

    live.insert(id("Q"), "3".into());
    engine
        .notify_changed(&id("Q"), &live, &mut rendered)
        .expect("notify");
    assert!(!visible(&engine, "F"));

    live.insert(id("Q"), "2".into());
    live.insert(id("P"), "0".into());
    engine
        .notify_changed(&id("P"), &live, &mut rendered)
        .expect("notify");
    assert!(!visible(&engine, "F"));
}

#[test]
fn hidden_ancestor_hides_descendants() {
    let mut live = values(&[("R", "stop"), ("A", "yes")]);
    let (mut engine, _, mut rendered) = boot(
        vec![decl("R", ""), decl("A", "R=go"), decl("B", "A=yes")],
        &live,
    );
    assert!(!visible(&engine, "A"));
    assert!(!visible(&engine, "B"), "B inherits A being hidden");

    live.insert(id("R"), "go".into());
    engine
        .notify_changed(&id("R"), &live, &mut rendered)
        .expect("notify");
    assert!(visible(&engine, "A"));
    assert!(visible(&engine, "B"));
    assert!(rendered[&id("B")]);
}

#[test]
fn hidden_reference_fails_every_condition_on_it() {
    let live = values(&[("X", "0"), ("B", "1"), ("D", "2")]);
    let (engine, _, _) = boot(
        vec![
            decl("X", ""),
            decl("B", "X=1"),
            decl("D", ""),
            decl("C", "B=1,D=2"),
        ],
        &live,
    );
    assert!(!visible(&engine, "B"));
    assert!(visible(&engine, "D"));
    assert!(!visible(&engine, "C"));
}

#[test]
fn modifiers_transform_the_referenced_value() {
    let live = values(&[("count", "hello"), ("name", "Alice"), ("tags", "")]);
    let (engine, _, _) = boot(
        vec![
            decl("count", ""),
            decl("name", ""),
            decl("tags", ""),
            decl("long", "count.length>3"),
            decl("exact", "count.length>5"),
            decl("lower", "name.lowercase=alice"),
            decl("upper", "name.uppercase=ALICE"),
            decl("plain", "name=alice"),
            decl("tagged", "tags.length>0"),
        ],
        &live,
    );
    assert!(visible(&engine, "long"));
    assert!(!visible(&engine, "exact"));
    assert!(visible(&engine, "lower"));
    assert!(visible(&engine, "upper"));
    assert!(!visible(&engine, "plain"));
    assert!(!visible(&engine, "tagged"));
}

#[test]
fn numeric_comparison_rejects_non_numbers() {
    let live = values(&[("age", "18"), ("score", "abc")]);
    let (engine, _, _) = boot(
        vec![
            decl("age", ""),
            decl("score", ""),
            decl("adult", "age>=18"),
            decl("senior", "age>64"),
            decl("high", "score>1"),
            decl("low", "score<1"),
        ],
        &live,
    );
    assert!(visible(&engine, "adult"));
    assert!(!visible(&engine, "senior"));
    assert!(!visible(&engine, "high"));
    assert!(!visible(&engine, "low"));
}

#[test]
fn unparsable_rule_leaves_field_visible() {
    let live = values(&[("A", "no")]);
    let (engine, report, rendered) = boot(
        vec![
            decl("A", ""),
            decl("M", "malformed!!!"),
            decl("N", "A=yes,broken"),
        ],
        &live,
    );
    assert!(report.is_clean());
    assert!(visible(&engine, "M"));
    assert!(visible(&engine, "N"), "whole rule is dropped, not one clause");
    assert!(rendered[&id("N")]);

    let failed: Vec<&FieldId> = engine
        .diagnostics()
        .iter()
        .map(|diagnostic| &diagnostic.field)
        .collect();
    assert_eq!(failed, vec![&id("M"), &id("N")]);
    assert!(
        engine
            .graph()
            .get(&id("A"))
            .expect("A")
            .dependents()
            .is_empty()
    );
}

#[test]
fn unresolved_reference_is_reported_and_never_satisfied() {
    let live = values(&[("A", "yes"), ("ghost", "1")]);
    let (engine, report, _) = boot(
        vec![decl("A", ""), decl("B", "ghost=1"), decl("C", "A=yes")],
        &live,
    );
    assert_eq!(
        report.errors,
        vec![EngineError::UnresolvedReference {
            field: id("B"),
            reference: id("ghost"),
        }]
    );
    assert!(!visible(&engine, "B"));
    assert!(visible(&engine, "C"), "unrelated fields keep evaluating");
}

#[test]
fn invalid_pattern_is_reported() {
    let live = values(&[("code", "AB"), ("A", "abc")]);
    let (engine, report, _) = boot(
        vec![
            decl("code", ""),
            decl("A", ""),
            decl("ok", "code~=^[A-Z]{2}$"),
            decl("bad", "A~=("),
        ],
        &live,
    );
    assert!(visible(&engine, "ok"));
    assert!(!visible(&engine, "bad"));
    assert_eq!(report.errors.len(), 1);
    assert!(matches!(
        &report.errors[0],
        EngineError::InvalidPattern { field, pattern, .. }
            if *field == id("bad") && pattern == "("
    ));
}

#[test]
fn cycles_are_reported_instead_of_recursing() {
    let live = values(&[("X", "1"), ("Y", "1")]);
    let (engine, report, _) = boot(
        vec![decl("X", "Y=1"), decl("Y", "X=1"), decl("S", "S=1")],
        &live,
    );
    assert_eq!(
        engine.graph().cycles(),
        vec![vec![id("X"), id("Y")], vec![id("S")]]
    );
    assert!(report.errors.contains(&EngineError::cycle(vec![id("Y"), id("X")])));
    assert!(report.errors.contains(&EngineError::cycle(vec![id("S")])));
    assert_eq!(
        EngineError::cycle(vec![id("Y"), id("X")]).to_string(),
        "dependency cycle: wrap_Inputfield_X -> wrap_Inputfield_Y -> wrap_Inputfield_X"
    );
}

#[test]
fn diamond_dependents_are_evaluated_once_per_path() {
    let live = values(&[("A", "1"), ("B", "1"), ("C", "1")]);
    let (mut engine, _, mut rendered) = boot(
        vec![
            decl("A", ""),
            decl("B", "A=1"),
            decl("C", "A=1"),
            decl("D", "B=1,C=1"),
        ],
        &live,
    );
    assert!(visible(&engine, "D"));

    let report = engine
        .notify_changed(&id("A"), &live, &mut rendered)
        .expect("notify");
    assert!(report.is_clean());
    assert_eq!(report.evaluations, 4);
}

#[test]
fn change_trigger_skips_the_changed_field() {
    let mut live = values(&[("Z", "0"), ("A", "x")]);
    let (mut engine, _, mut rendered) = boot(
        vec![decl("Z", ""), decl("A", "Z=1"), decl("B", "A=x")],
        &live,
    );
    assert!(!visible(&engine, "A"));

    live.insert(id("Z"), "1".into());
    let report = engine
        .notify_changed(&id("A"), &live, &mut rendered)
        .expect("notify");
    assert_eq!(report.evaluations, 1);
    assert!(!visible(&engine, "A"), "A itself is not re-evaluated");

    engine
        .evaluate(&id("A"), &live, &mut rendered)
        .expect("evaluate");
    assert!(visible(&engine, "A"));
    assert!(visible(&engine, "B"));
}

#[test]
fn unknown_and_duplicate_fields_are_errors() {
    let live = Values::new();
    let (mut engine, _, mut rendered) = boot(vec![decl("A", "")], &live);
    assert_eq!(
        engine.evaluate(&id("nope"), &live, &mut rendered),
        Err(EngineError::UnknownField(id("nope")))
    );
    assert_eq!(
        engine.notify_changed(&id("nope"), &live, &mut rendered),
        Err(EngineError::UnknownField(id("nope")))
    );

    let result = Engine::bootstrap(
        vec![decl("A", ""), decl("A", "")],
        &ConditionParser::default(),
        &live,
        &mut rendered,
    );
    assert!(matches!(result, Err(EngineError::DuplicateField(field)) if field == id("A")));
}

use std::collections::HashMap;

use regex::Regex;
use serde::Serialize;

use crate::error::EngineError;
use crate::graph::{DependencyGraph, FieldDeclaration};
use crate::operator::Operator;
use crate::parser::ConditionParser;
use crate::spec::field::{FieldSpec, Widget};
use crate::spec::form::FormSpec;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintIssue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintReport {
    pub valid: bool,
    pub issues: Vec<LintIssue>,
}

/// Checks a declaration without live values: operator table, field ids,
/// rules, references, cycles, patterns and widget defaults.
pub fn lint(spec: &FormSpec) -> LintReport {
    let mut issues = Vec::new();

    let parser = match spec.engine.parser() {
        Ok(parser) => parser,
        Err(error) => {
            issues.push(engine_issue(None, &EngineError::from(error)));
            return finish(issues);
        }
    };
    let naming = parser.naming();

    let mut graph = DependencyGraph::new();
    for field in &spec.fields {
        if let Some(issue) = widget_issue(field) {
            issues.push(issue);
        }
        let id = match naming.resolve(&field.name) {
            Ok(id) => id,
            Err(error) => {
                issues.push(engine_issue(Some(field.name.as_str()), &EngineError::from(error)));
                continue;
            }
        };
        if let Some(issue) = name_issue(field, &parser) {
            issues.push(issue);
        }
        if let Err(error) = graph.register(FieldDeclaration::new(id, field.rule())) {
            issues.push(engine_issue(Some(field.name.as_str()), &error));
        }
    }

    issues.extend(radio_group_issues(&spec.fields));

    for diagnostic in graph.link(&parser) {
        issues.push(LintIssue {
            field: Some(naming.base_name(&diagnostic.field).to_string()),
            code: "parse_failure".into(),
            message: diagnostic.error.to_string(),
        });
    }

    for error in graph.unresolved_references() {
        let field = match &error {
            EngineError::UnresolvedReference { field, .. } => Some(naming.base_name(field)),
            _ => None,
        };
        issues.push(engine_issue(field, &error));
    }

    for cycle in graph.cycles() {
        let field = cycle.first().map(|id| naming.base_name(id).to_string());
        let error = EngineError::cycle(cycle);
        issues.push(LintIssue {
            field,
            code: error.code().into(),
            message: error.to_string(),
        });
    }

    for field in graph.fields() {
        for condition in field.conditions() {
            if condition.operator == Operator::Matches
                && let Err(error) = Regex::new(&condition.literal)
            {
                issues.push(LintIssue {
                    field: Some(naming.base_name(field.id()).to_string()),
                    code: "invalid_pattern".into(),
                    message: format!(
                        "pattern '{}' does not compile: {}",
                        condition.literal, error
                    ),
                });
            }
        }
    }

    finish(issues)
}

fn finish(issues: Vec<LintIssue>) -> LintReport {
    LintReport {
        valid: issues.is_empty(),
        issues,
    }
}

fn engine_issue(field: Option<&str>, error: &EngineError) -> LintIssue {
    LintIssue {
        field: field.map(str::to_string),
        code: error.code().into(),
        message: error.to_string(),
    }
}

fn widget_issue(field: &FieldSpec) -> Option<LintIssue> {
    let (options, selected) = match &field.widget {
        Widget::Select { options, selected } | Widget::Radio { options, selected, .. } => {
            (options, selected.as_deref()?)
        }
        Widget::Checkbox { .. } | Widget::Text { .. } => return None,
    };
    if options.is_empty() || options.iter().any(|option| option == selected) {
        return None;
    }
    Some(LintIssue {
        field: Some(field.name.clone()),
        code: "invalid_choice".into(),
        message: format!(
            "{} selection '{}' is not one of its options",
            field.widget.kind_label(),
            selected
        ),
    })
}

/// A name containing `.` or an operator character can never be written on
/// the left of a clause, so no rule is able to reference the field.
fn name_issue(field: &FieldSpec, parser: &ConditionParser) -> Option<LintIssue> {
    let reserved = field.name.chars().find(|&c| {
        c == '.' || parser.table().tokens().any(|token| token.contains(c))
    })?;
    Some(LintIssue {
        field: Some(field.name.clone()),
        code: "invalid_field_name".into(),
        message: format!(
            "field name contains '{}' and cannot be referenced by a rule",
            reserved
        ),
    })
}

/// Radios of one group share a single selection; more than one preselected
/// sibling leaves the group value to whichever is declared first.
fn radio_group_issues(fields: &[FieldSpec]) -> Vec<LintIssue> {
    let mut first_selected: HashMap<&str, &str> = HashMap::new();
    let mut issues = Vec::new();
    for field in fields {
        let Widget::Radio {
            group,
            selected: Some(_),
            ..
        } = &field.widget
        else {
            continue;
        };
        match first_selected.get(group.as_str()) {
            Some(first) => issues.push(LintIssue {
                field: Some(field.name.clone()),
                code: "conflicting_selection".into(),
                message: format!(
                    "radio group '{}' is already preselected by '{}'",
                    group, first
                ),
            }),
            None => {
                first_selected.insert(group.as_str(), field.name.as_str());
            }
        }
    }
    issues
}

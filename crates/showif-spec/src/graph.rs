//! Field registry with reverse ("dependents") edges.

use std::collections::HashMap;

use tracing::warn;

use crate::condition::{Condition, FieldId};
use crate::error::{EngineError, canonical_cycle};
use crate::parser::{ConditionParser, ParseError};

/// Input to the registration pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDeclaration {
    pub id: FieldId,
    pub rule: String,
}

impl FieldDeclaration {
    pub fn new(id: FieldId, rule: impl Into<String>) -> Self {
        Self {
            id,
            rule: rule.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    id: FieldId,
    raw_rule: String,
    conditions: Vec<Condition>,
    dependents: Vec<FieldId>,
    visible: bool,
}

impl Field {
    fn new(id: FieldId, raw_rule: String) -> Self {
        Self {
            id,
            raw_rule,
            conditions: Vec::new(),
            dependents: Vec::new(),
            visible: true,
        }
    }

    pub fn id(&self) -> &FieldId {
        &self.id
    }

    pub fn raw_rule(&self) -> &str {
        &self.raw_rule
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Fields whose conditions reference this one, in first-seen order.
    pub fn dependents(&self) -> &[FieldId] {
        &self.dependents
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

/// A rule that failed to parse; the field it belongs to has no conditions.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleDiagnostic {
    pub field: FieldId,
    pub error: ParseError,
}

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    fields: Vec<Field>,
    index: HashMap<FieldId, usize>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the registration pass over all `declarations`, then the linking
    /// pass, and returns the parse diagnostics of the latter.
    pub fn build<I>(
        declarations: I,
        parser: &ConditionParser,
    ) -> Result<(Self, Vec<RuleDiagnostic>), EngineError>
    where
        I: IntoIterator<Item = FieldDeclaration>,
    {
        let mut graph = Self::new();
        for declaration in declarations {
            graph.register(declaration)?;
        }
        let diagnostics = graph.link(parser);
        Ok((graph, diagnostics))
    }

    /// Registration pass: adds a default-visible field with no edges.
    pub fn register(&mut self, declaration: FieldDeclaration) -> Result<(), EngineError> {
        if self.index.contains_key(&declaration.id) {
            return Err(EngineError::DuplicateField(declaration.id));
        }
        self.index.insert(declaration.id.clone(), self.fields.len());
        self.fields.push(Field::new(declaration.id, declaration.rule));
        Ok(())
    }

    /// Linking pass: parses every rule, then derives all dependents edges
    /// from the complete set of conditions. A rule that fails to parse
    /// leaves its field without conditions.
    pub fn link(&mut self, parser: &ConditionParser) -> Vec<RuleDiagnostic> {
        let mut diagnostics = Vec::new();
        for field in &mut self.fields {
            field.conditions = match parser.parse(&field.raw_rule) {
                Ok(conditions) => conditions,
                Err(error) => {
                    warn!(field = %field.id, %error, "ignoring rule, field stays visible");
                    diagnostics.push(RuleDiagnostic {
                        field: field.id.clone(),
                        error,
                    });
                    Vec::new()
                }
            };
        }
        self.rebuild_dependents();
        diagnostics
    }

    fn rebuild_dependents(&mut self) {
        let edges: Vec<(FieldId, FieldId)> = self
            .fields
            .iter()
            .flat_map(|field| {
                field
                    .conditions
                    .iter()
                    .map(move |condition| (condition.reference.clone(), field.id.clone()))
            })
            .collect();

        for field in &mut self.fields {
            field.dependents.clear();
        }
        for (reference, dependent) in edges {
            let Some(&target) = self.index.get(&reference) else {
                continue;
            };
            let dependents = &mut self.fields[target].dependents;
            if !dependents.contains(&dependent) {
                dependents.push(dependent);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, id: &FieldId) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &FieldId) -> Option<&Field> {
        self.index.get(id).map(|&position| &self.fields[position])
    }

    /// Fields in registration order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub(crate) fn position(&self, id: &FieldId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub(crate) fn field_at(&self, position: usize) -> &Field {
        &self.fields[position]
    }

    pub(crate) fn set_visible(&mut self, position: usize, visible: bool) {
        self.fields[position].visible = visible;
    }

    /// Every condition whose reference is not a registered field.
    pub fn unresolved_references(&self) -> Vec<EngineError> {
        self.fields
            .iter()
            .flat_map(|field| {
                field
                    .conditions
                    .iter()
                    .filter(|condition| !self.contains(&condition.reference))
                    .map(|condition| EngineError::UnresolvedReference {
                        field: field.id.clone(),
                        reference: condition.reference.clone(),
                    })
            })
            .collect()
    }

    /// Cycles in the dependents relation, each starting at its smallest id.
    pub fn cycles(&self) -> Vec<Vec<FieldId>> {
        let mut marks = vec![Mark::Unvisited; self.fields.len()];
        let mut path = Vec::new();
        let mut found = Vec::new();
        for start in 0..self.fields.len() {
            if marks[start] == Mark::Unvisited {
                self.visit(start, &mut marks, &mut path, &mut found);
            }
        }
        found
    }

    fn visit(
        &self,
        node: usize,
        marks: &mut [Mark],
        path: &mut Vec<usize>,
        found: &mut Vec<Vec<FieldId>>,
    ) {
        marks[node] = Mark::OnPath;
        path.push(node);
        for dependent in &self.fields[node].dependents {
            let Some(next) = self.position(dependent) else {
                continue;
            };
            match marks[next] {
                Mark::Unvisited => self.visit(next, marks, path, found),
                Mark::OnPath => {
                    if let Some(start) = path.iter().position(|&step| step == next) {
                        let cycle = path[start..]
                            .iter()
                            .map(|&step| self.fields[step].id.clone())
                            .collect();
                        let cycle = canonical_cycle(cycle);
                        if !found.contains(&cycle) {
                            found.push(cycle);
                        }
                    }
                }
                Mark::Done => {}
            }
        }
        path.pop();
        marks[node] = Mark::Done;
    }
}

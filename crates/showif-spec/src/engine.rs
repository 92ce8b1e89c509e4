//! Visibility evaluation and propagation.
//!
//! A field is visible when every one of its conditions holds, and a
//! condition only holds while the field it references is itself visible.
//! Every evaluation re-evaluates all dependents, whether or not the
//! decision changed, so a field reachable through several paths is
//! evaluated once per path.

use tracing::{debug, trace, warn};

use crate::condition::{Condition, FieldId};
use crate::error::EngineError;
use crate::graph::{DependencyGraph, FieldDeclaration, RuleDiagnostic};
use crate::parser::ConditionParser;
use crate::value::{self, ValueSource};
use crate::visibility::VisibilityRenderer;

/// Outcome of one triggered evaluation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    /// number of field evaluations, counting repeats
    pub evaluations: usize,
    pub errors: Vec<EngineError>,
}

impl Report {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    fn record(&mut self, error: EngineError) {
        if !self.errors.contains(&error) {
            warn!(%error, "configuration error");
            self.errors.push(error);
        }
    }

    pub(crate) fn merge(&mut self, other: Report) {
        self.evaluations += other.evaluations;
        for error in other.errors {
            if !self.errors.contains(&error) {
                self.errors.push(error);
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Engine {
    graph: DependencyGraph,
    diagnostics: Vec<RuleDiagnostic>,
}

impl Engine {
    /// Builds the graph from `declarations` and evaluates every field once.
    ///
    /// All fields are registered and all rules are linked before the first
    /// evaluation, so declaration order never matters. Dependency cycles
    /// are reported in the returned [`Report`].
    pub fn bootstrap<I, S, R>(
        declarations: I,
        parser: &ConditionParser,
        source: &S,
        renderer: &mut R,
    ) -> Result<(Self, Report), EngineError>
    where
        I: IntoIterator<Item = FieldDeclaration>,
        S: ValueSource + ?Sized,
        R: VisibilityRenderer + ?Sized,
    {
        let (graph, diagnostics) = DependencyGraph::build(declarations, parser)?;
        let mut engine = Self { graph, diagnostics };

        let mut report = Report::default();
        for cycle in engine.graph.cycles() {
            report.record(EngineError::cycle(cycle));
        }
        for position in 0..engine.graph.len() {
            let id = engine.graph.field_at(position).id().clone();
            report.merge(engine.evaluate(&id, source, renderer)?);
        }
        debug!(
            fields = engine.graph.len(),
            evaluations = report.evaluations,
            "bootstrap finished"
        );
        Ok((engine, report))
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Rules that failed to parse during linking.
    pub fn diagnostics(&self) -> &[RuleDiagnostic] {
        &self.diagnostics
    }

    pub fn is_visible(&self, id: &FieldId) -> Option<bool> {
        self.graph.get(id).map(|field| field.is_visible())
    }

    /// Re-evaluates `id` and, transitively, everything depending on it.
    pub fn evaluate<S, R>(
        &mut self,
        id: &FieldId,
        source: &S,
        renderer: &mut R,
    ) -> Result<Report, EngineError>
    where
        S: ValueSource + ?Sized,
        R: VisibilityRenderer + ?Sized,
    {
        let position = self
            .graph
            .position(id)
            .ok_or_else(|| EngineError::UnknownField(id.clone()))?;
        let mut report = Report::default();
        let mut path = Vec::new();
        self.evaluate_at(position, source, renderer, &mut path, &mut report);
        Ok(report)
    }

    /// Change trigger: the live value of `id` changed, so every field
    /// conditioned on it is re-evaluated. `id` itself is left alone.
    pub fn notify_changed<S, R>(
        &mut self,
        id: &FieldId,
        source: &S,
        renderer: &mut R,
    ) -> Result<Report, EngineError>
    where
        S: ValueSource + ?Sized,
        R: VisibilityRenderer + ?Sized,
    {
        let position = self
            .graph
            .position(id)
            .ok_or_else(|| EngineError::UnknownField(id.clone()))?;
        trace!(field = %id, "value changed");
        let mut report = Report::default();
        let mut path = vec![position];
        self.propagate(position, source, renderer, &mut path, &mut report);
        Ok(report)
    }

    fn evaluate_at<S, R>(
        &mut self,
        position: usize,
        source: &S,
        renderer: &mut R,
        path: &mut Vec<usize>,
        report: &mut Report,
    ) where
        S: ValueSource + ?Sized,
        R: VisibilityRenderer + ?Sized,
    {
        if let Some(start) = path.iter().position(|&step| step == position) {
            let cycle = path[start..]
                .iter()
                .map(|&step| self.graph.field_at(step).id().clone())
                .collect();
            report.record(EngineError::cycle(cycle));
            return;
        }

        let visible = self.conditions_hold(position, source, report);
        self.graph.set_visible(position, visible);
        let id = self.graph.field_at(position).id();
        debug!(field = %id, visible, "evaluated");
        renderer.apply(id, visible);
        report.evaluations += 1;

        path.push(position);
        self.propagate(position, source, renderer, path, report);
        path.pop();
    }

    fn propagate<S, R>(
        &mut self,
        position: usize,
        source: &S,
        renderer: &mut R,
        path: &mut Vec<usize>,
        report: &mut Report,
    ) where
        S: ValueSource + ?Sized,
        R: VisibilityRenderer + ?Sized,
    {
        let dependents: Vec<usize> = self
            .graph
            .field_at(position)
            .dependents()
            .iter()
            .filter_map(|dependent| self.graph.position(dependent))
            .collect();
        for dependent in dependents {
            trace!(
                from = %self.graph.field_at(position).id(),
                to = %self.graph.field_at(dependent).id(),
                "propagating"
            );
            self.evaluate_at(dependent, source, renderer, path, report);
        }
    }

    /// AND over all conditions. Every condition is checked, even after one
    /// fails, so all configuration errors of the field surface together.
    fn conditions_hold<S>(&self, position: usize, source: &S, report: &mut Report) -> bool
    where
        S: ValueSource + ?Sized,
    {
        let field = self.graph.field_at(position);
        let mut visible = true;
        for condition in field.conditions() {
            visible &= self.condition_holds(field.id(), condition, source, report);
        }
        visible
    }

    fn condition_holds<S>(
        &self,
        field: &FieldId,
        condition: &Condition,
        source: &S,
        report: &mut Report,
    ) -> bool
    where
        S: ValueSource + ?Sized,
    {
        let Some(reference) = self.graph.get(&condition.reference) else {
            report.record(EngineError::UnresolvedReference {
                field: field.clone(),
                reference: condition.reference.clone(),
            });
            return false;
        };

        let value = value::extract(source, &condition.reference, condition.modifier);
        match condition.operator.evaluate(&value, &condition.literal) {
            Ok(outcome) => reference.is_visible() && outcome,
            Err(error) => {
                report.record(EngineError::InvalidPattern {
                    field: field.clone(),
                    pattern: condition.literal.clone(),
                    source: error,
                });
                false
            }
        }
    }
}

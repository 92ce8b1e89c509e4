use tracing::info;

use crate::condition::FieldId;
use crate::engine::{Engine, Report};
use crate::error::EngineError;
use crate::spec::form::FormSpec;
use crate::state::FormState;
use crate::value::ValueSource;
use crate::visibility::{Presentation, VisibilityMap};

/// Result of applying one value change.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub field: FieldId,
    pub report: Report,
    /// fields whose shown state flipped, with their new state
    pub flipped: Vec<(FieldId, bool)>,
}

/// A form declaration wired to the engine, an in-memory widget state and
/// an in-memory presentation.
#[derive(Debug, Clone)]
pub struct Session {
    spec: FormSpec,
    engine: Engine,
    state: FormState,
    presentation: Presentation,
    startup: Report,
}

impl Session {
    pub fn start(spec: FormSpec) -> Result<Self, EngineError> {
        let parser = spec.engine.parser()?;
        let state = FormState::from_spec(&spec)?;
        let mut presentation = Presentation::new();
        let (engine, startup) =
            Engine::bootstrap(spec.declarations()?, &parser, &state, &mut presentation)?;
        presentation.take_changes();
        info!(
            form = %spec.id,
            fields = spec.fields.len(),
            errors = startup.errors.len(),
            "session started"
        );
        Ok(Self {
            spec,
            engine,
            state,
            presentation,
            startup,
        })
    }

    pub fn spec(&self) -> &FormSpec {
        &self.spec
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    /// Report of the initial evaluation pass.
    pub fn startup_report(&self) -> &Report {
        &self.startup
    }

    /// Sets the live value of the field named `name`, then re-evaluates
    /// the fields that depend on it or on a radio sibling it updated.
    pub fn change(&mut self, name: &str, value: &str) -> Result<Change, EngineError> {
        let id = self.spec.field_id(name)?;
        let mut report = Report::default();
        // a radio selection also changes the value its group siblings read
        for changed in self.state.set_value(&id, value)? {
            report.merge(
                self.engine
                    .notify_changed(&changed, &self.state, &mut self.presentation)?,
            );
        }
        let flipped = self.presentation.take_changes();
        Ok(Change {
            field: id,
            report,
            flipped,
        })
    }

    pub fn value(&self, name: &str) -> Result<String, EngineError> {
        let id = self.spec.field_id(name)?;
        if self.state.widget(&id).is_none() {
            return Err(EngineError::UnknownField(id));
        }
        Ok(self.state.current_value(&id))
    }

    pub fn is_visible(&self, name: &str) -> Result<bool, EngineError> {
        let id = self.spec.field_id(name)?;
        self.engine
            .is_visible(&id)
            .ok_or(EngineError::UnknownField(id))
    }

    pub fn visibility(&self) -> VisibilityMap {
        self.engine
            .graph()
            .fields()
            .map(|field| (field.id().clone(), field.is_visible()))
            .collect()
    }
}

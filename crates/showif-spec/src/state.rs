use std::collections::HashMap;

use crate::condition::FieldId;
use crate::error::EngineError;
use crate::spec::field::Widget;
use crate::spec::form::FormSpec;
use crate::value::{self, ValueSource};

/// Live widget state of a declared form.
#[derive(Debug, Clone, Default)]
pub struct FormState {
    widgets: Vec<(FieldId, Widget)>,
    index: HashMap<FieldId, usize>,
}

impl FormState {
    pub fn from_spec(spec: &FormSpec) -> Result<Self, EngineError> {
        let naming = spec.engine.naming();
        let mut state = Self::default();
        for field in &spec.fields {
            let id = naming.resolve(&field.name)?;
            if state.index.contains_key(&id) {
                return Err(EngineError::DuplicateField(id));
            }
            state.index.insert(id.clone(), state.widgets.len());
            state.widgets.push((id, field.widget.clone()));
        }
        Ok(state)
    }

    pub fn widget(&self, id: &FieldId) -> Option<&Widget> {
        self.index.get(id).map(|&position| &self.widgets[position].1)
    }

    /// Updates the widget the way a user would.
    ///
    /// Selects and radios take one of their options (any value when no
    /// options are declared, the empty string clears the selection);
    /// checkboxes take `1`/`0`, `true`/`false` or `on`/`off`; text takes
    /// anything. Selecting a radio clears every other radio of its group.
    ///
    /// Returns the fields whose comparable value may have changed: `id`
    /// itself, followed by the other radios of its group.
    pub fn set_value(&mut self, id: &FieldId, value: &str) -> Result<Vec<FieldId>, EngineError> {
        let position = self
            .index
            .get(id)
            .copied()
            .ok_or_else(|| EngineError::UnknownField(id.clone()))?;
        let invalid = |reason: &str| EngineError::InvalidValue {
            field: id.clone(),
            value: value.to_string(),
            reason: reason.to_string(),
        };

        let mut radio_group = None;
        let mut cleared = false;
        match &mut self.widgets[position].1 {
            Widget::Select { options, selected } => {
                if !accepts_choice(options, value) {
                    return Err(invalid("not one of the select options"));
                }
                *selected = (!value.is_empty()).then(|| value.to_string());
            }
            Widget::Checkbox { checked } => {
                *checked = parse_toggle(value)
                    .ok_or_else(|| invalid("expected 1/0, true/false or on/off"))?;
            }
            Widget::Radio {
                group,
                options,
                selected,
            } => {
                if !accepts_choice(options, value) {
                    return Err(invalid("not one of the radio options"));
                }
                *selected = (!value.is_empty()).then(|| value.to_string());
                cleared = selected.is_some();
                radio_group = Some(group.clone());
            }
            Widget::Text { value: current } => *current = Some(value.to_string()),
        }

        let mut changed = vec![id.clone()];
        if let Some(group) = radio_group {
            for (other, (sibling, widget)) in self.widgets.iter_mut().enumerate() {
                if other != position
                    && let Widget::Radio {
                        group: sibling_group,
                        selected,
                        ..
                    } = widget
                    && *sibling_group == group
                {
                    if cleared {
                        *selected = None;
                    }
                    changed.push(sibling.clone());
                }
            }
        }
        Ok(changed)
    }
}

impl ValueSource for FormState {
    fn current_value(&self, id: &FieldId) -> String {
        match self.widget(id) {
            Some(widget) => {
                value::comparable_value(widget, self.widgets.iter().map(|(_, widget)| widget))
            }
            None => String::new(),
        }
    }
}

fn accepts_choice(options: &[String], value: &str) -> bool {
    value.is_empty() || options.is_empty() || options.iter().any(|option| option == value)
}

fn parse_toggle(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" | "" => Some(false),
        _ => None,
    }
}

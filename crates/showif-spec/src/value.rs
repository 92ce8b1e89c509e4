use std::collections::{BTreeMap, HashMap};

use crate::condition::{FieldId, Modifier};
use crate::spec::field::Widget;

/// Read access to the live values of a form.
pub trait ValueSource {
    /// Current comparable value of the field; unknown ids read as empty.
    fn current_value(&self, id: &FieldId) -> String;
}

impl ValueSource for BTreeMap<FieldId, String> {
    fn current_value(&self, id: &FieldId) -> String {
        self.get(id).cloned().unwrap_or_default()
    }
}

impl ValueSource for HashMap<FieldId, String> {
    fn current_value(&self, id: &FieldId) -> String {
        self.get(id).cloned().unwrap_or_default()
    }
}

/// Reads the field value, then applies the condition's modifier.
pub fn extract<S: ValueSource + ?Sized>(
    source: &S,
    id: &FieldId,
    modifier: Option<Modifier>,
) -> String {
    let raw = source.current_value(id);
    match modifier {
        Some(modifier) => modifier.apply(&raw),
        None => raw,
    }
}

/// Comparable value of a widget.
///
/// `form` is every widget of the page in declaration order; a radio button
/// reads the selection of the first widget in its group that has one.
pub fn comparable_value<'a, I>(widget: &Widget, form: I) -> String
where
    I: IntoIterator<Item = &'a Widget>,
{
    match widget {
        Widget::Select { selected, .. } => selected.clone().unwrap_or_default(),
        Widget::Checkbox { checked } => if *checked { "1" } else { "0" }.to_string(),
        Widget::Radio { group, .. } => form
            .into_iter()
            .find_map(|sibling| match sibling {
                Widget::Radio {
                    group: sibling_group,
                    selected: Some(value),
                    ..
                } if sibling_group == group => Some(value.clone()),
                _ => None,
            })
            .unwrap_or_default(),
        Widget::Text { value } => value.clone().unwrap_or_default(),
    }
}

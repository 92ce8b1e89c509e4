use std::collections::BTreeMap;

use serde::Serialize;

use crate::condition::FieldId;

/// Applies a visibility decision to the presentation of a field.
///
/// Implementations must tolerate repeated identical calls: propagation
/// re-applies a decision every time a field is reached.
pub trait VisibilityRenderer {
    fn apply(&mut self, id: &FieldId, visible: bool);
}

/// Latest decision per field.
pub type VisibilityMap = BTreeMap<FieldId, bool>;

impl VisibilityRenderer for VisibilityMap {
    fn apply(&mut self, id: &FieldId, visible: bool) {
        self.insert(id.clone(), visible);
    }
}

/// Display and submission state of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldPresentation {
    pub shown: bool,
    /// hidden fields are disabled so their inputs are not submitted
    pub enabled: bool,
}

impl Default for FieldPresentation {
    fn default() -> Self {
        Self {
            shown: true,
            enabled: true,
        }
    }
}

/// In-memory stand-in for the page: remembers the shown/enabled state of
/// every field and which fields flipped since the last [`Presentation::take_changes`].
#[derive(Debug, Clone, Default)]
pub struct Presentation {
    fields: BTreeMap<FieldId, FieldPresentation>,
    /// state before the first flip since the last drain
    touched: Vec<(FieldId, bool)>,
}

impl Presentation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fields never touched by the engine count as shown.
    pub fn get(&self, id: &FieldId) -> FieldPresentation {
        self.fields.get(id).copied().unwrap_or_default()
    }

    pub fn is_shown(&self, id: &FieldId) -> bool {
        self.get(id).shown
    }

    /// Fields whose shown state differs from the last drain, in the order
    /// they first flipped.
    pub fn take_changes(&mut self) -> Vec<(FieldId, bool)> {
        std::mem::take(&mut self.touched)
            .into_iter()
            .filter_map(|(id, before)| {
                let now = self.is_shown(&id);
                (now != before).then_some((id, now))
            })
            .collect()
    }

    pub fn to_map(&self) -> VisibilityMap {
        self.fields
            .iter()
            .map(|(id, presentation)| (id.clone(), presentation.shown))
            .collect()
    }
}

impl VisibilityRenderer for Presentation {
    fn apply(&mut self, id: &FieldId, visible: bool) {
        let entry = self.fields.entry(id.clone()).or_default();
        if entry.shown != visible && !self.touched.iter().any(|(touched, _)| touched == id) {
            self.touched.push((id.clone(), entry.shown));
        }
        entry.shown = visible;
        entry.enabled = visible;
    }
}

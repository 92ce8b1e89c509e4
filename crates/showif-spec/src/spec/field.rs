use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Input widget backing a field, with its current state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Widget {
    /// Single-choice selector.
    Select {
        #[serde(default)]
        options: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selected: Option<String>,
    },
    /// Boolean toggle, compared as `1` or `0`.
    Checkbox {
        #[serde(default)]
        checked: bool,
    },
    /// Mutually exclusive choices sharing a group name with their siblings.
    Radio {
        group: String,
        #[serde(default)]
        options: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selected: Option<String>,
    },
    /// Free text or numeric input.
    Text {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
}

impl Widget {
    pub fn kind_label(&self) -> &'static str {
        match self {
            Widget::Select { .. } => "select",
            Widget::Checkbox { .. } => "checkbox",
            Widget::Radio { .. } => "radio",
            Widget::Text { .. } => "text",
        }
    }

    pub fn options(&self) -> Option<&[String]> {
        match self {
            Widget::Select { options, .. } | Widget::Radio { options, .. } => Some(options.as_slice()),
            Widget::Checkbox { .. } | Widget::Text { .. } => None,
        }
    }
}

/// One controllable unit of the form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldSpec {
    /// Base name used by rules; the registered id is `engine.id_prefix + name`.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub widget: Widget,
    /// Comma separated clauses, e.g. `country=de,age>=18`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_if: Option<String>,
}

impl FieldSpec {
    pub fn rule(&self) -> &str {
        self.show_if.as_deref().unwrap_or_default()
    }

    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

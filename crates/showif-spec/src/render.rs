use serde_json::{Map, Value, json};

use crate::session::Session;
use crate::value::ValueSource;

/// Describes a single field for render outputs.
#[derive(Debug, Clone)]
pub struct RenderField {
    pub id: String,
    pub name: String,
    pub label: String,
    pub kind: &'static str,
    pub value: String,
    pub rule: Option<String>,
    pub shown: bool,
    pub enabled: bool,
}

/// Collected payload used by both text and JSON renderers.
#[derive(Debug, Clone)]
pub struct RenderPayload {
    pub form_id: String,
    pub form_title: String,
    pub help: Option<String>,
    pub visible: usize,
    pub total: usize,
    pub fields: Vec<RenderField>,
    /// rules that failed to parse and were ignored
    pub diagnostics: Vec<String>,
    /// configuration errors from the initial evaluation
    pub errors: Vec<String>,
}

/// Build the renderer payload from a running session.
pub fn build_render_payload(session: &Session) -> RenderPayload {
    let spec = session.spec();
    let naming = spec.engine.naming();

    let fields = spec
        .fields
        .iter()
        .filter_map(|field| {
            let id = naming.resolve(&field.name).ok()?;
            let presentation = session.presentation().get(&id);
            Some(RenderField {
                name: field.name.clone(),
                label: field.display_label().to_string(),
                kind: field.widget.kind_label(),
                value: session.state().current_value(&id),
                rule: field.show_if.clone().filter(|rule| !rule.trim().is_empty()),
                shown: presentation.shown,
                enabled: presentation.enabled,
                id: id.to_string(),
            })
        })
        .collect::<Vec<_>>();

    let diagnostics = session
        .engine()
        .diagnostics()
        .iter()
        .map(|diagnostic| format!("{}: {}", diagnostic.field, diagnostic.error))
        .collect();
    let errors = session
        .startup_report()
        .errors
        .iter()
        .map(ToString::to_string)
        .collect();

    RenderPayload {
        form_id: spec.id.clone(),
        form_title: spec.title.clone(),
        help: spec.description.clone(),
        visible: fields.iter().filter(|field| field.shown).count(),
        total: fields.len(),
        fields,
        diagnostics,
        errors,
    }
}

/// Render the payload as a structured JSON-friendly value.
pub fn render_json(payload: &RenderPayload) -> Value {
    let fields = payload
        .fields
        .iter()
        .map(|field| {
            let mut map = Map::new();
            map.insert("id".into(), Value::String(field.id.clone()));
            map.insert("name".into(), Value::String(field.name.clone()));
            map.insert("label".into(), Value::String(field.label.clone()));
            map.insert("type".into(), Value::String(field.kind.to_string()));
            map.insert("value".into(), Value::String(field.value.clone()));
            if let Some(rule) = &field.rule {
                map.insert("show_if".into(), Value::String(rule.clone()));
            }
            map.insert("visible".into(), Value::Bool(field.shown));
            map.insert("enabled".into(), Value::Bool(field.enabled));
            Value::Object(map)
        })
        .collect::<Vec<_>>();

    json!({
        "form_id": payload.form_id,
        "form_title": payload.form_title,
        "help": payload.help,
        "progress": {
            "visible": payload.visible,
            "total": payload.total,
        },
        "fields": fields,
        "diagnostics": payload.diagnostics,
        "errors": payload.errors,
    })
}

/// Render the payload as human-friendly text.
pub fn render_text(payload: &RenderPayload) -> String {
    let mut lines = Vec::new();
    lines.push(format!("Form: {} ({})", payload.form_title, payload.form_id));
    if let Some(help) = &payload.help {
        lines.push(format!("Help: {}", help));
    }
    lines.push(format!("Visible fields: {}/{}", payload.visible, payload.total));

    for field in &payload.fields {
        let marker = if field.shown { "+" } else { "-" };
        let mut entry = format!(" {} {} ({})", marker, field.name, field.label);
        if !field.value.is_empty() {
            entry.push_str(&format!(" = {}", field.value));
        }
        if let Some(rule) = &field.rule {
            entry.push_str(&format!(" [show if {}]", rule));
        }
        lines.push(entry);
    }

    if !payload.diagnostics.is_empty() {
        lines.push("Ignored rules:".to_string());
        for diagnostic in &payload.diagnostics {
            lines.push(format!("  {}", diagnostic));
        }
    }
    if !payload.errors.is_empty() {
        lines.push("Configuration errors:".to_string());
        for error in &payload.errors {
            lines.push(format!("  {}", error));
        }
    }

    lines.join("\n")
}

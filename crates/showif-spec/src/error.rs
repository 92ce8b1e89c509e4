//! Configuration and runtime errors of the visibility engine.

use thiserror::Error;

use crate::condition::{FieldId, InvalidFieldId};
use crate::operator::TableError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid operator table: {0}")]
    Table(#[from] TableError),

    #[error(transparent)]
    InvalidFieldId(#[from] InvalidFieldId),

    /// Two fields map to the same id; the graph key space would be ambiguous.
    #[error("field '{0}' is declared more than once")]
    DuplicateField(FieldId),

    #[error("unknown field '{0}'")]
    UnknownField(FieldId),

    #[error("field '{field}' references unknown field '{reference}'")]
    UnresolvedReference { field: FieldId, reference: FieldId },

    #[error("dependency cycle: {}", display_cycle(.path))]
    CyclicDependency { path: Vec<FieldId> },

    #[error("field '{field}' has an invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        field: FieldId,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("value '{value}' is not valid for field '{field}': {reason}")]
    InvalidValue {
        field: FieldId,
        value: String,
        reason: String,
    },
}

impl EngineError {
    pub fn cycle(path: Vec<FieldId>) -> Self {
        EngineError::CyclicDependency {
            path: canonical_cycle(path),
        }
    }

    /// Short machine-readable label, used by lint output.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Table(TableError::UnknownOperator(_)) => "unknown_operator",
            EngineError::Table(_) => "operator_table",
            EngineError::InvalidFieldId(_) => "invalid_field_id",
            EngineError::DuplicateField(_) => "duplicate_field",
            EngineError::UnknownField(_) => "unknown_field",
            EngineError::UnresolvedReference { .. } => "unresolved_reference",
            EngineError::CyclicDependency { .. } => "dependency_cycle",
            EngineError::InvalidPattern { .. } => "invalid_pattern",
            EngineError::InvalidValue { .. } => "invalid_value",
        }
    }
}

/// Rotates a cycle to start at its smallest id, so the same cycle found from
/// different entry points compares equal.
pub fn canonical_cycle(mut path: Vec<FieldId>) -> Vec<FieldId> {
    if let Some(start) = path
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.cmp(b))
        .map(|(index, _)| index)
    {
        path.rotate_left(start);
    }
    path
}

fn display_cycle(path: &[FieldId]) -> String {
    let mut ids: Vec<&str> = path.iter().map(FieldId::as_str).collect();
    if let Some(first) = ids.first().copied() {
        ids.push(first);
    }
    ids.join(" -> ")
}

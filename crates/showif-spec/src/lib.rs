#![allow(missing_docs)]

pub mod condition;
pub mod engine;
pub mod error;
pub mod graph;
pub mod operator;
pub mod parser;
pub mod render;
pub mod session;
pub mod spec;
pub mod state;
pub mod validate;
pub mod value;
pub mod visibility;

pub use condition::{Condition, DEFAULT_ID_PREFIX, FieldId, FieldNaming, InvalidFieldId, Modifier};
pub use engine::{Engine, Report};
pub use error::EngineError;
pub use graph::{DependencyGraph, Field, FieldDeclaration, RuleDiagnostic};
pub use operator::{DEFAULT_OPERATORS, Operator, OperatorTable, TableError};
pub use parser::{ConditionParser, ParseError};
pub use render::{RenderField, RenderPayload, build_render_payload, render_json, render_text};
pub use session::{Change, Session};
pub use spec::{EngineConfig, FieldSpec, FormSpec, Widget};
pub use state::FormState;
pub use validate::{LintIssue, LintReport, lint};
pub use value::{ValueSource, comparable_value, extract};
pub use visibility::{FieldPresentation, Presentation, VisibilityMap, VisibilityRenderer};

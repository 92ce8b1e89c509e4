pub mod field;
pub mod form;

pub use field::{FieldSpec, Widget};
pub use form::{EngineConfig, FormSpec};

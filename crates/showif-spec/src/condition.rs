use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::operator::Operator;

/// Prefix put in front of every field name to form its wrapper id.
pub const DEFAULT_ID_PREFIX: &str = "wrap_Inputfield_";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidFieldId {
    #[error("field id is empty")]
    Empty,
    #[error("field id '{0}' contains whitespace or a rule delimiter")]
    Forbidden(String),
}

/// Validated key of a field in the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldId(String);

impl FieldId {
    pub fn new(id: impl Into<String>) -> Result<Self, InvalidFieldId> {
        let id = id.into();
        if id.is_empty() {
            return Err(InvalidFieldId::Empty);
        }
        if id.chars().any(|c| c.is_whitespace() || c == ',') {
            return Err(InvalidFieldId::Forbidden(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for FieldId {
    type Error = InvalidFieldId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FieldId> for String {
    fn from(value: FieldId) -> Self {
        value.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Maps the base name written in a rule to the id a field is registered under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNaming {
    prefix: String,
}

impl FieldNaming {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn resolve(&self, name: &str) -> Result<FieldId, InvalidFieldId> {
        if name.is_empty() {
            return Err(InvalidFieldId::Empty);
        }
        FieldId::new(format!("{}{}", self.prefix, name))
    }

    /// Inverse of [`FieldNaming::resolve`], used for display.
    pub fn base_name<'a>(&self, id: &'a FieldId) -> &'a str {
        id.as_str()
            .strip_prefix(self.prefix.as_str())
            .unwrap_or(id.as_str())
    }
}

impl Default for FieldNaming {
    fn default() -> Self {
        Self::new(DEFAULT_ID_PREFIX)
    }
}

/// Transform applied to a referenced value before comparing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Lowercase,
    Uppercase,
    /// character count of the value
    Length,
}

impl Modifier {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "lowercase" => Some(Modifier::Lowercase),
            "uppercase" => Some(Modifier::Uppercase),
            "length" => Some(Modifier::Length),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Modifier::Lowercase => "lowercase",
            Modifier::Uppercase => "uppercase",
            Modifier::Length => "length",
        }
    }

    pub fn apply(&self, value: &str) -> String {
        match self {
            Modifier::Lowercase => value.to_lowercase(),
            Modifier::Uppercase => value.to_uppercase(),
            Modifier::Length => value.chars().count().to_string(),
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One atomic comparison; a field's conditions are AND-combined.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// field whose live value is compared
    pub reference: FieldId,
    pub operator: Operator,
    pub literal: String,
    pub modifier: Option<Modifier>,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reference)?;
        if let Some(modifier) = self.modifier {
            write!(f, ".{}", modifier)?;
        }
        write!(f, "{}'{}'", self.operator, self.literal)
    }
}

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::condition::{DEFAULT_ID_PREFIX, FieldId, FieldNaming, InvalidFieldId};
use crate::error::EngineError;
use crate::graph::FieldDeclaration;
use crate::operator::{OperatorTable, TableError};
use crate::parser::ConditionParser;
use crate::spec::field::FieldSpec;

/// Engine settings carried by a form declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EngineConfig {
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,
    /// Operator tokens in priority order; the built-in table when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operators: Option<Vec<String>>,
}

fn default_id_prefix() -> String {
    DEFAULT_ID_PREFIX.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            id_prefix: default_id_prefix(),
            operators: None,
        }
    }
}

impl EngineConfig {
    pub fn naming(&self) -> FieldNaming {
        FieldNaming::new(self.id_prefix.clone())
    }

    pub fn operator_table(&self) -> Result<OperatorTable, TableError> {
        match &self.operators {
            Some(tokens) => OperatorTable::new(tokens.iter().cloned()),
            None => Ok(OperatorTable::standard()),
        }
    }

    pub fn parser(&self) -> Result<ConditionParser, TableError> {
        Ok(ConditionParser::new(self.operator_table()?, self.naming()))
    }
}

/// Top-level form declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormSpec {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub engine: EngineConfig,
    pub fields: Vec<FieldSpec>,
}

impl FormSpec {
    pub fn field_id(&self, name: &str) -> Result<FieldId, InvalidFieldId> {
        self.engine.naming().resolve(name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Field ids and raw rules in declaration order.
    pub fn declarations(&self) -> Result<Vec<FieldDeclaration>, EngineError> {
        let naming = self.engine.naming();
        self.fields
            .iter()
            .map(|field| {
                Ok(FieldDeclaration {
                    id: naming.resolve(&field.name)?,
                    rule: field.rule().to_string(),
                })
            })
            .collect()
    }
}

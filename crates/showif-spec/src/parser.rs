//! Rule parser: `key=value,age>=18,tags.length>0` becomes a list of
//! [`Condition`]s.
//!
//! Clauses are separated by `,` with no escaping, so a literal can never
//! contain a comma. A single bad clause invalidates the whole rule.

use thiserror::Error;

use crate::condition::{Condition, FieldNaming, InvalidFieldId, Modifier};
use crate::operator::OperatorTable;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no operator recognized in clause '{clause}'")]
    NoOperator { clause: String },
    #[error("unknown modifier '{modifier}' in clause '{clause}'")]
    UnknownModifier { clause: String, modifier: String },
    #[error("field descriptor '{descriptor}' has more than one modifier")]
    TooManySegments { descriptor: String },
    #[error("invalid field reference in clause '{clause}': {source}")]
    InvalidReference {
        clause: String,
        #[source]
        source: InvalidFieldId,
    },
}

#[derive(Debug, Clone, Default)]
pub struct ConditionParser {
    table: OperatorTable,
    naming: FieldNaming,
}

impl ConditionParser {
    pub fn new(table: OperatorTable, naming: FieldNaming) -> Self {
        Self { table, naming }
    }

    pub fn table(&self) -> &OperatorTable {
        &self.table
    }

    pub fn naming(&self) -> &FieldNaming {
        &self.naming
    }

    /// Parses a whole rule. A blank rule yields no conditions.
    pub fn parse(&self, rule: &str) -> Result<Vec<Condition>, ParseError> {
        if rule.trim().is_empty() {
            return Ok(Vec::new());
        }
        rule.split(',')
            .map(|clause| self.parse_clause(clause))
            .collect()
    }

    fn parse_clause(&self, clause: &str) -> Result<Condition, ParseError> {
        let (token, operator) =
            self.table
                .select(clause)
                .ok_or_else(|| ParseError::NoOperator {
                    clause: clause.to_string(),
                })?;
        let (descriptor, literal) =
            clause
                .split_once(token)
                .ok_or_else(|| ParseError::NoOperator {
                    clause: clause.to_string(),
                })?;

        let descriptor = descriptor.trim();
        let mut segments = descriptor.split('.');
        let base = segments.next().unwrap_or_default();
        let modifier = match segments.next() {
            None => None,
            Some(name) => Some(Modifier::parse(name).ok_or_else(|| {
                ParseError::UnknownModifier {
                    clause: clause.to_string(),
                    modifier: name.to_string(),
                }
            })?),
        };
        if segments.next().is_some() {
            return Err(ParseError::TooManySegments {
                descriptor: descriptor.to_string(),
            });
        }

        let reference =
            self.naming
                .resolve(base)
                .map_err(|source| ParseError::InvalidReference {
                    clause: clause.to_string(),
                    source,
                })?;

        Ok(Condition {
            reference,
            operator,
            literal: strip_quotes(literal).to_string(),
            modifier,
        })
    }
}

/// Trims the literal and removes one pair of matching surrounding quotes.
pub fn strip_quotes(literal: &str) -> &str {
    let literal = literal.trim();
    for quote in ['\'', '"'] {
        if literal.len() >= 2
            && let Some(inner) = literal
                .strip_prefix(quote)
                .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    literal
}

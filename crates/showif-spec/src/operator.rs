use std::fmt;

use regex::Regex;
use thiserror::Error;

/// Operator tokens recognized by default, in priority order.
///
/// Selection is "last match wins": a token may never contain a token that
/// comes after it, otherwise the later one can never be selected.
pub const DEFAULT_OPERATORS: [&str; 9] = ["=", "!=", ">", "<", ">=", "<=", "%=", "*=", "~="];

/// Errors raised while building an [`OperatorTable`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("operator table is empty")]
    Empty,
    #[error("operator '{0}' has no comparison semantics")]
    UnknownOperator(String),
    #[error("operator '{earlier}' contains '{later}' which comes after it")]
    Conflict { earlier: String, later: String },
}

/// Comparison semantics a rule clause can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equal,
    NotEqual,
    Greater,
    Less,
    GreaterOrEqual,
    LessOrEqual,
    /// substring containment, spelled `%=` or `*=`
    Contains,
    /// `~=`, the literal is a regular expression searched in the value
    Matches,
}

impl Operator {
    pub fn from_token(token: &str) -> Result<Self, TableError> {
        match token {
            "=" => Ok(Operator::Equal),
            "!=" => Ok(Operator::NotEqual),
            ">" => Ok(Operator::Greater),
            "<" => Ok(Operator::Less),
            ">=" => Ok(Operator::GreaterOrEqual),
            "<=" => Ok(Operator::LessOrEqual),
            "%=" | "*=" => Ok(Operator::Contains),
            "~=" => Ok(Operator::Matches),
            other => Err(TableError::UnknownOperator(other.to_string())),
        }
    }

    /// Canonical token used when printing a condition.
    pub fn token(&self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::NotEqual => "!=",
            Operator::Greater => ">",
            Operator::Less => "<",
            Operator::GreaterOrEqual => ">=",
            Operator::LessOrEqual => "<=",
            Operator::Contains => "*=",
            Operator::Matches => "~=",
        }
    }

    /// Compares the extracted field value `left` with the declared literal
    /// `right`. Only `~=` can fail, when the literal is not a valid pattern.
    pub fn evaluate(&self, left: &str, right: &str) -> Result<bool, regex::Error> {
        let outcome = match self {
            Operator::Equal => left == right,
            Operator::NotEqual => left != right,
            Operator::Greater => parse_number(left) > parse_number(right),
            Operator::Less => parse_number(left) < parse_number(right),
            Operator::GreaterOrEqual => parse_number(left) >= parse_number(right),
            Operator::LessOrEqual => parse_number(left) <= parse_number(right),
            Operator::Contains => left.contains(right),
            Operator::Matches => Regex::new(right)?.is_match(left),
        };
        Ok(outcome)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Reads the leading decimal number of `value`, ignoring whatever follows
/// it (`"20 years"` is 20). Only `Infinity` spells an infinite value; any
/// other input without a leading number becomes NaN, so every ordering
/// comparison against it is false.
fn parse_number(value: &str) -> f64 {
    const INFINITY: &str = "Infinity";

    let text = value.trim_start();
    let bytes = text.as_bytes();
    let digits = |from: usize| {
        bytes[from..]
            .iter()
            .take_while(|byte| byte.is_ascii_digit())
            .count()
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    if text[end..].starts_with(INFINITY) {
        return text[..end + INFINITY.len()].parse().unwrap_or(f64::NAN);
    }

    let integer = digits(end);
    end += integer;
    let mut fraction = 0;
    if bytes.get(end) == Some(&b'.') {
        fraction = digits(end + 1);
        if integer + fraction > 0 {
            end += 1 + fraction;
        }
    }
    if integer + fraction == 0 {
        return f64::NAN;
    }

    // exponent only counts when at least one digit follows it
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exponent = end + 1;
        if matches!(bytes.get(exponent), Some(b'+' | b'-')) {
            exponent += 1;
        }
        let count = digits(exponent);
        if count > 0 {
            end = exponent + count;
        }
    }
    text[..end].parse().unwrap_or(f64::NAN)
}

/// Ordered catalog of operator tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorTable {
    entries: Vec<(String, Operator)>,
}

impl OperatorTable {
    /// Builds a table from tokens in priority order, rejecting unknown
    /// tokens and orderings where an earlier token contains a later one.
    pub fn new<I, S>(tokens: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut entries: Vec<(String, Operator)> = Vec::new();
        for token in tokens {
            let token = token.into();
            let operator = Operator::from_token(&token)?;
            if let Some((earlier, _)) = entries
                .iter()
                .find(|(earlier, _)| earlier.contains(token.as_str()))
            {
                return Err(TableError::Conflict {
                    earlier: earlier.clone(),
                    later: token,
                });
            }
            entries.push((token, operator));
        }
        if entries.is_empty() {
            return Err(TableError::Empty);
        }
        Ok(Self { entries })
    }

    pub fn standard() -> Self {
        Self {
            entries: DEFAULT_OPERATORS
                .iter()
                .filter_map(|token| {
                    Operator::from_token(token)
                        .ok()
                        .map(|operator| (token.to_string(), operator))
                })
                .collect(),
        }
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(token, _)| token.as_str())
    }

    /// Picks the operator for a clause: every token is tried in table order
    /// and the last one that splits the clause into exactly two non-empty
    /// parts wins.
    pub fn select(&self, clause: &str) -> Option<(&str, Operator)> {
        self.entries
            .iter()
            .filter(|(token, _)| splits_in_two(clause, token))
            .last()
            .map(|(token, operator)| (token.as_str(), *operator))
    }
}

impl Default for OperatorTable {
    fn default() -> Self {
        Self::standard()
    }
}

fn splits_in_two(clause: &str, token: &str) -> bool {
    let mut parts = clause.split(token);
    matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(left), Some(right), None) if !left.is_empty() && !right.is_empty()
    )
}

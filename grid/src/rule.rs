//! Client filter rules
//!
//! The grid sends `{"groupOp": "AND", "rules": [{"field": .., "op": .., "data": ..}]}`.
//! Rules are kept as received; operator codes are resolved when a rule is translated.

use crate::errors::GridError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use table_mapper::query_builder::LogicalOperator;

/// One client rule: field name, operator code and the raw value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRule {
    pub field: String,
    pub op: String,
    #[serde(default)]
    pub data: Value,
}

impl FilterRule {
    pub fn new(field: impl Into<String>, op: impl Into<String>, data: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op: op.into(),
            data: data.into(),
        }
    }

    pub fn operator(&self) -> Option<RuleOperator> {
        RuleOperator::from_code(&self.op)
    }
}

/// Combinator for all rules of a request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GroupOp {
    #[default]
    And,
    Or,
}

impl GroupOp {
    pub fn logical(self) -> LogicalOperator {
        match self {
            GroupOp::And => LogicalOperator::And,
            GroupOp::Or => LogicalOperator::Or,
        }
    }
}

// Anything that is not AND combines with OR
impl From<String> for GroupOp {
    fn from(value: String) -> Self {
        if value.trim().eq_ignore_ascii_case("and") {
            GroupOp::And
        } else {
            GroupOp::Or
        }
    }
}

impl From<GroupOp> for String {
    fn from(value: GroupOp) -> Self {
        match value {
            GroupOp::And => "AND".to_string(),
            GroupOp::Or => "OR".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterRuleSet {
    #[serde(rename = "groupOp", default)]
    pub group_op: GroupOp,
    #[serde(default)]
    pub rules: Vec<FilterRule>,
}

impl FilterRuleSet {
    pub fn new(group_op: GroupOp) -> Self {
        Self {
            group_op,
            rules: Vec::new(),
        }
    }

    pub fn rule(mut self, rule: FilterRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Parse the `filters` request parameter
    pub fn parse(json: &str) -> Result<Self, GridError> {
        serde_json::from_str(json).map_err(|e| GridError::InvalidFilters(e.to_string()))
    }

    /// Accept the parameter either as JSON text or as an already decoded object
    pub fn from_value(value: &Value) -> Result<Self, GridError> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::String(text) if text.trim().is_empty() => Ok(Self::default()),
            Value::String(text) => Self::parse(text),
            other => serde_json::from_value(other.clone())
                .map_err(|e| GridError::InvalidFilters(e.to_string())),
        }
    }
}

/// The closed set of jqGrid operator codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleOperator {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    BeginsWith,
    NotBeginsWith,
    EndsWith,
    NotEndsWith,
    Contains,
    NotContains,
    In,
    NotIn,
}

impl RuleOperator {
    pub fn from_code(code: &str) -> Option<Self> {
        let op = match code {
            "eq" => RuleOperator::Equal,
            "ne" => RuleOperator::NotEqual,
            "lt" => RuleOperator::Less,
            "le" => RuleOperator::LessOrEqual,
            "gt" => RuleOperator::Greater,
            "ge" => RuleOperator::GreaterOrEqual,
            "bw" => RuleOperator::BeginsWith,
            "bn" => RuleOperator::NotBeginsWith,
            "ew" => RuleOperator::EndsWith,
            "en" => RuleOperator::NotEndsWith,
            "cn" => RuleOperator::Contains,
            "nc" => RuleOperator::NotContains,
            "in" => RuleOperator::In,
            "ni" => RuleOperator::NotIn,
            _ => return None,
        };
        Some(op)
    }

    /// LIKE family: begins/ends with, contains and their negations
    pub fn is_pattern(&self) -> bool {
        matches!(
            self,
            RuleOperator::BeginsWith
                | RuleOperator::NotBeginsWith
                | RuleOperator::EndsWith
                | RuleOperator::NotEndsWith
                | RuleOperator::Contains
                | RuleOperator::NotContains
        )
    }

    pub fn code(&self) -> &'static str {
        match self {
            RuleOperator::Equal => "eq",
            RuleOperator::NotEqual => "ne",
            RuleOperator::Less => "lt",
            RuleOperator::LessOrEqual => "le",
            RuleOperator::Greater => "gt",
            RuleOperator::GreaterOrEqual => "ge",
            RuleOperator::BeginsWith => "bw",
            RuleOperator::NotBeginsWith => "bn",
            RuleOperator::EndsWith => "ew",
            RuleOperator::NotEndsWith => "en",
            RuleOperator::Contains => "cn",
            RuleOperator::NotContains => "nc",
            RuleOperator::In => "in",
            RuleOperator::NotIn => "ni",
        }
    }
}

impl FromStr for RuleOperator {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| GridError::unsupported_operator("", s))
    }
}

impl fmt::Display for RuleOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

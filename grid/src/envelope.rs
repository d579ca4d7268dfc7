//! Request parameters, response envelope and query token
//!
//! The token only records what the client asked for (rule sets and sort). Replaying it
//! runs those through the same checks as a fresh request against the server's own base
//! query, so a modified token can never add SQL.

use crate::errors::GridError;
use crate::rule::FilterRuleSet;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use table_mapper::RowSet;

/// Grid request parameters as sent by the client
///
/// Query strings carry everything as text, so numbers and the search flag are parsed
/// leniently: a value that does not parse counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridParams {
    #[serde(default, deserialize_with = "lenient_int")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub rows: Option<i64>,
    #[serde(rename = "_search", default, deserialize_with = "lenient_flag")]
    pub search: bool,
    /// Rule set, as JSON text or an object
    #[serde(default)]
    pub filters: Option<Value>,
    #[serde(default)]
    pub sidx: Option<String>,
    #[serde(default)]
    pub sord: Option<String>,
}

impl GridParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from decoded query-string pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, GridError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: Map<String, Value> = pairs
            .into_iter()
            .map(|(key, value)| (key.into(), Value::String(value.into())))
            .collect();
        serde_json::from_value(Value::Object(map))
            .map_err(|e| GridError::InvalidFilters(e.to_string()))
    }

    pub fn page(mut self, page: i64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn rows(mut self, rows: i64) -> Self {
        self.rows = Some(rows);
        self
    }

    pub fn search(mut self, filters: impl Into<Value>) -> Self {
        self.search = true;
        self.filters = Some(filters.into());
        self
    }

    pub fn sort(mut self, sidx: impl Into<String>, sord: impl Into<String>) -> Self {
        self.sidx = Some(sidx.into());
        self.sord = Some(sord.into());
        self
    }

    /// Requested page, 1 when missing
    pub fn page_number(&self) -> i64 {
        self.page.unwrap_or(1)
    }
}

fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    })
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(flag)) => flag,
        Some(Value::String(s)) => s == "true",
        _ => false,
    })
}

/// Client-controlled state of a listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridState {
    /// Rule sets in the order they were applied
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<FilterRuleSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidx: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sord: Option<String>,
}

/// Opaque token carrying a [`GridState`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryToken(String);

impl QueryToken {
    pub fn encode(state: &GridState) -> Result<Self, GridError> {
        let json = serde_json::to_vec(state).map_err(|e| GridError::Token(e.to_string()))?;
        Ok(Self(STANDARD.encode(json)))
    }

    pub fn decode(&self) -> Result<GridState, GridError> {
        let bytes = STANDARD
            .decode(self.0.trim())
            .map_err(|e| GridError::Token(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| GridError::Token(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for QueryToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for QueryToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    pub q: QueryToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    pub page: u64,
    pub total: u64,
    pub records: u64,
}

/// Grid response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridEnvelope {
    /// Page actually returned
    pub page: u64,
    /// Page count
    pub total: u64,
    /// Matching row count
    pub records: u64,
    pub rows: RowSet,
    pub userdata: UserData,
    pub pagination: PageSummary,
}

impl GridEnvelope {
    pub fn new(page: u64, total: u64, records: u64, rows: RowSet, q: QueryToken) -> Self {
        Self {
            page,
            total,
            records,
            rows,
            userdata: UserData { q },
            pagination: PageSummary {
                page,
                total,
                records,
            },
        }
    }
}

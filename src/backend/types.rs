//! Response types returned by execution backends.
//!
//! Defines the structures used to represent statement results, including the
//! session parameter table reported by parameter inspections.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Backend response code for a successful statement.
pub const CODE_SUCCEEDED: i32 = 0;

/// Backend response code for a rejected statement.
pub const CODE_FAILED: i32 = -1;

/// Session parameters, keyed by name.
pub type ParameterTable = BTreeMap<String, Value>;

/// A row of data from a statement result.
pub type Row = Vec<Value>;

/// Response for a single dispatched statement or directive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// The statement text this response belongs to.
    pub statement: String,

    /// Backend status code; `CODE_SUCCEEDED` on success.
    pub code: i32,

    /// Error or informational message from the backend.
    #[serde(default)]
    pub message: Option<String>,

    /// Result payload, absent for failed statements.
    #[serde(default)]
    pub data: Option<ResponseData>,
}

impl QueryResponse {
    /// Creates a successful response carrying `data`.
    pub fn success(statement: impl Into<String>, data: ResponseData) -> Self {
        Self {
            statement: statement.into(),
            code: CODE_SUCCEEDED,
            message: None,
            data: Some(data),
        }
    }

    /// Creates a failed response with the given message.
    pub fn failure(statement: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            code: CODE_FAILED,
            message: Some(message.into()),
            data: None,
        }
    }

    /// Returns true if the backend accepted the statement.
    pub fn is_success(&self) -> bool {
        self.code == CODE_SUCCEEDED
    }

    /// Returns the session parameters reported with this response, if any.
    pub fn local_params(&self) -> Option<&ParameterTable> {
        self.data.as_ref().and_then(|data| data.local_params.as_ref())
    }
}

/// Tabular payload of a successful response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseData {
    /// Column headers.
    pub headers: Vec<String>,

    /// Rows of data.
    pub rows: Vec<Row>,

    /// Time the backend spent executing the statement.
    #[serde(with = "duration_micros", default)]
    pub time_cost: Duration,

    /// Session parameters, reported by `:params` inspections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_params: Option<ParameterTable>,
}

impl ResponseData {
    /// Creates an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a payload with the given headers and rows.
    pub fn with_rows(headers: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            headers,
            rows,
            ..Self::default()
        }
    }

    /// Creates a payload listing the given session parameters.
    pub fn with_params(params: ParameterTable) -> Self {
        let rows = params
            .iter()
            .map(|(name, value)| vec![Value::from(name.as_str()), value.clone()])
            .collect();
        Self {
            headers: vec!["name".to_string(), "value".to_string()],
            rows,
            time_cost: Duration::ZERO,
            local_params: Some(params),
        }
    }

    /// Sets the execution time.
    pub fn with_time_cost(mut self, time_cost: Duration) -> Self {
        self.time_cost = time_cost;
        self
    }

    /// Returns the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// A single value in a result row or parameter table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Parses a literal as written in a `:param` directive.
    ///
    /// JSON literals (numbers, booleans, null, lists, maps, double-quoted
    /// strings) are decoded as such; single-quoted text is unquoted; anything
    /// else is kept verbatim as a string.
    pub fn parse_literal(literal: &str) -> Self {
        let literal = literal.trim();
        if let Ok(value) = serde_json::from_str::<Value>(literal) {
            return value;
        }
        if literal.len() >= 2 && literal.starts_with('\'') && literal.ends_with('\'') {
            return Value::String(literal[1..literal.len() - 1].to_string());
        }
        Value::String(literal.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (idx, (key, value)) in entries.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

/// Serde support for Duration as whole microseconds.
mod duration_micros {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_micros() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros = u64::deserialize(deserializer)?;
        Ok(Duration::from_micros(micros))
    }
}

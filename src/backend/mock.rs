//! Mock execution backend for testing.
//!
//! Provides an in-memory backend that keeps session parameters, answers a few
//! well-known statements, and records every call it receives.

use super::{ExecutionBackend, ParameterTable, QueryResponse, ResponseData, TelemetryTag, Value};
use crate::error::{ConsoleError, Result};
use crate::splitter::{clauses, is_param_inspection};
use async_trait::async_trait;
use regex::Regex;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

const MOCK_TIME_COST: Duration = Duration::from_micros(120);

/// A call received by the mock backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Batch {
        statements: Vec<String>,
        param_directives: Vec<String>,
        tag: TelemetryTag,
    },
    Single {
        statement: String,
        param_directives: Vec<String>,
    },
}

/// A mock backend that returns predefined results.
///
/// When a statement holds several `;`-separated clauses, only the last
/// clause is answered, matching how a graph service reports one result per
/// request.
#[derive(Debug)]
pub struct MockBackend {
    params: Mutex<ParameterTable>,
    calls: Mutex<Vec<BackendCall>>,
    spaces: Vec<String>,
    /// Custom payloads (pattern -> data), matched case-insensitively.
    custom_responses: Vec<(String, ResponseData)>,
    /// Rejected statements (pattern -> error message).
    rejections: Vec<(String, String)>,
    /// Artificial latency (pattern -> delay) applied before answering.
    delays: Vec<(String, Duration)>,
}

impl MockBackend {
    /// Creates a new mock backend with one graph space and no parameters.
    pub fn new() -> Self {
        Self {
            params: Mutex::new(ParameterTable::new()),
            calls: Mutex::new(Vec::new()),
            spaces: vec!["basketballplayer".to_string()],
            custom_responses: Vec::new(),
            rejections: Vec::new(),
            delays: Vec::new(),
        }
    }

    /// Replaces the graph spaces reported by `SHOW SPACES`.
    pub fn with_spaces(mut self, spaces: &[&str]) -> Self {
        self.spaces = spaces.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Answers statements containing `pattern` with `data`.
    pub fn with_response(mut self, pattern: impl Into<String>, data: ResponseData) -> Self {
        self.custom_responses.push((pattern.into(), data));
        self
    }

    /// Rejects statements containing `pattern` with `message`.
    pub fn with_rejection(mut self, pattern: impl Into<String>, message: impl Into<String>) -> Self {
        self.rejections.push((pattern.into(), message.into()));
        self
    }

    /// Delays any call carrying a statement that contains `pattern`.
    pub fn with_delay(mut self, pattern: impl Into<String>, delay: Duration) -> Self {
        self.delays.push((pattern.into(), delay));
        self
    }

    /// Pre-populates a session parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: Value) -> Self {
        if let Ok(params) = self.params.get_mut() {
            params.insert(name.into(), value);
        }
        self
    }

    /// Returns every call received so far, oldest first.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    /// Returns the current session parameters.
    pub fn params(&self) -> ParameterTable {
        self.params
            .lock()
            .map(|params| params.clone())
            .unwrap_or_default()
    }

    fn record(&self, call: BackendCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn delay_for<'a>(&self, statements: impl IntoIterator<Item = &'a str>) -> Duration {
        let statements: Vec<String> = statements.into_iter().map(str::to_lowercase).collect();
        self.delays
            .iter()
            .filter(|(pattern, _)| {
                let pattern = pattern.to_lowercase();
                statements.iter().any(|s| s.contains(&pattern))
            })
            .map(|(_, delay)| *delay)
            .max()
            .unwrap_or(Duration::ZERO)
    }

    async fn simulate_latency<'a>(&self, statements: impl IntoIterator<Item = &'a str>) {
        let delay = self.delay_for(statements);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    /// Applies a `:param` / `:params` directive and returns its response.
    ///
    /// A trailing `;` is ignored, as for statements.
    fn apply_directive(&self, raw: &str) -> Result<QueryResponse> {
        let directive = raw.trim().trim_end_matches(';').trim_end();
        let mut params = self
            .params
            .lock()
            .map_err(|_| ConsoleError::internal("mock parameter table poisoned"))?;

        if is_param_inspection(directive) {
            let names: Vec<&str> = directive[":params".len()..]
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|name| !name.is_empty())
                .collect();
            let table = if names.is_empty() {
                params.clone()
            } else {
                params
                    .iter()
                    .filter(|(name, _)| names.contains(&name.as_str()))
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect()
            };
            return Ok(QueryResponse::success(
                raw,
                ResponseData::with_params(table).with_time_cost(MOCK_TIME_COST),
            ));
        }

        let Some(caps) = param_assignment().captures(directive) else {
            return Ok(QueryResponse::failure(
                raw,
                format!("Unknown directive: {directive}"),
            ));
        };

        let name = caps[1].to_string();
        let literal = caps[2].trim();
        if literal.is_empty() {
            params.remove(&name);
        } else {
            params.insert(name, Value::parse_literal(literal));
        }

        Ok(QueryResponse::success(
            raw,
            ResponseData::new().with_time_cost(MOCK_TIME_COST),
        ))
    }

    /// Answers a statement, reporting only its last clause.
    fn respond(&self, statement: &str) -> QueryResponse {
        let clause = clauses(statement).last().copied().unwrap_or(statement);
        let lowered = clause.to_lowercase();

        if let Some((_, message)) = self
            .rejections
            .iter()
            .find(|(pattern, _)| lowered.contains(&pattern.to_lowercase()))
        {
            return QueryResponse::failure(statement, message.clone());
        }

        if let Some((_, data)) = self
            .custom_responses
            .iter()
            .find(|(pattern, _)| lowered.contains(&pattern.to_lowercase()))
        {
            return QueryResponse::success(statement, data.clone());
        }

        let data = if lowered.starts_with("show spaces") {
            let rows = self
                .spaces
                .iter()
                .map(|space| vec![Value::from(space.as_str())])
                .collect();
            ResponseData::with_rows(vec!["Name".to_string()], rows)
        } else if lowered.starts_with("yield ") {
            let literal = clause["yield ".len()..].trim();
            ResponseData::with_rows(
                vec!["value".to_string()],
                vec![vec![Value::parse_literal(literal)]],
            )
        } else {
            ResponseData::new()
        };

        QueryResponse::success(statement, data.with_time_cost(MOCK_TIME_COST))
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Matches `:param <name> => <literal>`; an empty literal removes the parameter.
fn param_assignment() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?is)^\s*:param\s+([A-Za-z_][A-Za-z0-9_]*)\s*=>(.*)$")
            .expect("static pattern is valid")
    })
}

#[async_trait]
impl ExecutionBackend for MockBackend {
    async fn batch_execute(
        &self,
        statements: &[String],
        param_directives: &[String],
        tag: &TelemetryTag,
    ) -> Result<Vec<QueryResponse>> {
        self.record(BackendCall::Batch {
            statements: statements.to_vec(),
            param_directives: param_directives.to_vec(),
            tag: tag.clone(),
        });
        self.simulate_latency(statements.iter().map(String::as_str))
            .await;

        let mut responses = Vec::with_capacity(param_directives.len() + statements.len());
        for directive in param_directives {
            responses.push(self.apply_directive(directive)?);
        }
        for statement in statements {
            responses.push(self.respond(statement));
        }
        Ok(responses)
    }

    async fn execute_one(
        &self,
        statement: &str,
        param_directives: &[String],
    ) -> Result<QueryResponse> {
        self.record(BackendCall::Single {
            statement: statement.to_string(),
            param_directives: param_directives.to_vec(),
        });
        self.simulate_latency([statement]).await;

        let mut last = None;
        for directive in param_directives {
            last = Some(self.apply_directive(directive)?);
        }

        if statement.trim().is_empty() {
            return Ok(last.unwrap_or_else(|| QueryResponse::success("", ResponseData::new())));
        }
        Ok(self.respond(statement))
    }
}

/// A backend whose calls always fail, for exercising error paths.
#[derive(Debug, Clone)]
pub struct FailingBackend {
    message: String,
}

impl FailingBackend {
    /// Creates a backend that fails every call with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl ExecutionBackend for FailingBackend {
    async fn batch_execute(
        &self,
        _statements: &[String],
        _param_directives: &[String],
        _tag: &TelemetryTag,
    ) -> Result<Vec<QueryResponse>> {
        Err(ConsoleError::backend(self.message.clone()))
    }

    async fn execute_one(
        &self,
        _statement: &str,
        _param_directives: &[String],
    ) -> Result<QueryResponse> {
        Err(ConsoleError::backend(self.message.clone()))
    }
}

//! Execution backend abstraction.
//!
//! Provides a trait-based interface to whatever service executes statements,
//! so the session coordinator never depends on a transport.

mod mock;
mod types;

pub use mock::{BackendCall, FailingBackend, MockBackend};
pub use types::{
    ParameterTable, QueryResponse, ResponseData, Row, Value, CODE_FAILED, CODE_SUCCEEDED,
};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Label attached to batch requests for usage tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryTag {
    pub category: String,
    pub action: String,
}

impl TelemetryTag {
    /// Creates a tag with the given category and action.
    pub fn new(category: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            action: action.into(),
        }
    }

    /// Tag sent with every console run.
    pub fn console_run() -> Self {
        Self::new("console", "run_gql")
    }
}

/// Trait defining the interface for execution backends.
///
/// Both calls are async and may fail with a backend-defined error. A
/// statement the backend rejects is not a call failure; it comes back as a
/// `QueryResponse` with a non-zero code.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Executes `statements` as one batch after applying `param_directives`.
    ///
    /// Returns one response per dispatched unit, in dispatch order.
    async fn batch_execute(
        &self,
        statements: &[String],
        param_directives: &[String],
        tag: &TelemetryTag,
    ) -> Result<Vec<QueryResponse>>;

    /// Executes a single statement after applying `param_directives`.
    async fn execute_one(
        &self,
        statement: &str,
        param_directives: &[String],
    ) -> Result<QueryResponse>;
}

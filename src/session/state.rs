//! Observable session state.

use crate::backend::{ParameterTable, QueryResponse};
use crate::persistence::Favorites;
use serde::Serialize;
use uuid::Uuid;

/// One record of a past execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEntry {
    /// Unique per entry, never reused.
    pub id: Uuid,
    /// Sequence number of the run that produced this entry, assigned at
    /// submission. Entries from the same run share it.
    pub seq: u64,
    /// The statement or directive the entry answers.
    pub text: String,
    /// The backend's response.
    pub response: QueryResponse,
}

impl ResultEntry {
    /// Tags a backend response with a fresh identifier.
    pub fn new(seq: u64, response: QueryResponse) -> Self {
        Self {
            id: Uuid::new_v4(),
            seq,
            text: response.statement.clone(),
            response,
        }
    }
}

/// Snapshot of everything an observer can see about a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    /// True while any run is dispatching or settling.
    pub loading: bool,
    /// Text of the last successful run, or the default statement.
    pub last_text: String,
    /// Past results, newest first.
    pub history: Vec<ResultEntry>,
    /// Last fetched parameter table; `None` until fetched or after a reset.
    pub params: Option<ParameterTable>,
    /// Saved statements.
    pub favorites: Favorites,
}

impl SessionState {
    /// Creates the initial state for a new session.
    pub fn new(default_statement: impl Into<String>, favorites: Favorites) -> Self {
        Self {
            loading: false,
            last_text: default_statement.into(),
            history: Vec::new(),
            params: None,
            favorites,
        }
    }

    /// Returns the entries produced by the run with sequence number `seq`.
    pub fn entries_for_run(&self, seq: u64) -> impl Iterator<Item = &ResultEntry> {
        self.history.iter().filter(move |entry| entry.seq == seq)
    }
}

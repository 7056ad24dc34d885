//! Session coordination for the console.
//!
//! A [`SessionCoordinator`] owns one console session: it splits submitted
//! text, dispatches the pieces to an execution backend, merges the results
//! into history, and publishes a fresh [`SessionState`] snapshot to
//! subscribers after every change.
//!
//! Runs may overlap. History is merged in completion order, so an entry's
//! `seq` (assigned at submission) is the reliable way to tell runs apart.

mod state;

pub use state::{ResultEntry, SessionState};

use crate::backend::{ExecutionBackend, TelemetryTag};
use crate::error::{ConsoleError, Result};
use crate::persistence::{self, Favorites, KeyValueStore};
use crate::splitter;
use futures::future::{BoxFuture, FutureExt};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Statement shown in the editor for a fresh or reset session.
pub const DEFAULT_STATEMENT: &str = "SHOW SPACES;";

/// Pause before clearing `loading` after a run completes.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(300);

/// Store key holding the favorites list.
pub const DEFAULT_FAVORITES_KEY: &str = "favorites";

/// Read-only directive used to fetch the parameter table.
const PARAMS_INSPECTION: &str = ":params";

/// Tunables for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub settle_delay: Duration,
    pub default_statement: String,
    pub favorites_key: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            default_statement: DEFAULT_STATEMENT.to_string(),
            favorites_key: DEFAULT_FAVORITES_KEY.to_string(),
        }
    }
}

/// State shared with deferred settle tasks.
struct Shared {
    state: watch::Sender<SessionState>,
    /// Runs that are dispatching or settling.
    in_flight: AtomicUsize,
}

impl Shared {
    fn begin_run(&self) {
        self.state.send_modify(|state| {
            self.in_flight.fetch_add(1, Ordering::AcqRel);
            state.loading = true;
        });
    }

    fn finish_run(&self) {
        self.state.send_modify(|state| {
            let previous = self
                .in_flight
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                    Some(n.saturating_sub(1))
                })
                .unwrap_or(0);
            state.loading = previous > 1;
        });
    }
}

/// Releases a run's busy state once the run ends, however it ends.
///
/// Dropping the guard schedules the settle delay; `loading` clears when it
/// elapses unless the session has been shut down in the meantime.
struct RunGuard {
    shared: Arc<Shared>,
    lifetime: CancellationToken,
    settle_delay: Duration,
    seq: u64,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if self.lifetime.is_cancelled() {
            return;
        }

        let shared = Arc::clone(&self.shared);
        let lifetime = self.lifetime.clone();
        let delay = self.settle_delay;
        let seq = self.seq;

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::select! {
                        _ = lifetime.cancelled() => {
                            debug!(seq, "Session shut down before run settled");
                        }
                        _ = tokio::time::sleep(delay) => {
                            shared.finish_run();
                            debug!(seq, "Run settled");
                        }
                    }
                });
            }
            Err(_) => shared.finish_run(),
        }
    }
}

/// Owns one console session.
pub struct SessionCoordinator {
    backend: Arc<dyn ExecutionBackend>,
    store: Arc<dyn KeyValueStore>,
    config: SessionConfig,
    shared: Arc<Shared>,
    next_seq: AtomicU64,
    lifetime: CancellationToken,
}

impl SessionCoordinator {
    /// Creates a session, loading the favorites list from `store`.
    pub async fn new(
        backend: Arc<dyn ExecutionBackend>,
        store: Arc<dyn KeyValueStore>,
        config: SessionConfig,
    ) -> Result<Self> {
        let favorites = persistence::load_favorites(store.as_ref(), &config.favorites_key).await?;
        info!("Session started with {} favorites", favorites.len());

        let (state, _) = watch::channel(SessionState::new(
            config.default_statement.clone(),
            favorites,
        ));

        Ok(Self {
            backend,
            store,
            config,
            shared: Arc::new(Shared {
                state,
                in_flight: AtomicUsize::new(0),
            }),
            next_seq: AtomicU64::new(1),
            lifetime: CancellationToken::new(),
        })
    }

    /// Subscribes to state snapshots. The receiver starts at the current state.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.shared.state.subscribe()
    }

    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> SessionState {
        self.shared.state.borrow().clone()
    }

    /// Returns true while any run is dispatching or settling.
    pub fn is_loading(&self) -> bool {
        self.shared.state.borrow().loading
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Runs `raw` as one submission, resolving to the run's sequence number.
    ///
    /// `loading` becomes true as soon as this is called, before the returned
    /// future is first polled. On success the new entries are prepended to
    /// history and `last_text` becomes `display_override` (when non-empty) or
    /// `raw`. Backend failures are returned unchanged and leave history and
    /// `last_text` untouched. Either way `loading` clears after the settle
    /// delay, even if the future is dropped before it completes.
    ///
    /// After [`shutdown`](Self::shutdown) the run is refused, and a run still
    /// waiting on the backend at shutdown fails without touching the state.
    pub fn run(
        &self,
        raw: impl Into<String>,
        display_override: Option<String>,
    ) -> BoxFuture<'_, Result<u64>> {
        if let Err(e) = self.ensure_active() {
            return futures::future::ready(Err(e)).boxed();
        }

        let raw = raw.into();
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.shared.begin_run();
        let guard = RunGuard {
            shared: Arc::clone(&self.shared),
            lifetime: self.lifetime.clone(),
            settle_delay: self.config.settle_delay,
            seq,
        };

        async move {
            let outcome = self.dispatch(seq, raw, display_override).await;
            drop(guard);
            outcome
        }
        .boxed()
    }

    async fn dispatch(
        &self,
        seq: u64,
        raw: String,
        display_override: Option<String>,
    ) -> Result<u64> {
        let split = splitter::split(&raw);
        debug!(
            seq,
            statements = split.statements.len(),
            directives = split.param_directives.len(),
            "Dispatching run"
        );

        let responses = self
            .backend
            .batch_execute(
                &split.statements,
                &split.param_directives,
                &TelemetryTag::console_run(),
            )
            .await
            .inspect_err(|e| warn!(seq, "Run failed: {e}"))?;
        self.ensure_active()?;

        let entries: Vec<ResultEntry> = responses
            .into_iter()
            .map(|response| ResultEntry::new(seq, response))
            .collect();
        let added = entries.len();

        if split.requires_param_refresh() {
            if let Err(e) = self.get_params().await {
                warn!(seq, "Parameter refresh after run failed: {e}");
            }
        }

        let last_text = display_override
            .filter(|text| !text.is_empty())
            .unwrap_or(raw);
        self.ensure_active()?;
        self.shared.state.send_modify(|state| {
            state.history.splice(0..0, entries);
            state.last_text = last_text;
        });

        info!(seq, added, "Run completed");
        Ok(seq)
    }

    /// Fetches the session parameter table, replacing the current one.
    ///
    /// A response without a table yields an empty one. On failure the
    /// previous table is kept and the error is returned.
    pub async fn get_params(&self) -> Result<()> {
        let response = self
            .backend
            .execute_one("", &[PARAMS_INSPECTION.to_string()])
            .await?;
        self.ensure_active()?;
        let params = response.local_params().cloned().unwrap_or_default();
        debug!("Fetched {} session parameters", params.len());

        self.shared.state.send_modify(|state| {
            state.params = Some(params);
        });
        Ok(())
    }

    /// Restores the default statement and clears history and parameters.
    pub fn reset_model(&self) {
        if self.lifetime.is_cancelled() {
            debug!("Ignoring reset of a shut down session");
            return;
        }
        let default_statement = self.config.default_statement.clone();
        self.shared.state.send_modify(|state| {
            state.last_text = default_statement;
            state.history.clear();
            state.params = None;
        });
        debug!("Session reset");
    }

    /// Persists `favorites` and makes it the current list.
    ///
    /// The in-memory list only changes once the store accepted the write.
    pub async fn update_favorites(&self, favorites: Favorites) -> Result<()> {
        self.ensure_active()?;
        persistence::save_favorites(self.store.as_ref(), &self.config.favorites_key, &favorites)
            .await?;
        debug!("Saved {} favorites", favorites.len());

        self.shared.state.send_modify(|state| {
            state.favorites = favorites;
        });
        Ok(())
    }

    /// Saves `statement` under `name`, replacing any previous entry.
    pub async fn add_favorite(
        &self,
        name: impl Into<String>,
        statement: impl Into<String>,
    ) -> Result<()> {
        let updated = self.snapshot().favorites.with(name, statement);
        self.update_favorites(updated).await
    }

    /// Removes the favorite named `name`. Returns false if it did not exist.
    pub async fn remove_favorite(&self, name: &str) -> Result<bool> {
        let current = self.snapshot().favorites;
        if !current.contains(name) {
            return Ok(false);
        }
        self.update_favorites(current.without(name)).await?;
        Ok(true)
    }

    /// Ends the session. Pending settle actions are dropped and operations
    /// still in flight finish without touching the state.
    pub fn shutdown(&self) {
        if !self.lifetime.is_cancelled() {
            info!("Session shut down");
            self.lifetime.cancel();
        }
    }
}

impl SessionCoordinator {
    fn ensure_active(&self) -> Result<()> {
        if self.lifetime.is_cancelled() {
            return Err(ConsoleError::internal("Session has been shut down"));
        }
        Ok(())
    }
}

impl Drop for SessionCoordinator {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}

//! Load-once license table cache.
//!
//! The first caller moves the cache from `Idle` to `Loading` and spawns the
//! load as its own task. The cache then settles into exactly one terminal
//! state for its lifetime: `Loaded`, `AbsentSource` or `LoadFailed`. There
//! are no retries.
//! Callers arriving while a load is in flight poll until it settles or the
//! bounded wait runs out.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::config::{LICENSE_WAIT_MAX_POLLS, LICENSE_WAIT_POLL_INTERVAL};

use super::source::LicenseSource;
use super::table::LicenseTable;

#[derive(Debug, Clone)]
enum LoadState {
    Idle,
    Loading,
    Loaded(Arc<LicenseTable>),
    AbsentSource,
    LoadFailed(String),
}

/// What a caller observes about the table.
#[derive(Debug, Clone)]
pub enum TableStatus {
    Loaded(Arc<LicenseTable>),
    /// The source does not exist (table not built yet).
    Absent,
    /// Transport or parse failure.
    Failed(String),
    /// A load is in flight and the caller chose not to wait.
    Pending,
    /// A load is in flight and the bounded wait ran out.
    TimedOut,
}

impl TableStatus {
    pub fn loaded(table: LicenseTable) -> Self {
        Self::Loaded(Arc::new(table))
    }

    pub fn table(&self) -> Option<&LicenseTable> {
        match self {
            Self::Loaded(table) => Some(table),
            _ => None,
        }
    }
}

impl From<Option<LicenseTable>> for TableStatus {
    fn from(table: Option<LicenseTable>) -> Self {
        match table {
            Some(table) => Self::loaded(table),
            None => Self::Absent,
        }
    }
}

/// Whether a query blocks (bounded) on an in-flight load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitPolicy {
    #[default]
    Block,
    NoWait,
}

pub struct LicenseTableCache {
    source: Arc<dyn LicenseSource>,
    state: Arc<Mutex<LoadState>>,
    poll_interval: Duration,
    max_polls: u32,
}

// The state is only ever replaced wholesale, so a poisoned guard still holds
// a consistent value.
fn lock_state(state: &Mutex<LoadState>) -> MutexGuard<'_, LoadState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

fn status_of(state: &LoadState) -> TableStatus {
    match state {
        LoadState::Loaded(table) => TableStatus::Loaded(Arc::clone(table)),
        LoadState::AbsentSource => TableStatus::Absent,
        LoadState::LoadFailed(reason) => TableStatus::Failed(reason.clone()),
        LoadState::Idle | LoadState::Loading => TableStatus::Pending,
    }
}

async fn load_from(source: &dyn LicenseSource) -> LoadState {
    let location = source.describe();
    tracing::debug!(source = %location, "Loading license table");

    match source.load().await {
        Ok(Some(table)) => {
            tracing::info!(source = %location, keys = table.len(), "License table loaded");
            LoadState::Loaded(Arc::new(table))
        }
        Ok(None) => {
            tracing::warn!(source = %location, "License table source does not exist");
            LoadState::AbsentSource
        }
        Err(e) => {
            tracing::warn!(source = %location, error = %e, "License table load failed");
            LoadState::LoadFailed(e.to_string())
        }
    }
}

impl LicenseTableCache {
    pub fn new(source: Arc<dyn LicenseSource>) -> Self {
        Self {
            source,
            state: Arc::new(Mutex::new(LoadState::Idle)),
            poll_interval: LICENSE_WAIT_POLL_INTERVAL,
            max_polls: LICENSE_WAIT_MAX_POLLS,
        }
    }

    /// Override the bounded wait (poll interval × number of polls).
    pub fn with_wait(mut self, poll_interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = poll_interval;
        self.max_polls = max_polls;
        self
    }

    fn lock(&self) -> MutexGuard<'_, LoadState> {
        lock_state(&self.state)
    }

    /// Current status without waiting or starting a load.
    pub fn status(&self) -> TableStatus {
        status_of(&self.lock())
    }

    /// Status according to the caller's wait policy. Either policy starts
    /// the load on first use.
    pub async fn get(&self, policy: WaitPolicy) -> TableStatus {
        match policy {
            WaitPolicy::Block => self.ensure_loaded().await,
            WaitPolicy::NoWait => {
                self.start_load();
                self.status()
            }
        }
    }

    /// Start the load in the background so later queries find it settled.
    /// Returns the load task when this call started it. Must be called from
    /// within a tokio runtime.
    pub fn preload(&self) -> Option<JoinHandle<TableStatus>> {
        self.start_load()
    }

    /// Flip `Idle → Loading` and spawn the load. The task owns everything it
    /// touches, so dropping any caller never strands the cache in `Loading`.
    fn start_load(&self) -> Option<JoinHandle<TableStatus>> {
        {
            let mut state = self.lock();
            if !matches!(*state, LoadState::Idle) {
                return None;
            }
            *state = LoadState::Loading;
        }

        let source = Arc::clone(&self.source);
        let state = Arc::clone(&self.state);
        Some(tokio::spawn(async move {
            let next = load_from(source.as_ref()).await;
            let mut state = lock_state(&state);
            *state = next;
            status_of(&state)
        }))
    }

    /// Load the table if nobody has yet, or wait (bounded) for the load in
    /// flight, and report the terminal state.
    pub async fn ensure_loaded(&self) -> TableStatus {
        match self.start_load() {
            Some(task) => self.await_load(task).await,
            None => self.wait_for_load().await,
        }
    }

    fn bounded_wait(&self) -> Duration {
        self.poll_interval * self.max_polls
    }

    async fn await_load(&self, task: JoinHandle<TableStatus>) -> TableStatus {
        match tokio::time::timeout(self.bounded_wait(), task).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "License table load task ended abnormally");
                let mut state = self.lock();
                if matches!(*state, LoadState::Loading) {
                    *state = LoadState::LoadFailed(e.to_string());
                }
                status_of(&state)
            }
            Err(_) => {
                tracing::warn!("Gave up waiting for license table load");
                TableStatus::TimedOut
            }
        }
    }

    async fn wait_for_load(&self) -> TableStatus {
        let mut polls = 0;
        loop {
            {
                let state = self.lock();
                if !matches!(*state, LoadState::Idle | LoadState::Loading) {
                    return status_of(&state);
                }
            }
            if polls == self.max_polls {
                tracing::warn!("Gave up waiting for license table load");
                return TableStatus::TimedOut;
            }
            polls += 1;
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

//! Worker lifecycle state machine.

use pwa_cache_core::Error;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Parsed,
    Installing,
    /// Installed and waiting for activation.
    Installed,
    Activating,
    Activated,
    /// Install failed; the worker never serves.
    Redundant,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        }
    }
}

#[derive(Debug)]
struct Inner {
    state: WorkerState,
    skip_waiting: bool,
}

/// Tracks where a worker is in install/activate and whether it may skip waiting.
#[derive(Debug)]
pub struct Lifecycle {
    inner: RwLock<Inner>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self { inner: RwLock::new(Inner { state: WorkerState::Parsed, skip_waiting: false }) }
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn state(&self) -> WorkerState {
        self.inner.read().await.state
    }

    pub async fn is_active(&self) -> bool {
        self.state().await == WorkerState::Activated
    }

    /// Installed but neither activated nor told to skip waiting.
    pub async fn is_waiting(&self) -> bool {
        let inner = self.inner.read().await;
        inner.state == WorkerState::Installed && !inner.skip_waiting
    }

    /// Allow activation without waiting for older pages to close. Both
    /// variants call this at the end of install, so a posted
    /// `SKIP_WAITING` finds the flag already set and changes nothing.
    pub async fn skip_waiting(&self) {
        self.inner.write().await.skip_waiting = true;
    }

    async fn transition(&self, from: WorkerState, to: WorkerState) -> Result<(), Error> {
        let mut inner = self.inner.write().await;
        if inner.state != from {
            return Err(Error::InvalidState(format!(
                "cannot move to {} from {} (expected {})",
                to.as_str(),
                inner.state.as_str(),
                from.as_str()
            )));
        }
        inner.state = to;
        Ok(())
    }

    pub async fn begin_install(&self) -> Result<(), Error> {
        self.transition(WorkerState::Parsed, WorkerState::Installing).await
    }

    pub async fn finish_install(&self) -> Result<(), Error> {
        self.transition(WorkerState::Installing, WorkerState::Installed).await
    }

    pub async fn fail_install(&self) {
        self.inner.write().await.state = WorkerState::Redundant;
    }

    pub async fn begin_activate(&self) -> Result<(), Error> {
        self.transition(WorkerState::Installed, WorkerState::Activating).await
    }

    pub async fn finish_activate(&self) -> Result<(), Error> {
        self.transition(WorkerState::Activating, WorkerState::Activated).await
    }
}

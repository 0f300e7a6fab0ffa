//! Boot status and per-system status table for one boot attempt.

use std::any::type_name;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{BootStatus, SequenceObserver, SystemStatus};
use crate::system::{System, SystemError, SystemHandle, SystemKind};

/// Lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("system {0} not found")]
    NotFound(String),

    #[error("system {target} failed to initialize: {error}")]
    Failed { target: String, error: String },
}

/// One row of the status table.
#[derive(Debug, Clone)]
struct TrackedSystem {
    handle: SystemHandle,
    status: SystemStatus,
    error: Option<String>,
}

/// Owner of the boot status and the per-system status table.
///
/// Shared by `Arc`; every read is a snapshot. Each status change bumps an
/// internal revision so that async lookups wake up instead of polling.
pub struct BootSession {
    id: Uuid,
    boot_status: RwLock<BootStatus>,
    systems: RwLock<Vec<TrackedSystem>>,
    revision: watch::Sender<u64>,
}

impl Default for BootSession {
    fn default() -> Self {
        Self::new()
    }
}

impl BootSession {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            id: Uuid::new_v4(),
            boot_status: RwLock::new(BootStatus::NotStarted),
            systems: RwLock::new(Vec::new()),
            revision,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn boot_status(&self) -> BootStatus {
        *self.boot_status.read()
    }

    /// Kind and status of every tracked system, in registration order.
    pub fn statuses(&self) -> Vec<(SystemKind, SystemStatus)> {
        self.systems
            .read()
            .iter()
            .map(|t| (t.handle.kind().clone(), t.status))
            .collect()
    }

    pub fn status_of(&self, kind: &SystemKind) -> Option<SystemStatus> {
        self.systems
            .read()
            .iter()
            .find(|t| t.handle.kind() == kind)
            .map(|t| t.status)
    }

    /// Every tracked system, whatever its status.
    pub fn all_systems(&self) -> Vec<SystemHandle> {
        self.systems.read().iter().map(|t| t.handle.clone()).collect()
    }

    /// Systems whose `init` succeeded, in registration order.
    pub fn running(&self) -> Vec<SystemHandle> {
        self.systems
            .read()
            .iter()
            .filter(|t| t.status == SystemStatus::Running)
            .map(|t| t.handle.clone())
            .collect()
    }

    /// The tracked system of `kind`, whatever its status.
    pub fn get_by_kind(&self, kind: &SystemKind) -> Result<SystemHandle, LookupError> {
        self.systems
            .read()
            .iter()
            .find(|t| t.handle.kind() == kind)
            .map(|t| t.handle.clone())
            .ok_or_else(|| LookupError::NotFound(kind.to_string()))
    }

    /// The first tracked system of concrete type `T`, whatever its status.
    pub fn get<T: System>(&self) -> Result<std::sync::Arc<T>, LookupError> {
        self.systems
            .read()
            .iter()
            .find_map(|t| t.handle.downcast::<T>())
            .ok_or_else(|| LookupError::NotFound(type_name::<T>().to_string()))
    }

    /// Wait until the system of `kind` is `Running`.
    ///
    /// Resolves to [`LookupError::Failed`] if its `init` fails, and to
    /// [`LookupError::NotFound`] if the boot finishes without tracking it.
    /// Drop the future to stop waiting.
    pub async fn wait_for_kind(&self, kind: &SystemKind) -> Result<SystemHandle, LookupError> {
        self.wait_until(kind.as_str(), |t| t.handle.kind() == kind).await
    }

    /// Wait until the first tracked system of type `T` is `Running`.
    pub async fn wait_for<T: System>(&self) -> Result<std::sync::Arc<T>, LookupError> {
        let target = type_name::<T>();
        let handle = self.wait_until(target, |t| t.handle.is::<T>()).await?;
        handle
            .downcast::<T>()
            .ok_or_else(|| LookupError::NotFound(target.to_string()))
    }

    async fn wait_until<F>(&self, target: &str, matches: F) -> Result<SystemHandle, LookupError>
    where
        F: Fn(&TrackedSystem) -> bool,
    {
        let mut revision = self.revision.subscribe();

        loop {
            {
                let boot_status = *self.boot_status.read();
                let systems = self.systems.read();
                match systems.iter().find(|t| matches(t)) {
                    Some(t) if t.status == SystemStatus::Running => return Ok(t.handle.clone()),
                    Some(t) if t.status == SystemStatus::Failed => {
                        return Err(LookupError::Failed {
                            target: target.to_string(),
                            error: t.error.clone().unwrap_or_default(),
                        })
                    }
                    None if boot_status.is_terminal() => {
                        return Err(LookupError::NotFound(target.to_string()))
                    }
                    _ => {}
                }
            }

            if revision.changed().await.is_err() {
                return Err(LookupError::NotFound(target.to_string()));
            }
        }
    }

    /// Serializable snapshot of the whole session.
    pub fn report(&self) -> BootReport {
        BootReport {
            session: self.id,
            status: self.boot_status(),
            systems: self
                .systems
                .read()
                .iter()
                .map(|t| SystemReport {
                    kind: t.handle.kind().clone(),
                    status: t.status,
                    error: t.error.clone(),
                })
                .collect(),
        }
    }

    /// Move from `NotStarted` to `Loading`. Returns `false` if this session
    /// has already been booted.
    pub(crate) fn begin(&self) -> bool {
        {
            let mut status = self.boot_status.write();
            if *status != BootStatus::NotStarted {
                return false;
            }
            *status = BootStatus::Loading;
        }
        self.bump();
        true
    }

    pub(crate) fn set_boot_status(&self, status: BootStatus) {
        *self.boot_status.write() = status;
        self.bump();
    }

    /// Start tracking `systems` as `Pending`. Indices passed to the
    /// [`SequenceObserver`] methods of [`BootSession::observer`] refer to
    /// this slice.
    pub(crate) fn track(&self, systems: &[SystemHandle]) {
        *self.systems.write() = systems
            .iter()
            .map(|handle| TrackedSystem {
                handle: handle.clone(),
                status: SystemStatus::Pending,
                error: None,
            })
            .collect();
        self.bump();
    }

    /// Observer that records sequencer transitions into this session.
    pub(crate) fn observer(&self) -> SessionObserver<'_> {
        SessionObserver(self)
    }

    /// Record a transition for the system at `index`. Returns its kind, or
    /// `None` if the index is untracked or the transition is not allowed.
    fn transition(&self, index: usize, status: SystemStatus, error: Option<String>) -> Option<SystemKind> {
        let kind = {
            let mut systems = self.systems.write();
            let Some(tracked) = systems.get_mut(index) else {
                warn!("[Boot] Transition to {} for untracked index {}", status, index);
                return None;
            };
            if !tracked.status.can_become(status) {
                warn!(
                    "[Boot] Refusing transition of {} from {} to {}",
                    tracked.handle.kind(),
                    tracked.status,
                    status
                );
                return None;
            }
            tracked.status = status;
            tracked.error = error;
            tracked.handle.kind().clone()
        };
        self.bump();
        Some(kind)
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

/// Feeds [`BootSequencer`](super::BootSequencer) callbacks into a session.
pub(crate) struct SessionObserver<'a>(&'a BootSession);

impl SequenceObserver for SessionObserver<'_> {
    fn on_started(&self, index: usize) {
        if let Some(kind) = self.0.transition(index, SystemStatus::Starting, None) {
            info!(kind = %kind, "[Boot] Task \"{}\" started", kind);
        }
    }

    fn on_completed(&self, index: usize) {
        if let Some(kind) = self.0.transition(index, SystemStatus::Running, None) {
            info!(kind = %kind, "[Boot] Task \"{}\" completed", kind);
        }
    }

    fn on_failed(&self, index: usize, err: &SystemError) {
        if let Some(kind) = self.0.transition(index, SystemStatus::Failed, Some(err.to_string())) {
            error!(kind = %kind, "[Boot] Task \"{}\" failed: {}", kind, err);
        }
    }
}

impl std::fmt::Debug for BootSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootSession")
            .field("id", &self.id)
            .field("boot_status", &self.boot_status())
            .field("systems", &self.statuses())
            .finish()
    }
}

/// Snapshot of a [`BootSession`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootReport {
    pub session: Uuid,
    pub status: BootStatus,
    pub systems: Vec<SystemReport>,
}

impl BootReport {
    pub fn count(&self, status: SystemStatus) -> usize {
        self.systems.iter().filter(|s| s.status == status).count()
    }
}

/// One system in a [`BootReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemReport {
    pub kind: SystemKind,
    pub status: SystemStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

//! Top-level boot flow.

use std::path::Path;
use std::sync::Arc;

use orch_scheduler::{FrameScheduler, SchedulerError};
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::boot::{BootSequencer, BootSession, BootStatus, SequenceOutcome};
use crate::registry::{Materialized, RegistryError, SystemRegistry};
use crate::settings::{ConfigError, OrchestratorSettings, SettingsLoader};
use crate::wiring::{FrameWiring, WiringOutcome};

/// The frame scheduler as shared between the boot flow and the frame loop.
pub type SharedScheduler = Arc<RwLock<FrameScheduler>>;

/// Errors that stop a boot. All of them leave the session `Failed`, except
/// [`BootError::AlreadyStarted`] which leaves it untouched.
#[derive(Debug, Error)]
pub enum BootError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no systems found. Add systems to the [[systems]] list ({} skipped)", .skipped.len())]
    NoSystems { skipped: Vec<RegistryError> },

    #[error("boot session {0} has already been started")]
    AlreadyStarted(Uuid),

    #[error("failed to wire systems into the frame pipeline: {0}")]
    Wiring(#[from] SchedulerError),
}

/// What a successful boot did.
#[derive(Debug, Clone)]
pub struct BootSummary {
    pub session: Uuid,
    pub outcome: SequenceOutcome,
    pub wiring: WiringOutcome,
    /// Configured entries that were not materialized.
    pub skipped: Vec<RegistryError>,
}

/// Boots the registered systems and wires them into the scheduler.
///
/// One orchestrator owns one [`BootSession`]; a session boots at most once.
pub struct Orchestrator {
    registry: SystemRegistry,
    session: Arc<BootSession>,
    scheduler: SharedScheduler,
}

impl Orchestrator {
    /// Orchestrator over the built-in frame pipeline.
    pub fn new(registry: SystemRegistry) -> Self {
        Self::with_scheduler(registry, Arc::new(RwLock::new(FrameScheduler::default())))
    }

    pub fn with_scheduler(registry: SystemRegistry, scheduler: SharedScheduler) -> Self {
        Self {
            registry,
            session: Arc::new(BootSession::new()),
            scheduler,
        }
    }

    pub fn registry(&self) -> &SystemRegistry {
        &self.registry
    }

    pub fn session(&self) -> Arc<BootSession> {
        Arc::clone(&self.session)
    }

    pub fn scheduler(&self) -> SharedScheduler {
        Arc::clone(&self.scheduler)
    }

    /// Boot with explicit settings.
    pub async fn boot(&self, settings: &OrchestratorSettings) -> Result<BootSummary, BootError> {
        self.boot_with(|| Ok(settings.clone())).await
    }

    /// Discover the settings file in `dir`, apply environment overrides, and
    /// boot with the result.
    pub async fn boot_from_dir<P: AsRef<Path>>(&self, dir: P) -> Result<BootSummary, BootError> {
        let dir = dir.as_ref();
        self.boot_with(|| {
            let mut settings = SettingsLoader::discover(dir)?;
            settings.apply_env_overrides()?;
            Ok(settings)
        })
        .await
    }

    /// Remove everything this orchestrator wired into the scheduler.
    pub fn shutdown(&self) -> usize {
        let removed = self.scheduler.write().clear_inserted();
        info!("[Boot] Shutdown complete, removed {} node(s)", removed);
        removed
    }

    async fn boot_with<F>(&self, load: F) -> Result<BootSummary, BootError>
    where
        F: FnOnce() -> Result<OrchestratorSettings, ConfigError>,
    {
        if !self.session.begin() {
            return Err(BootError::AlreadyStarted(self.session.id()));
        }

        let span = info_span!("boot", session = %self.session.id());
        let result = async {
            match load() {
                Ok(settings) => self.run(&settings).await,
                Err(e) => Err(BootError::Config(e)),
            }
        }
        .instrument(span)
        .await;

        match &result {
            Ok(_) => self.session.set_boot_status(BootStatus::Completed),
            Err(e) => {
                error!("[Boot] Boot failed: {}", e);
                self.session.set_boot_status(BootStatus::Failed);
            }
        }
        result
    }

    async fn run(&self, settings: &OrchestratorSettings) -> Result<BootSummary, BootError> {
        info!("[Boot] Loading systems...");

        let entries = settings.systems()?;
        let Materialized { systems, skipped } = {
            let scheduler = self.scheduler.read();
            self.registry.materialize(entries, scheduler.root())
        };
        if systems.is_empty() {
            return Err(BootError::NoSystems { skipped });
        }
        info!("[Boot] Found {} systems", systems.len());

        self.session.track(&systems);
        let outcome = BootSequencer::new()
            .with_init_timeout(settings.timeout())
            .sequence(&systems, &self.session.observer())
            .await;
        info!(
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            "[Boot] System init finished. {} successful boots. {} failed boots.",
            outcome.succeeded,
            outcome.failed
        );

        let running = self.session.running();
        let wiring = {
            let mut scheduler = self.scheduler.write();
            FrameWiring::from_settings(settings).wire(&mut scheduler, &running, outcome)?
        };

        if wiring.is_wired() {
            for handle in &running {
                handle.system().ready();
            }
        }

        Ok(BootSummary {
            session: self.session.id(),
            outcome,
            wiring,
            skipped,
        })
    }
}

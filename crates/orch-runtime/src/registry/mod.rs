//! # System Registry
//!
//! Maps stable kind identifiers to factories, and turns the configured system
//! list into constructed instances.
//!
//! Registration is explicit, one call per concrete system at startup:
//!
//! ```rust,ignore
//! let mut registry = SystemRegistry::new();
//! registry
//!     .register::<AudioSystem>("audio")
//!     .register_with("network", || NetworkSystem::connect(&endpoint));
//! ```
//!
//! Materialization never fails as a whole. Entries that are disabled, unknown,
//! duplicated, reserved, or whose factory fails are skipped and reported. A
//! kind is reserved when it is empty, names the `orchestrator-systems` marker,
//! or names any node of the pipeline the systems will be wired into.

use std::collections::{HashMap, HashSet};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use orch_scheduler::Node;
use thiserror::Error;
use tracing::{error, info};

use crate::settings::SystemEntry;
use crate::system::{System, SystemHandle, SystemKind};
use crate::wiring::ORCHESTRATOR_SYSTEMS;

type SystemFactory = Box<dyn Fn() -> anyhow::Result<SystemHandle> + Send + Sync>;

/// Why a configured entry was not materialized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("system '{0}' is disabled")]
    Disabled(SystemKind),

    #[error("system '{0}' not found. Did you rename it or forget to register it?")]
    UnknownKind(SystemKind),

    #[error("system '{0}' is listed more than once")]
    DuplicateKind(SystemKind),

    #[error("'{0}' is reserved by the frame pipeline and cannot name a system")]
    ReservedKind(SystemKind),

    #[error("failed to create instance of '{kind}': {message}")]
    Construction { kind: SystemKind, message: String },
}

impl RegistryError {
    pub fn kind(&self) -> &SystemKind {
        match self {
            Self::Disabled(kind)
            | Self::UnknownKind(kind)
            | Self::DuplicateKind(kind)
            | Self::ReservedKind(kind)
            | Self::Construction { kind, .. } => kind,
        }
    }
}

/// Result of materializing a system list.
#[derive(Debug, Default)]
pub struct Materialized {
    /// Constructed systems, in list order, at most one per kind.
    pub systems: Vec<SystemHandle>,
    /// Entries that were skipped, in list order.
    pub skipped: Vec<RegistryError>,
}

impl Materialized {
    /// Skipped entries other than the ones disabled on purpose.
    pub fn errors(&self) -> impl Iterator<Item = &RegistryError> {
        self.skipped
            .iter()
            .filter(|e| !matches!(e, RegistryError::Disabled(_)))
    }
}

/// Kind → factory map.
#[derive(Default)]
pub struct SystemRegistry {
    factories: HashMap<SystemKind, SystemFactory>,
}

impl SystemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a system constructed with `T::default()`.
    pub fn register<T>(&mut self, kind: impl Into<SystemKind>) -> &mut Self
    where
        T: System + Default,
    {
        self.register_with(kind, || Ok(T::default()))
    }

    /// Register a system built by a fallible factory.
    ///
    /// Registering a kind twice replaces the earlier factory.
    pub fn register_with<T, F>(&mut self, kind: impl Into<SystemKind>, factory: F) -> &mut Self
    where
        T: System,
        F: Fn() -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let kind = kind.into();
        let handle_kind = kind.clone();
        let factory: SystemFactory = Box::new(move || {
            factory().map(|system| SystemHandle::from_arc(handle_kind.clone(), Arc::new(system)))
        });

        if self.factories.insert(kind.clone(), factory).is_some() {
            info!("[Registry] Replaced factory for {}", kind);
        }
        self
    }

    pub fn contains(&self, kind: &SystemKind) -> bool {
        self.factories.contains_key(kind)
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<SystemKind> {
        let mut kinds: Vec<_> = self.factories.keys().cloned().collect();
        kinds.sort();
        kinds
    }

    /// Construct one instance of `kind`.
    ///
    /// Only the empty kind and the marker are rejected here; collisions with
    /// pipeline nodes are checked by [`SystemRegistry::materialize`].
    pub fn construct(&self, kind: &SystemKind) -> Result<SystemHandle, RegistryError> {
        if kind.as_str().is_empty() || kind.as_str() == ORCHESTRATOR_SYSTEMS.as_str() {
            return Err(RegistryError::ReservedKind(kind.clone()));
        }

        let factory = self
            .factories
            .get(kind)
            .ok_or_else(|| RegistryError::UnknownKind(kind.clone()))?;

        match catch_unwind(AssertUnwindSafe(factory)) {
            Ok(Ok(handle)) => Ok(handle),
            Ok(Err(e)) => Err(RegistryError::Construction {
                kind: kind.clone(),
                message: format!("{e:#}"),
            }),
            Err(payload) => Err(RegistryError::Construction {
                kind: kind.clone(),
                message: format!("factory panicked: {}", panic_message(payload.as_ref())),
            }),
        }
    }

    /// Construct every enabled entry of `entries`, in order.
    ///
    /// Kinds naming a node of `pipeline` are skipped as reserved.
    pub fn materialize(&self, entries: &[SystemEntry], pipeline: &Node) -> Materialized {
        let mut out = Materialized::default();
        let mut seen = HashSet::new();
        let reserved: HashSet<&str> = pipeline.ids().into_iter().map(|id| id.as_str()).collect();

        for entry in entries {
            let outcome = if !entry.enabled {
                Err(RegistryError::Disabled(entry.kind.clone()))
            } else if seen.contains(&entry.kind) {
                Err(RegistryError::DuplicateKind(entry.kind.clone()))
            } else if reserved.contains(entry.kind.as_str()) {
                Err(RegistryError::ReservedKind(entry.kind.clone()))
            } else {
                self.construct(&entry.kind)
            };

            match outcome {
                Ok(handle) => {
                    info!("[Registry] Constructed {}", entry.kind);
                    seen.insert(entry.kind.clone());
                    out.systems.push(handle);
                }
                Err(e @ RegistryError::Disabled(_)) => {
                    info!("[Registry] Skipping disabled system: {}", entry.kind);
                    out.skipped.push(e);
                }
                Err(e) => {
                    error!(kind = %entry.kind, "[Registry] {}", e);
                    out.skipped.push(e);
                }
            }
        }

        out
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

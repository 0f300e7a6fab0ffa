//! The `System` capability and its type-erased handle.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use orch_scheduler::NodeId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable identifier used to resolve, construct and track a system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SystemKind(String);

impl SystemKind {
    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Scheduler identity of this system's per-frame node.
    #[must_use]
    pub fn node_id(&self) -> NodeId {
        NodeId::new(self.0.clone())
    }
}

impl fmt::Display for SystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SystemKind {
    fn from(kind: &str) -> Self {
        Self::new(kind)
    }
}

impl From<String> for SystemKind {
    fn from(kind: String) -> Self {
        Self(kind)
    }
}

/// Errors raised while a system initializes.
#[derive(Debug, Error)]
pub enum SystemError {
    #[error("{0}")]
    Init(String),

    #[error("init panicked: {0}")]
    Panicked(String),

    #[error("init timed out after {0:?}")]
    TimedOut(Duration),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SystemError {
    /// Shorthand for an [`SystemError::Init`] failure.
    pub fn init(message: impl Into<String>) -> Self {
        Self::Init(message.into())
    }
}

/// A pluggable unit of behavior.
///
/// Every method has a default: a system that needs no async setup boots
/// immediately, and one without per-frame work still gets a (no-op) node.
/// Implementations use interior mutability for state touched by `update`.
#[async_trait]
pub trait System: Send + Sync + 'static {
    /// Asynchronous setup, run concurrently with every other system's.
    async fn init(&self) -> Result<(), SystemError> {
        Ok(())
    }

    /// Called once per frame after the system has been wired.
    fn update(&self) {}

    /// Called once after wiring, before the first frame that runs `update`.
    fn ready(&self) {}
}

/// A constructed system together with its kind.
///
/// Keeps a second, `Any`-typed pointer to the same instance so that typed
/// lookups can hand back `Arc<T>`.
#[derive(Clone)]
pub struct SystemHandle {
    kind: SystemKind,
    system: Arc<dyn System>,
    instance: Arc<dyn Any + Send + Sync>,
}

impl SystemHandle {
    pub fn new<T: System>(kind: impl Into<SystemKind>, system: T) -> Self {
        Self::from_arc(kind, Arc::new(system))
    }

    pub fn from_arc<T: System>(kind: impl Into<SystemKind>, system: Arc<T>) -> Self {
        Self {
            kind: kind.into(),
            system: Arc::clone(&system) as Arc<dyn System>,
            instance: system,
        }
    }

    pub fn kind(&self) -> &SystemKind {
        &self.kind
    }

    pub fn system(&self) -> &Arc<dyn System> {
        &self.system
    }

    /// The concrete instance, if it is a `T`.
    #[must_use]
    pub fn downcast<T: System>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.instance).downcast::<T>().ok()
    }

    /// Whether the concrete instance is a `T`.
    #[must_use]
    pub fn is<T: System>(&self) -> bool {
        self.instance.is::<T>()
    }
}

impl fmt::Debug for SystemHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemHandle").field("kind", &self.kind).finish()
    }
}

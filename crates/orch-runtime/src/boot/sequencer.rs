//! Concurrent `init` driver.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use futures::FutureExt;
use serde::{Deserialize, Serialize};

use crate::registry::panic_message;
use crate::system::{System, SystemError, SystemHandle};

/// Receives per-system transitions, addressed by index into the slice passed
/// to [`BootSequencer::sequence`].
///
/// Callbacks run on the task driving the sequence, never concurrently with
/// each other. For any one index, `on_started` comes first and is followed
/// by exactly one of `on_completed` / `on_failed`.
pub trait SequenceObserver: Send + Sync {
    fn on_started(&self, index: usize);
    fn on_completed(&self, index: usize);
    fn on_failed(&self, index: usize, error: &SystemError);
}

/// Success and failure counts of one sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceOutcome {
    pub succeeded: usize,
    pub failed: usize,
}

impl SequenceOutcome {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Launches every `init` at once and waits for all of them.
///
/// All inits are interleaved on the calling task. A panic or a timeout in one
/// init fails that system only.
#[derive(Debug, Clone, Copy, Default)]
pub struct BootSequencer {
    init_timeout: Option<Duration>,
}

impl BootSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any `init` that has not resolved after `timeout`.
    #[must_use]
    pub fn with_init_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.init_timeout = timeout;
        self
    }

    pub fn init_timeout(&self) -> Option<Duration> {
        self.init_timeout
    }

    /// Run every system's `init` concurrently.
    ///
    /// Returns once every launched init has succeeded or failed.
    pub async fn sequence<O>(&self, systems: &[SystemHandle], observer: &O) -> SequenceOutcome
    where
        O: SequenceObserver + ?Sized,
    {
        let tasks = systems.iter().enumerate().map(|(index, handle)| {
            let system = Arc::clone(handle.system());
            async move {
                observer.on_started(index);
                match run_init(&system, self.init_timeout).await {
                    Ok(()) => {
                        observer.on_completed(index);
                        true
                    }
                    Err(e) => {
                        observer.on_failed(index, &e);
                        false
                    }
                }
            }
        });

        join_all(tasks)
            .await
            .into_iter()
            .fold(SequenceOutcome::default(), |mut outcome, ok| {
                if ok {
                    outcome.succeeded += 1;
                } else {
                    outcome.failed += 1;
                }
                outcome
            })
    }
}

async fn run_init(system: &Arc<dyn System>, timeout: Option<Duration>) -> Result<(), SystemError> {
    let init = AssertUnwindSafe(system.init()).catch_unwind();

    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, init).await {
            Ok(result) => result,
            Err(_) => return Err(SystemError::TimedOut(limit)),
        },
        None => init.await,
    };

    match result {
        Ok(inner) => inner,
        Err(payload) => Err(SystemError::Panicked(panic_message(payload.as_ref()))),
    }
}

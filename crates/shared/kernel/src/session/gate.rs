use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Serializes local record mutations against per-record sync uploads.
///
/// Not reentrant: code running under a [`MutationGuard`] receives the guard
/// instead of acquiring it again.
#[derive(Debug, Clone, Default)]
pub struct MutationGate {
    lock: Arc<Mutex<()>>,
}

impl MutationGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other mutation is in progress.
    pub async fn begin(&self) -> MutationGuard {
        MutationGuard { _guard: Arc::clone(&self.lock).lock_owned().await }
    }

    /// Acquires the gate only if it is free right now.
    #[must_use]
    pub fn try_begin(&self) -> Option<MutationGuard> {
        Arc::clone(&self.lock).try_lock_owned().ok().map(|guard| MutationGuard { _guard: guard })
    }
}

/// Held for the duration of one local update. Dropping it ends the update.
#[must_use = "the update ends as soon as the guard is dropped"]
pub struct MutationGuard {
    _guard: OwnedMutexGuard<()>,
}

impl fmt::Debug for MutationGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MutationGuard")
    }
}

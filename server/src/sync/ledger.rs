//! Pass serialization and the last finished report.

use super::PassReport;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Shared between handlers and the tasks running passes.
///
/// `running` is held for the whole pass; `last` is only locked to copy a
/// report in or out, so readers never wait on a pass in flight.
#[derive(Debug, Clone, Default)]
pub struct PassLedger {
    running: Arc<Mutex<()>>,
    last: Arc<RwLock<Option<PassReport>>>,
}

impl PassLedger {
    /// Wait until no other pass runs.
    pub async fn begin(&self) -> OwnedMutexGuard<()> {
        self.running.clone().lock_owned().await
    }

    pub fn is_running(&self) -> bool {
        self.running.try_lock().is_err()
    }

    pub fn record(&self, report: PassReport) {
        *self.last.write().unwrap_or_else(PoisonError::into_inner) = Some(report);
    }

    pub fn last(&self) -> Option<PassReport> {
        self.last
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

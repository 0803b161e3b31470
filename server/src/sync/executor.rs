//! Batch executor.
//!
//! Issues one request per non-empty batch kind. The three requests run
//! concurrently and settle independently: a failed create never cancels the
//! update or delete request.

use crate::store::{BatchResponse, RemoteStore, StoreError};
use bondsync_engine::ReconciliationPlan;
use serde::Serialize;
use std::fmt;

/// The three mutation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchKind {
    Create,
    Update,
    Delete,
}

impl fmt::Display for BatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchKind::Create => write!(f, "create"),
            BatchKind::Update => write!(f, "update"),
            BatchKind::Delete => write!(f, "delete"),
        }
    }
}

/// How one batch request settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum BatchOutcome {
    /// Nothing to send; no request was made
    Skipped,
    /// Store accepted the batch
    Applied { count: usize, code: i64, msg: String },
    /// Store answered with a non-success code
    Rejected { count: usize, code: i64, msg: String },
    /// The request itself failed
    Failed { count: usize, error: String },
}

impl BatchOutcome {
    fn settle(kind: BatchKind, count: usize, result: Result<BatchResponse, StoreError>) -> Self {
        match result {
            Ok(response) if response.is_success() => {
                tracing::info!(%kind, count, msg = %response.msg, "batch applied");
                BatchOutcome::Applied {
                    count,
                    code: response.code,
                    msg: response.msg,
                }
            }
            Ok(response) => {
                tracing::warn!(%kind, count, code = response.code, msg = %response.msg, "batch rejected by store");
                BatchOutcome::Rejected {
                    count,
                    code: response.code,
                    msg: response.msg,
                }
            }
            Err(e) => {
                tracing::error!(%kind, count, error = %e, "batch request failed");
                BatchOutcome::Failed {
                    count,
                    error: e.to_string(),
                }
            }
        }
    }

    /// Skipped or applied.
    pub fn is_ok(&self) -> bool {
        matches!(self, BatchOutcome::Skipped | BatchOutcome::Applied { .. })
    }
}

/// Per-kind outcomes of executing a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
    pub create: BatchOutcome,
    pub update: BatchOutcome,
    pub delete: BatchOutcome,
}

impl ExecutionReport {
    pub fn is_success(&self) -> bool {
        self.create.is_ok() && self.update.is_ok() && self.delete.is_ok()
    }
}

/// Apply a plan to the store.
pub async fn execute<S: RemoteStore + ?Sized>(
    store: &S,
    plan: &ReconciliationPlan,
) -> ExecutionReport {
    let delete_ids = plan.delete_ids();

    let create = async {
        if plan.to_create.is_empty() {
            return BatchOutcome::Skipped;
        }
        let count = plan.to_create.len();
        BatchOutcome::settle(BatchKind::Create, count, store.create_batch(&plan.to_create).await)
    };

    let update = async {
        if plan.to_update.is_empty() {
            return BatchOutcome::Skipped;
        }
        let count = plan.to_update.len();
        BatchOutcome::settle(BatchKind::Update, count, store.update_batch(&plan.to_update).await)
    };

    let delete = async {
        if delete_ids.is_empty() {
            return BatchOutcome::Skipped;
        }
        let count = delete_ids.len();
        BatchOutcome::settle(BatchKind::Delete, count, store.delete_batch(&delete_ids).await)
    };

    let (create, update, delete) = tokio::join!(create, update, delete);

    ExecutionReport {
        create,
        update,
        delete,
    }
}

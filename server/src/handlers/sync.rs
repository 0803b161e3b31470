//! Sync handler - reconciles a pushed batch of quotes into the remote table.

use crate::config::Config;
use crate::error::{AppError, Result, SyncError};
use crate::store::StoreConnector;
use crate::sync::{run_pass, PassLedger, PassOptions, PassReport};
use bondsync_engine::RawRecord;
use serde::Deserialize;
use std::sync::Arc;

/// Request body for a sync push.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    /// Complete current quote list
    pub records: Vec<RawRecord>,
    /// Plan only, send no mutation
    #[serde(default)]
    pub dry_run: bool,
    /// Accept an empty list, which deletes every remote row
    #[serde(default)]
    pub allow_empty: bool,
}

/// Process a sync push from the producer.
///
/// The pass runs on its own task and finishes even if the caller goes away;
/// its report is kept in `ledger` either way.
pub async fn handle_sync<C: StoreConnector + 'static>(
    connector: Arc<C>,
    config: &Config,
    ledger: &PassLedger,
    request: SyncRequest,
) -> Result<PassReport> {
    if request.records.is_empty() && !request.allow_empty {
        return Err(AppError::BadRequest(
            "records is empty; set allowEmpty to clear the table".to_string(),
        ));
    }

    let options = PassOptions {
        page_size: config.page_size,
        mapping_policy: config.mapping_policy,
        dry_run: request.dry_run,
    };

    let ledger = ledger.clone();
    let pass = tokio::spawn(async move {
        let _running = ledger.begin().await;
        let report = run_pass(connector.as_ref(), &request.records, &options).await?;

        tracing::info!(
            received = report.received,
            create = report.plan.create,
            update = report.plan.update,
            delete = report.plan.delete,
            ok = report.execution.as_ref().map_or(true, |e| e.is_success()),
            "sync pass finished"
        );

        ledger.record(report.clone());
        Ok::<_, SyncError>(report)
    });

    let report = pass
        .await
        .map_err(|e| AppError::Internal(format!("sync pass did not complete: {}", e)))??;

    Ok(report)
}

//! One reconciliation pass: map, authenticate, read, plan, execute.

use super::{execute, fetch_all, ExecutionReport};
use crate::error::SyncError;
use crate::store::StoreConnector;
use bondsync_engine::{
    dedupe_by_code, map_all, plan, MappingPolicy, PlanSummary, RawRecord, ReconciliationPlan,
    DEFAULT_PAGE_SIZE,
};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Knobs for a pass.
#[derive(Debug, Clone, Copy)]
pub struct PassOptions {
    pub page_size: u32,
    pub mapping_policy: MappingPolicy,
    /// Plan without issuing any mutation
    pub dry_run: bool,
}

impl Default for PassOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            mapping_policy: MappingPolicy::default(),
            dry_run: false,
        }
    }
}

/// A raw record dropped under [`MappingPolicy::Skip`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRecord {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub error: String,
}

/// What a pass did.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassReport {
    pub received: usize,
    pub snapshot_rows: usize,
    pub pages_fetched: usize,
    pub plan: PlanSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedRecord>,
    pub dry_run: bool,
    /// Absent on dry runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionReport>,
}

/// Run a full pass against the store behind `connector`.
///
/// Mapping, authentication and snapshot failures abort before any mutation
/// is sent. Batch failures are reported in the returned [`PassReport`].
#[tracing::instrument(skip_all, fields(received = raws.len(), dry_run = options.dry_run))]
pub async fn run_pass<C: StoreConnector + ?Sized>(
    connector: &C,
    raws: &[RawRecord],
    options: &PassOptions,
) -> Result<PassReport, SyncError> {
    let batch = map_all(raws, options.mapping_policy).map_err(|failure| SyncError::Mapping {
        index: failure.index,
        code: raws[failure.index].bond_id.clone(),
        source: failure.error,
    })?;

    let skipped: Vec<SkippedRecord> = batch
        .skipped
        .into_iter()
        .map(|failure| {
            let code = raws[failure.index].bond_id.clone();
            warn!(index = failure.index, code = ?code, error = %failure.error, "skipping record");
            SkippedRecord {
                index: failure.index,
                code,
                error: failure.error.to_string(),
            }
        })
        .collect();

    let target = dedupe_by_code(batch.records);

    let store = connector.connect().await.map_err(SyncError::Auth)?;
    let snapshot = fetch_all(&store, options.page_size).await?;
    let snapshot_rows = snapshot.len();
    let pages_fetched = snapshot.pages_fetched;

    let plan = plan(snapshot, target);
    log_plan(&plan);

    let execution = if options.dry_run {
        None
    } else {
        Some(execute(&store, &plan).await)
    };

    Ok(PassReport {
        received: raws.len(),
        snapshot_rows,
        pages_fetched,
        plan: plan.summary(),
        skipped,
        dry_run: options.dry_run,
        execution,
    })
}

fn log_plan(plan: &ReconciliationPlan) {
    let summary = plan.summary();
    info!(
        create = summary.create,
        update = summary.update,
        delete = summary.delete,
        "reconciliation planned"
    );

    for record in &plan.to_create {
        debug!(code = %record.code(), "planned create");
    }
    for entry in &plan.to_update {
        debug!(code = %entry.fields.code(), record_id = %entry.record_id, "planned update");
    }
    for entry in &plan.to_delete {
        debug!(record_id = %entry.record_id, "planned delete");
    }
    if !plan.shadowed.is_empty() {
        warn!(
            shadowed = ?plan.shadowed,
            "remote table holds duplicate codes; earlier rows left untouched"
        );
    }
}

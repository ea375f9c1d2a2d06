//! Idempotent mirroring of the dataset into a remote table.
//!
//! A sync reads the whole table first, plans creates and updates against it,
//! and then writes in batches. Only system-owned columns are ever written,
//! so people can keep notes and flags in the same rows. Rows are never
//! deleted. Running the same dataset twice produces no writes the second
//! time.

mod batch;
mod error;
mod fields;
mod plan;
mod report;
mod snapshot;
mod workspace;

pub use batch::{BatchKind, BatchState, Replay, RetryPolicy, SyncBatchFailure};
pub use error::{SyncError, WorkspaceError};
pub use fields::{
    create_payload, normalize, retain_columns, update_payload, DESCRIPTION_LIMIT, TAG_LIMIT,
};
pub use plan::{PlannedCreate, PlannedUpdate, SyncPlan};
pub use report::SyncReport;
pub use snapshot::{RemoteRow, RemoteSnapshot};
pub use workspace::{FieldMap, RecordUpdate, RemoteRecord, RowPage, Workspace};

use crate::aggregate::RepoRecord;
use crate::config::FieldNames;
use batch::drive;
use std::collections::HashSet;
use tracing::{info, info_span, warn, Instrument};

/// Largest batch the table accepts per request.
pub const MAX_BATCH_SIZE: usize = 500;

/// Knobs for one sync.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub fields: FieldNames,
    pub retry: RetryPolicy,

    /// Records per request; clamped to `1..=MAX_BATCH_SIZE`.
    pub batch_size: usize,

    /// Plan and log only.
    pub dry_run: bool,

    /// Columns the table is known to have. Values for other columns are
    /// not written; `None` writes every system-owned column.
    pub available_columns: Option<HashSet<String>>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            fields: FieldNames::default(),
            retry: RetryPolicy::default(),
            batch_size: MAX_BATCH_SIZE,
            dry_run: false,
            available_columns: None,
        }
    }
}

/// Mirrors `records` into `workspace`.
///
/// A failed batch is recorded in the report and the remaining batches still
/// run. An empty record list returns a clean report without touching the
/// workspace.
///
/// # Errors
///
/// Returns [`SyncError::Snapshot`] if the table cannot be read; nothing has
/// been written in that case.
pub async fn sync_records<W>(
    workspace: &W,
    records: &[RepoRecord],
    options: &SyncOptions,
) -> Result<SyncReport, SyncError>
where
    W: Workspace + Sync,
{
    let mut report = SyncReport {
        dry_run: options.dry_run,
        ..Default::default()
    };
    if records.is_empty() {
        info!("No repositories to sync");
        return Ok(report);
    }

    let snapshot = RemoteSnapshot::read(workspace, &options.fields, &options.retry).await?;
    let columns = options.available_columns.as_ref();
    if let Some(columns) = columns {
        for name in options.fields.system_owned() {
            if !columns.contains(name) {
                warn!(column = name, "Column missing from table, not written");
            }
        }
    }
    let plan = SyncPlan::build(records, &snapshot, &options.fields, columns);
    report.unchanged = plan.unchanged;

    info!(
        creates = plan.creates.len(),
        updates = plan.updates.len(),
        unchanged = plan.unchanged,
        "Planned sync"
    );

    if options.dry_run {
        for create in &plan.creates {
            info!(full_name = %create.full_name, "[DRY RUN] Would create row");
        }
        for update in &plan.updates {
            let changed: Vec<&str> = update.fields.keys().map(String::as_str).collect();
            info!(full_name = %update.full_name, changed = ?changed, "[DRY RUN] Would update row");
        }
        report.created = plan.creates.len();
        report.updated = plan.updates.len();
        return Ok(report);
    }

    let batch_size = options.batch_size.clamp(1, MAX_BATCH_SIZE);

    for (index, chunk) in plan.creates.chunks(batch_size).enumerate() {
        let rows: Vec<FieldMap> = chunk.iter().map(|c| c.fields.clone()).collect();
        let span = info_span!("batch", kind = "create", index, size = chunk.len());
        let (state, _) = drive(&options.retry, BatchKind::Create.replay(), || {
            workspace.batch_create(&rows)
        })
        .instrument(span)
        .await;
        log_batch(BatchKind::Create, index, &state);
        let names = chunk.iter().map(|c| c.full_name.clone()).collect();
        report.record_batch(BatchKind::Create, names, &state);
    }

    for (index, chunk) in plan.updates.chunks(batch_size).enumerate() {
        let rows: Vec<RecordUpdate> = chunk.iter().map(PlannedUpdate::to_record_update).collect();
        let span = info_span!("batch", kind = "update", index, size = chunk.len());
        let (state, _) = drive(&options.retry, BatchKind::Update.replay(), || {
            workspace.batch_update(&rows)
        })
        .instrument(span)
        .await;
        log_batch(BatchKind::Update, index, &state);
        let names = chunk.iter().map(|u| u.full_name.clone()).collect();
        report.record_batch(BatchKind::Update, names, &state);
    }

    info!(
        created = report.created,
        updated = report.updated,
        unchanged = report.unchanged,
        failed = report.failed,
        "Sync complete"
    );
    Ok(report)
}

fn log_batch(kind: BatchKind, index: usize, state: &BatchState) {
    match state {
        BatchState::Succeeded { attempts } => {
            info!(kind = kind.as_str(), index, attempts, "Batch written");
        }
        BatchState::Failed { attempts, error } => {
            warn!(kind = kind.as_str(), index, attempts, error = %error, "Batch failed");
        }
        _ => {}
    }
}

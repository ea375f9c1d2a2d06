//! The table the sync engine writes to.

use crate::sync::WorkspaceError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::future::Future;

/// Column name to cell value.
pub type FieldMap = Map<String, Value>;

/// A row as returned by the workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub record_id: String,
    #[serde(default)]
    pub fields: FieldMap,
}

/// One page of rows.
#[derive(Debug, Clone, Default)]
pub struct RowPage {
    pub records: Vec<RemoteRecord>,

    /// Token for the next page; `None` on the last page.
    pub next_page_token: Option<String>,
}

/// Changed fields for one existing row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordUpdate {
    pub record_id: String,
    pub fields: FieldMap,
}

/// A remote table that rows can be listed from and written to.
///
/// Implementations map their failures onto [`WorkspaceError`] so that the
/// engine can tell retryable errors from permanent ones.
pub trait Workspace {
    /// Lists one page of rows, starting at `page_token` (or the beginning).
    fn list_rows(
        &self,
        page_token: Option<&str>,
    ) -> impl Future<Output = Result<RowPage, WorkspaceError>> + Send;

    /// Creates one row per entry.
    fn batch_create(
        &self,
        rows: &[FieldMap],
    ) -> impl Future<Output = Result<(), WorkspaceError>> + Send;

    /// Applies field updates to existing rows.
    fn batch_update(
        &self,
        rows: &[RecordUpdate],
    ) -> impl Future<Output = Result<(), WorkspaceError>> + Send;
}

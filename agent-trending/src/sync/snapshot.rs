//! The table's current contents, keyed by repository.

use crate::config::FieldNames;
use crate::sync::batch::{drive, Replay};
use crate::sync::fields::text_value;
use crate::sync::{BatchState, FieldMap, RemoteRecord, RetryPolicy, SyncError, Workspace};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// An existing row keyed by its project name.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRow {
    pub record_id: String,
    pub full_name: String,
    pub fields: FieldMap,
}

/// Every keyed row in the table.
#[derive(Debug, Clone, Default)]
pub struct RemoteSnapshot {
    rows: HashMap<String, RemoteRow>,
}

impl RemoteSnapshot {
    /// Indexes raw records by the project-name column.
    ///
    /// Rows without a project name are ignored. When two rows share a name
    /// the first one wins.
    pub fn from_records(records: impl IntoIterator<Item = RemoteRecord>, names: &FieldNames) -> Self {
        let mut rows: HashMap<String, RemoteRow> = HashMap::new();
        for record in records {
            let Some(full_name) = text_value(record.fields.get(&names.project_name))
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
            else {
                debug!(record_id = %record.record_id, "Ignoring row without project name");
                continue;
            };

            match rows.entry(full_name) {
                Entry::Occupied(existing) => {
                    let kept = existing.get();
                    warn!(
                        full_name = %kept.full_name,
                        kept = %kept.record_id,
                        ignored = %record.record_id,
                        "Duplicate row for repository"
                    );
                }
                Entry::Vacant(slot) => {
                    let full_name = slot.key().clone();
                    slot.insert(RemoteRow {
                        record_id: record.record_id,
                        full_name,
                        fields: record.fields,
                    });
                }
            }
        }
        Self { rows }
    }

    /// Reads every page of the table.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Snapshot`] if any page cannot be read within the
    /// retry policy.
    pub async fn read<W: Workspace>(
        workspace: &W,
        names: &FieldNames,
        policy: &RetryPolicy,
    ) -> Result<Self, SyncError> {
        let mut records = Vec::new();
        let mut token: Option<String> = None;
        let mut seen = HashSet::new();
        let mut pages = 0usize;

        loop {
            let (state, page) =
                drive(policy, Replay::Safe, || workspace.list_rows(token.as_deref())).await;
            let Some(page) = page else {
                let (attempts, message) = match state {
                    BatchState::Failed { attempts, error } => (attempts, error),
                    other => (other.attempts(), "snapshot page not read".to_string()),
                };
                return Err(SyncError::Snapshot { attempts, message });
            };

            pages += 1;
            records.extend(page.records);

            match page.next_page_token {
                Some(next) if seen.insert(next.clone()) => token = Some(next),
                Some(next) => {
                    warn!(page_token = %next, "Table returned a page token already read, stopping");
                    break;
                }
                None => break,
            }
        }

        let snapshot = Self::from_records(records, names);
        info!(pages, rows = snapshot.len(), "Read table snapshot");
        Ok(snapshot)
    }

    /// Looks up the row for `full_name`.
    #[must_use]
    pub fn get(&self, full_name: &str) -> Option<&RemoteRow> {
        self.rows.get(full_name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

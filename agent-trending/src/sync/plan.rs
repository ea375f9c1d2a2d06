//! Per-record decision: create, update, or leave alone.

use crate::aggregate::RepoRecord;
use crate::config::FieldNames;
use crate::sync::fields::{create_payload, retain_columns, update_payload};
use crate::sync::{FieldMap, RecordUpdate, RemoteSnapshot};
use std::collections::HashSet;
use tracing::warn;

/// A row to create.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedCreate {
    pub full_name: String,
    pub fields: FieldMap,
}

/// Changed fields for an existing row.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedUpdate {
    pub full_name: String,
    pub record_id: String,
    pub fields: FieldMap,
}

impl PlannedUpdate {
    pub(crate) fn to_record_update(&self) -> RecordUpdate {
        RecordUpdate {
            record_id: self.record_id.clone(),
            fields: self.fields.clone(),
        }
    }
}

/// Writes needed to bring the table in line with a dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncPlan {
    pub creates: Vec<PlannedCreate>,
    pub updates: Vec<PlannedUpdate>,

    /// Records whose row already matches.
    pub unchanged: usize,
}

impl SyncPlan {
    /// Compares every record with its row, if any.
    ///
    /// A repeated `full_name` is planned once; later copies are skipped.
    /// When `columns` is known, values for columns outside it are never
    /// planned.
    #[must_use]
    pub fn build(
        records: &[RepoRecord],
        snapshot: &RemoteSnapshot,
        names: &FieldNames,
        columns: Option<&HashSet<String>>,
    ) -> Self {
        let mut plan = Self::default();
        let mut seen = HashSet::new();

        for record in records {
            if !seen.insert(record.full_name.as_str()) {
                warn!(full_name = %record.full_name, "Skipping repeated record");
                continue;
            }

            match snapshot.get(&record.full_name) {
                None => {
                    let mut fields = create_payload(record, names);
                    retain_columns(&mut fields, columns, names);
                    plan.creates.push(PlannedCreate {
                        full_name: record.full_name.clone(),
                        fields,
                    });
                }
                Some(row) => {
                    let mut fields = update_payload(record, &row.fields, names);
                    retain_columns(&mut fields, columns, names);
                    if fields.is_empty() {
                        plan.unchanged += 1;
                    } else {
                        plan.updates.push(PlannedUpdate {
                            full_name: record.full_name.clone(),
                            record_id: row.record_id.clone(),
                            fields,
                        });
                    }
                }
            }
        }

        plan
    }
}

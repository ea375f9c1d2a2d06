//! One Bitable table as a sync [`Workspace`].

use crate::config::FieldNames;
use crate::feishu::models::{BatchCreateBody, BatchUpdateBody, NewRecord, RecordPage};
use crate::feishu::{FeishuClient, LIST_PAGE_SIZE};
use crate::sync::{FieldMap, RecordUpdate, RowPage, Workspace, WorkspaceError};
use std::collections::HashSet;
use tracing::{info, warn};

/// Bitable column types used by the table layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Number,
    SingleSelect,
    DateTime,
    Checkbox,
    Url,
}

impl FieldType {
    /// Numeric type code in the Open API.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Text => 1,
            Self::Number => 2,
            Self::SingleSelect => 3,
            Self::DateTime => 5,
            Self::Checkbox => 7,
            Self::Url => 15,
        }
    }
}

/// Every column of the table with its type, key column first.
#[must_use]
pub fn column_layout(names: &FieldNames) -> Vec<(&str, FieldType)> {
    vec![
        (names.project_name.as_str(), FieldType::Text),
        (names.description.as_str(), FieldType::Text),
        (names.stars.as_str(), FieldType::Number),
        (names.forks.as_str(), FieldType::Number),
        (names.language.as_str(), FieldType::SingleSelect),
        (names.link.as_str(), FieldType::Url),
        (names.author.as_str(), FieldType::Text),
        (names.tags.as_str(), FieldType::Text),
        (names.updated_time.as_str(), FieldType::DateTime),
        (names.read_flag.as_str(), FieldType::Checkbox),
        (names.follow_flag.as_str(), FieldType::Checkbox),
        (names.notes.as_str(), FieldType::Text),
    ]
}

/// Columns of a table after [`FeishuTable::ensure_fields`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnCheck {
    /// Every column the table now has.
    pub present: HashSet<String>,

    /// Columns added by the check.
    pub created: Vec<String>,
}

/// A table addressed by base and table id.
#[derive(Clone)]
pub struct FeishuTable {
    client: FeishuClient,
    base_id: String,
    table_id: String,
}

impl FeishuTable {
    pub(crate) fn new(client: FeishuClient, base_id: &str, table_id: &str) -> Self {
        Self {
            client,
            base_id: base_id.to_string(),
            table_id: table_id.to_string(),
        }
    }

    #[must_use]
    pub fn base_id(&self) -> &str {
        &self.base_id
    }

    #[must_use]
    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    /// Creates every column of [`column_layout`] the table lacks.
    ///
    /// A column that cannot be created is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError`] if the existing columns cannot be listed.
    pub async fn ensure_fields(&self, names: &FieldNames) -> Result<ColumnCheck, WorkspaceError> {
        let mut present: HashSet<String> = self
            .client
            .list_fields(&self.base_id, &self.table_id)
            .await?
            .into_iter()
            .map(|f| f.field_name)
            .collect();

        let mut created = Vec::new();
        for (name, kind) in column_layout(names) {
            if present.contains(name) {
                continue;
            }
            match self
                .client
                .create_field(&self.base_id, &self.table_id, name, kind)
                .await
            {
                Ok(()) => {
                    info!(field = name, kind = kind.code(), "Created column");
                    present.insert(name.to_string());
                    created.push(name.to_string());
                }
                Err(e) => warn!(field = name, error = %e, "Failed to create column"),
            }
        }

        if created.is_empty() {
            info!(columns = present.len(), "No columns created");
        }
        Ok(ColumnCheck { present, created })
    }

    fn records_path(&self, suffix: &str) -> String {
        format!(
            "bitable/v1/apps/{}/tables/{}/records{suffix}",
            self.base_id, self.table_id
        )
    }
}

impl Workspace for FeishuTable {
    async fn list_rows(&self, page_token: Option<&str>) -> Result<RowPage, WorkspaceError> {
        let url = self.client.endpoint(&self.records_path(""))?;
        let mut request = self.client.get(url).query(&[("page_size", LIST_PAGE_SIZE)]);
        if let Some(token) = page_token {
            request = request.query(&[("page_token", token)]);
        }

        let page: RecordPage = self.client.send_data(request).await?;
        Ok(RowPage {
            next_page_token: page.next_token(),
            records: page.items.unwrap_or_default(),
        })
    }

    async fn batch_create(&self, rows: &[FieldMap]) -> Result<(), WorkspaceError> {
        let url = self.client.endpoint(&self.records_path("/batch_create"))?;
        let body = BatchCreateBody {
            records: rows.iter().map(|fields| NewRecord { fields }).collect(),
        };
        self.client
            .send::<serde_json::Value>(self.client.post(url).json(&body))
            .await?;
        Ok(())
    }

    async fn batch_update(&self, rows: &[RecordUpdate]) -> Result<(), WorkspaceError> {
        let url = self.client.endpoint(&self.records_path("/batch_update"))?;
        self.client
            .send::<serde_json::Value>(self.client.post(url).json(&BatchUpdateBody { records: rows }))
            .await?;
        Ok(())
    }
}

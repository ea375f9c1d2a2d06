//! First-time provisioning of a base and its table.

use crate::config::FieldNames;
use crate::feishu::FeishuClient;
use crate::sync::WorkspaceError;
use tracing::info;

/// Default name of a newly created base.
pub const DEFAULT_APP_NAME: &str = "GitHub AI Skill 热门项目";

/// Name of the table created when a new base comes without one.
pub const DEFAULT_TABLE_NAME: &str = "热门项目";

/// Identifiers of a freshly provisioned table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapResult {
    pub base_id: String,
    pub table_id: String,

    /// Link to the base, when the API returns one.
    pub url: Option<String>,

    /// Columns added to the default table.
    pub created_fields: Vec<String>,
}

/// Creates a base named `app_name` and lays out its default table.
///
/// A base created without a table gets one named [`DEFAULT_TABLE_NAME`].
///
/// # Errors
///
/// Returns [`WorkspaceError`] if the base or its table cannot be created, or
/// its columns cannot be listed.
pub async fn bootstrap_table(
    client: &FeishuClient,
    names: &FieldNames,
    app_name: &str,
) -> Result<BootstrapResult, WorkspaceError> {
    let app = client.create_app(app_name).await?;
    info!(base_id = %app.app_token, name = app_name, "Created base");

    let table_id = match app.default_table_id.filter(|id| !id.is_empty()) {
        Some(id) => id,
        None => match client.list_tables(&app.app_token).await?.into_iter().next() {
            Some(table) => table.table_id,
            None => {
                let id = client
                    .create_table(&app.app_token, DEFAULT_TABLE_NAME, &names.project_name)
                    .await?;
                info!(table_id = %id, name = DEFAULT_TABLE_NAME, "Created table");
                id
            }
        },
    };

    let table = client.table(&app.app_token, &table_id);
    let columns = table.ensure_fields(names).await?;
    info!(table_id = %table_id, columns = columns.created.len(), "Provisioned table");

    Ok(BootstrapResult {
        base_id: app.app_token,
        table_id,
        url: app.url,
        created_fields: columns.created,
    })
}

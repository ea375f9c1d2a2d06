//! Feishu (Lark) Bitable client.
//!
//! Authenticates with an app id and secret, then talks to one base over
//! the Open API. Every response is an envelope with a numeric `code`;
//! failures are mapped onto [`WorkspaceError`] so the sync engine can tell
//! throttling and outages apart from rejected requests.

mod bootstrap;
mod models;
mod table;

pub use bootstrap::{bootstrap_table, BootstrapResult, DEFAULT_APP_NAME, DEFAULT_TABLE_NAME};
pub use models::{AppInfo, FieldInfo, TableInfo};
pub use table::{column_layout, ColumnCheck, FeishuTable, FieldType};

use crate::config::AppCredentials;
use crate::sync::WorkspaceError;
use models::{
    AppData, CreateAppBody, CreateFieldBody, CreateTableBody, CreatedTable, Envelope, NewTable, Page,
    TokenRequest, TokenResponse,
};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Generic frequency limit.
const RATE_LIMIT_CODE: i64 = 99991400;

/// Bitable `TooManyRequest`.
const BITABLE_TOO_MANY_REQUESTS: i64 = 1254290;

/// Bitable write conflict and data-not-ready codes; both clear up on retry.
const BITABLE_RETRY_CODES: [i64; 2] = [1254291, 1254607];

/// Rows per list request; the API maximum.
const LIST_PAGE_SIZE: &str = "500";

/// Longest response excerpt kept in an error message.
const ERROR_BODY_LIMIT: usize = 300;

/// An authenticated Open API client.
#[derive(Clone)]
pub struct FeishuClient {
    http: Client,
    api_base: Url,
    token: String,
}

impl FeishuClient {
    /// Obtains a tenant access token.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError`] if `api_base` is not a URL, the request
    /// fails, or the credentials are refused.
    pub async fn connect(credentials: &AppCredentials, api_base: &str) -> Result<Self, WorkspaceError> {
        let api_base = base_url(api_base)?;
        let http = Client::builder()
            .user_agent(concat!("agent-trending/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;

        let url = api_base.join("auth/v3/tenant_access_token/internal")?;
        let response = http
            .post(url)
            .json(&TokenRequest {
                app_id: credentials.app_id(),
                app_secret: credentials.app_secret(),
            })
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if let Some(e) = status_error(status, &body) {
            return Err(e);
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| WorkspaceError::Decode {
            message: format!("token response: {e}"),
        })?;
        check_code(token.code, &token.msg, status)?;
        let Some(token_value) = token.tenant_access_token.filter(|t| !t.is_empty()) else {
            return Err(WorkspaceError::Decode {
                message: "token response has no tenant_access_token".to_string(),
            });
        };

        info!(app_id = credentials.app_id(), expires_in = ?token.expire, "Authenticated with Feishu");
        Ok(Self {
            http,
            api_base,
            token: token_value,
        })
    }

    /// Returns a handle on one table.
    #[must_use]
    pub fn table(&self, base_id: &str, table_id: &str) -> FeishuTable {
        FeishuTable::new(self.clone(), base_id, table_id)
    }

    /// Lists every column of a table.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError`] if a page cannot be read.
    pub async fn list_fields(&self, base_id: &str, table_id: &str) -> Result<Vec<FieldInfo>, WorkspaceError> {
        let path = format!("bitable/v1/apps/{base_id}/tables/{table_id}/fields");
        self.list_all(&path).await
    }

    /// Adds a column.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError`] if the column is refused.
    pub async fn create_field(
        &self,
        base_id: &str,
        table_id: &str,
        name: &str,
        kind: FieldType,
    ) -> Result<(), WorkspaceError> {
        let url = self.endpoint(&format!("bitable/v1/apps/{base_id}/tables/{table_id}/fields"))?;
        let body = CreateFieldBody {
            field_name: name,
            kind: kind.code(),
        };
        self.send::<serde_json::Value>(self.http.post(url).json(&body)).await?;
        Ok(())
    }

    /// Creates a new base.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError`] if the base cannot be created.
    pub async fn create_app(&self, name: &str) -> Result<AppInfo, WorkspaceError> {
        let url = self.endpoint("bitable/v1/apps")?;
        let data: AppData = self
            .send_data(self.http.post(url).json(&CreateAppBody { name }))
            .await?;
        Ok(data.app)
    }

    /// Creates a table whose first column is `key_field`. Returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError`] if the table cannot be created.
    pub async fn create_table(
        &self,
        base_id: &str,
        name: &str,
        key_field: &str,
    ) -> Result<String, WorkspaceError> {
        let url = self.endpoint(&format!("bitable/v1/apps/{base_id}/tables"))?;
        let body = CreateTableBody {
            table: NewTable {
                name,
                fields: vec![CreateFieldBody {
                    field_name: key_field,
                    kind: FieldType::Text.code(),
                }],
            },
        };
        let data: CreatedTable = self.send_data(self.http.post(url).json(&body)).await?;
        Ok(data.table_id)
    }

    /// Lists the tables of a base.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError`] if a page cannot be read.
    pub async fn list_tables(&self, base_id: &str) -> Result<Vec<TableInfo>, WorkspaceError> {
        self.list_all(&format!("bitable/v1/apps/{base_id}/tables")).await
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, WorkspaceError> {
        Ok(self.api_base.join(path)?)
    }

    pub(crate) fn get(&self, url: Url) -> RequestBuilder {
        self.http.get(url)
    }

    pub(crate) fn post(&self, url: Url) -> RequestBuilder {
        self.http.post(url)
    }

    /// Sends an authorized request and unwraps the envelope.
    pub(crate) async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, WorkspaceError> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(WorkspaceError::from_send)?;
        let status = response.status();
        let body = response.text().await.map_err(|e| WorkspaceError::Unconfirmed {
            message: format!("HTTP {status}, body unreadable: {e}"),
        })?;
        debug!(status = status.as_u16(), bytes = body.len(), "Feishu response");
        decode_envelope(status, &body)
    }

    /// Like [`Self::send`], but `data` must be present.
    pub(crate) async fn send_data<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, WorkspaceError> {
        self.send(request).await?.ok_or_else(|| WorkspaceError::Decode {
            message: "response has no data".to_string(),
        })
    }

    async fn list_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, WorkspaceError> {
        let url = self.endpoint(path)?;
        let mut items = Vec::new();
        let mut token: Option<String> = None;
        let mut seen = HashSet::new();

        loop {
            let mut request = self.get(url.clone()).query(&[("page_size", "100")]);
            if let Some(t) = &token {
                request = request.query(&[("page_token", t.as_str())]);
            }
            let page: Page<T> = self.send_data(request).await?;
            let next = page.next_token();
            items.extend(page.items.unwrap_or_default());

            match next {
                Some(next) if seen.insert(next.clone()) => token = Some(next),
                Some(next) => {
                    warn!(path, page_token = %next, "Page token repeated, stopping");
                    break;
                }
                None => break,
            }
        }

        Ok(items)
    }
}

/// Parses an API base, making sure relative joins keep its path.
fn base_url(api_base: &str) -> Result<Url, WorkspaceError> {
    let mut base = api_base.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    Ok(Url::parse(&base)?)
}

/// Errors decided by the HTTP status alone.
fn status_error(status: StatusCode, body: &str) -> Option<WorkspaceError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Some(WorkspaceError::RateLimited {
            message: excerpt(body),
        });
    }
    None
}

/// Maps a non-zero envelope code onto a [`WorkspaceError`].
fn check_code(code: i64, msg: &str, status: StatusCode) -> Result<(), WorkspaceError> {
    match code {
        0 => Ok(()),
        RATE_LIMIT_CODE | BITABLE_TOO_MANY_REQUESTS => Err(WorkspaceError::RateLimited {
            message: msg.to_string(),
        }),
        c if BITABLE_RETRY_CODES.contains(&c) || status.is_server_error() => {
            Err(WorkspaceError::Transient {
                message: format!("code {c}: {msg}"),
            })
        }
        c => Err(WorkspaceError::Rejected {
            code: c,
            message: msg.to_string(),
        }),
    }
}

/// Decodes a response body into its `data`, mapping failures by status and code.
fn decode_envelope<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<Option<T>, WorkspaceError> {
    if let Some(e) = status_error(status, body) {
        return Err(e);
    }

    match serde_json::from_str::<Envelope<T>>(body) {
        Ok(envelope) => {
            check_code(envelope.code, &envelope.msg, status)?;
            Ok(envelope.data)
        }
        Err(_) if status.is_server_error() => Err(WorkspaceError::Transient {
            message: format!("HTTP {status}: {}", excerpt(body)),
        }),
        Err(_) if !status.is_success() => Err(WorkspaceError::Rejected {
            code: i64::from(status.as_u16()),
            message: excerpt(body),
        }),
        Err(e) => Err(WorkspaceError::Decode {
            message: e.to_string(),
        }),
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(ERROR_BODY_LIMIT).collect()
}

//! Request and response bodies of the Bitable Open API.

use crate::sync::{FieldMap, RecordUpdate, RemoteRecord};
use serde::{Deserialize, Serialize};

/// Common response wrapper: `{ "code": 0, "msg": "success", "data": ... }`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    pub data: Option<T>,
}

#[derive(Debug, Serialize)]
pub struct TokenRequest<'a> {
    pub app_id: &'a str,
    pub app_secret: &'a str,
}

/// The token endpoint returns its payload at the top level.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    pub tenant_access_token: Option<String>,
    pub expire: Option<u64>,
}

/// A page of any listable resource.
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub has_more: bool,
    pub page_token: Option<String>,
    pub items: Option<Vec<T>>,
}

impl<T> Page<T> {
    /// Token for the following page, if there is one.
    pub fn next_token(&self) -> Option<String> {
        if self.has_more {
            self.page_token.clone().filter(|t| !t.is_empty())
        } else {
            None
        }
    }
}

pub type RecordPage = Page<RemoteRecord>;

#[derive(Debug, Clone, Deserialize)]
pub struct FieldInfo {
    pub field_name: String,
    #[serde(rename = "type")]
    pub kind: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableInfo {
    pub table_id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AppData {
    pub app: AppInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppInfo {
    pub app_token: String,
    pub default_table_id: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateAppBody<'a> {
    pub name: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CreateFieldBody<'a> {
    pub field_name: &'a str,
    #[serde(rename = "type")]
    pub kind: u8,
}

/// `{ "table": { "name": ..., "fields": [...] } }`
#[derive(Debug, Serialize)]
pub struct CreateTableBody<'a> {
    pub table: NewTable<'a>,
}

#[derive(Debug, Serialize)]
pub struct NewTable<'a> {
    pub name: &'a str,
    pub fields: Vec<CreateFieldBody<'a>>,
}

#[derive(Debug, Deserialize)]
pub struct CreatedTable {
    pub table_id: String,
}

#[derive(Debug, Serialize)]
pub struct NewRecord<'a> {
    pub fields: &'a FieldMap,
}

#[derive(Debug, Serialize)]
pub struct BatchCreateBody<'a> {
    pub records: Vec<NewRecord<'a>>,
}

#[derive(Debug, Serialize)]
pub struct BatchUpdateBody<'a> {
    pub records: &'a [RecordUpdate],
}

//! Workspace credentials.

use crate::config::ConfigError;
use std::fmt;

pub const APP_ID_ENV: &str = "FEISHU_APP_ID";
pub const APP_SECRET_ENV: &str = "FEISHU_APP_SECRET";
pub const BASE_ID_ENV: &str = "FEISHU_BASE_ID";
pub const TABLE_ID_ENV: &str = "FEISHU_TABLE_ID";

/// Application identity used to obtain a tenant access token.
#[derive(Clone)]
pub struct AppCredentials {
    app_id: String,
    app_secret: String,
}

impl AppCredentials {
    /// Validates that both values are present and non-blank.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] naming every missing value.
    pub fn new(app_id: Option<String>, app_secret: Option<String>) -> Result<Self, ConfigError> {
        let mut missing = Vec::new();
        let app_id = require(app_id, APP_ID_ENV, &mut missing);
        let app_secret = require(app_secret, APP_SECRET_ENV, &mut missing);

        match (app_id, app_secret) {
            (Some(app_id), Some(app_secret)) => Ok(Self { app_id, app_secret }),
            _ => Err(ConfigError::MissingCredential { names: missing }),
        }
    }

    /// Uses each given value, falling back to `FEISHU_APP_ID` and
    /// `FEISHU_APP_SECRET`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] if either is unset or blank.
    pub fn with_env_fallback(
        app_id: Option<String>,
        app_secret: Option<String>,
    ) -> Result<Self, ConfigError> {
        Self::new(
            app_id.or_else(|| env_var(APP_ID_ENV)),
            app_secret.or_else(|| env_var(APP_SECRET_ENV)),
        )
    }

    /// Returns the application id.
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Returns the application secret.
    pub fn app_secret(&self) -> &str {
        &self.app_secret
    }
}

impl fmt::Debug for AppCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppCredentials")
            .field("app_id", &self.app_id)
            .field("app_secret", &"<redacted>")
            .finish()
    }
}

/// Everything needed to address one table: app identity plus base and table ids.
#[derive(Debug, Clone)]
pub struct WorkspaceCredentials {
    app: AppCredentials,
    base_id: String,
    table_id: String,
}

impl WorkspaceCredentials {
    /// Validates that all four values are present and non-blank.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] naming every missing value.
    pub fn new(
        app_id: Option<String>,
        app_secret: Option<String>,
        base_id: Option<String>,
        table_id: Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut missing = Vec::new();
        let app_id = require(app_id, APP_ID_ENV, &mut missing);
        let app_secret = require(app_secret, APP_SECRET_ENV, &mut missing);
        let base_id = require(base_id, BASE_ID_ENV, &mut missing);
        let table_id = require(table_id, TABLE_ID_ENV, &mut missing);

        match (app_id, app_secret, base_id, table_id) {
            (Some(app_id), Some(app_secret), Some(base_id), Some(table_id)) => Ok(Self {
                app: AppCredentials { app_id, app_secret },
                base_id,
                table_id,
            }),
            _ => Err(ConfigError::MissingCredential { names: missing }),
        }
    }

    /// Uses each given value, falling back to its `FEISHU_*` variable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] if any is unset or blank.
    pub fn with_env_fallback(
        app_id: Option<String>,
        app_secret: Option<String>,
        base_id: Option<String>,
        table_id: Option<String>,
    ) -> Result<Self, ConfigError> {
        Self::new(
            app_id.or_else(|| env_var(APP_ID_ENV)),
            app_secret.or_else(|| env_var(APP_SECRET_ENV)),
            base_id.or_else(|| env_var(BASE_ID_ENV)),
            table_id.or_else(|| env_var(TABLE_ID_ENV)),
        )
    }

    /// Returns the application identity.
    pub fn app(&self) -> &AppCredentials {
        &self.app
    }

    /// Returns the base (app token) identifier.
    pub fn base_id(&self) -> &str {
        &self.base_id
    }

    /// Returns the table identifier.
    pub fn table_id(&self) -> &str {
        &self.table_id
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn require(
    value: Option<String>,
    name: &'static str,
    missing: &mut Vec<&'static str>,
) -> Option<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Some(v),
        _ => {
            missing.push(name);
            None
        }
    }
}

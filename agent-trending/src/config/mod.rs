//! Run settings and credential loading.
//!
//! Settings come from an optional TOML file where every key has a default.
//! Credentials come from the environment and are validated up front, so a
//! missing identifier stops the run before any network call.

mod credentials;
mod error;
mod settings;

pub use credentials::{
    AppCredentials, WorkspaceCredentials, APP_ID_ENV, APP_SECRET_ENV, BASE_ID_ENV, TABLE_ID_ENV,
};
pub use error::ConfigError;
pub use settings::{
    FieldNames, SyncSettings, TrendingConfig, DEFAULT_API_BASE, DEFAULT_QUERIES, DEFAULT_TOPICS,
};

use std::path::Path;
use tracing::{debug, info};

/// Loads settings from `path`, or returns the defaults when no path is given.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file is missing, unreadable, not valid
/// TOML, or fails validation.
pub fn load_config(path: Option<&Path>) -> Result<TrendingConfig, ConfigError> {
    let Some(path) = path else {
        debug!("No settings file given, using defaults");
        let config = TrendingConfig::default();
        config.validate(Path::new("<defaults>"))?;
        return Ok(config);
    };

    info!(path = %path.display(), "Loading settings");

    if !path.exists() {
        return Err(ConfigError::MissingFile {
            path: path.display().to_string(),
        });
    }

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.display().to_string(),
        source: e,
    })?;

    TrendingConfig::parse(&contents, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn can_load_defaults_without_file() {
        let config = load_config(None).unwrap();
        assert_eq!(config.limit, 100);
        assert!(!config.queries.is_empty());
    }

    #[test]
    fn can_load_settings_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("trending.toml");
        fs::write(
            &path,
            r#"
queries = ["ai-agent"]
topics = []
limit = 10
"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.queries, vec!["ai-agent".to_string()]);
        assert!(config.topics.is_empty());
        assert_eq!(config.limit, 10);
        assert_eq!(config.per_query_limit, 20);
    }

    #[test]
    fn load_config_missing_file() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.toml");

        let result = load_config(Some(&missing));
        assert!(matches!(result, Err(ConfigError::MissingFile { .. })));
    }
}

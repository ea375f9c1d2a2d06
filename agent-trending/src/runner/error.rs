//! Runner error types.

/// Errors that stop a run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Settings or credential errors.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// Dataset could not be read or written.
    #[error(transparent)]
    Dataset(#[from] crate::dataset::DatasetError),

    /// Site could not be rendered.
    #[error(transparent)]
    Render(#[from] crate::render::RenderError),

    /// Table snapshot could not be read.
    #[error(transparent)]
    Sync(#[from] crate::sync::SyncError),

    /// Table client could not be set up.
    #[error(transparent)]
    Workspace(#[from] crate::sync::WorkspaceError),

    /// GitHub API client initialization errors.
    #[error(transparent)]
    Octocrab(#[from] octocrab::Error),
}

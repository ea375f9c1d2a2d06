//! Site rendering error types.

/// Site rendering error.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Handlebars rendering error.
    #[error("Template rendering error: {0}")]
    Render(#[from] handlebars::RenderError),

    /// Template registration error.
    #[error("Template registration error: {0}")]
    Template(#[from] handlebars::TemplateError),

    /// Output could not be written.
    #[error("Failed to write site to {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

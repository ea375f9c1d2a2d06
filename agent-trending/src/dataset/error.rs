//! Dataset persistence error types.

/// Error reading or writing the dataset artifact.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// File could not be read or written.
    #[error("Failed to access dataset {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// File is not a valid dataset document.
    #[error("Invalid dataset JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Document parsed but violates dataset invariants.
    #[error("Invalid dataset {path}: {message}")]
    Validation { path: String, message: String },
}

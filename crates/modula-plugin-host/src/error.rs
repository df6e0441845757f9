use thiserror::Error;

/// Failure to probe one scan candidate. Scoped to a single file or URI; the
/// scanner records it and moves on.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// Backend-specific failure to construct a plugin instance. The diagnostic
/// string travels verbatim to the caller.
#[derive(Debug, Error)]
pub enum InstantiateError {
    #[error("{0}")]
    Failed(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl InstantiateError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

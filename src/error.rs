use std::path::PathBuf;

/// Every failure the simulator can report. Nothing is clamped or coerced:
/// invalid input surfaces here instead of silently skewing the statistics.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("invalid quest #{index} ({name:?}): {reason}")]
    InvalidQuest { index: usize, name: String, reason: String },

    #[error("invalid config value for {field}: {message}")]
    InvalidConfig { field: &'static str, message: String },

    #[error("statistics requested over an empty result")]
    EmptyResult,

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl SimError {
    pub(crate) fn config(field: &'static str, message: impl Into<String>) -> Self {
        SimError::InvalidConfig { field, message: message.into() }
    }
}

use thiserror::Error;

/// Failure classes of the birth-share pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Network failure or non-2xx HTTP status.
    #[error("transport error: {0}")]
    Transport(String),

    /// Empty, malformed or otherwise unusable indicator data.
    #[error("data error: {0}")]
    Data(String),

    /// At least one indicator could not be fetched, so there is nothing to join.
    #[error("cannot join indicators: {}", .failures.join("; "))]
    UpstreamFetch { failures: Vec<String> },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("render error: {0}")]
    Render(String),

    #[error("export error: {0}")]
    Export(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

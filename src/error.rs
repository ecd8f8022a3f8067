use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsoleError {
    /// The request never produced an HTTP response (DNS, connect, timeout, TLS).
    #[error("network error: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("server error ({status}){}: {message}", .code.as_deref().map(|c| format!(" [{c}]")).unwrap_or_default())]
    Remote {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl ConsoleError {
    /// True for failures that came from the list endpoint rather than local setup.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            ConsoleError::Transport(_) | ConsoleError::Remote { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ConsoleError>;

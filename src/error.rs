use thiserror::Error;

#[derive(Error, Debug)]
pub enum InboxError {
    #[error("fetch failed for batch {batch}: {message}")]
    Fetch { batch: String, message: String },

    #[error("subscription to '{channel}' failed: {message}")]
    Subscription { channel: String, message: String },

    #[error("invalid status '{0}'")]
    InvalidStatus(String),

    #[error("invalid priority '{0}'")]
    InvalidPriority(String),

    #[error("invalid sort field '{0}'")]
    InvalidSortField(String),

    #[error("invalid view mode '{0}'")]
    InvalidViewMode(String),

    #[error("unknown push event '{0}'")]
    InvalidEventKind(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("clipboard error: {0}")]
    Clipboard(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl InboxError {
    pub fn fetch(batch: impl ToString, message: impl Into<String>) -> Self {
        InboxError::Fetch {
            batch: batch.to_string(),
            message: message.into(),
        }
    }

    pub fn subscription(channel: impl Into<String>, message: impl Into<String>) -> Self {
        InboxError::Subscription {
            channel: channel.into(),
            message: message.into(),
        }
    }

    /// Whether the error belongs to a single fetch batch (and so only taints its rows).
    pub fn is_batch_scoped(&self) -> bool {
        matches!(self, InboxError::Fetch { .. })
    }
}

pub type Result<T> = std::result::Result<T, InboxError>;

use thiserror::Error;

/// Top-level error type for wagate.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Input could not be turned into a recipient address.
    #[error("invalid phone number: {0}")]
    InvalidNumber(String),

    /// The recipient has no account on the messaging network.
    #[error("number is not registered: {0}")]
    NotRegistered(String),

    /// No group chat matched the requested name.
    #[error("no group found with the name: {0}")]
    GroupNotFound(String),

    /// Error from the messaging client (send, query, lifecycle).
    #[error("client error: {0}")]
    Client(String),

    /// Remote media fetch failed.
    #[error("media error: {0}")]
    Media(String),

    /// Keyword store error.
    #[error("store error: {0}")]
    Store(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GatewayError {
    /// Stable machine-readable kind, sent to HTTP callers next to the message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidNumber(_) => "invalid_number",
            Self::NotRegistered(_) => "not_registered",
            Self::GroupNotFound(_) => "group_not_found",
            Self::Client(_) => "client",
            Self::Media(_) => "media",
            Self::Store(_) => "store",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
        }
    }

    /// Whether the caller can fix this by changing the request.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::InvalidNumber(_) | Self::NotRegistered(_) | Self::GroupNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_is_stable() {
        assert_eq!(GatewayError::NotRegistered("x".into()).kind(), "not_registered");
        assert_eq!(GatewayError::GroupNotFound("x".into()).kind(), "group_not_found");
        assert_eq!(GatewayError::Client("x".into()).kind(), "client");
    }

    #[test]
    fn test_precondition_split() {
        assert!(GatewayError::InvalidNumber("abc".into()).is_precondition());
        assert!(GatewayError::GroupNotFound("Team".into()).is_precondition());
        assert!(!GatewayError::Media("timeout".into()).is_precondition());
        assert!(!GatewayError::Client("boom".into()).is_precondition());
    }

    #[test]
    fn test_group_not_found_mentions_name() {
        let err = GatewayError::GroupNotFound("Family".into());
        assert!(err.to_string().contains("Family"));
    }
}

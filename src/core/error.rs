use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrainError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl BrainError {
    /// Short stable tag used in interaction log entries
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::Transport(_) => "transport",
            Self::UnknownOperation(_) => "unknown_operation",
            Self::Storage(_) => "storage",
            Self::Io(_) => "io",
            Self::Serde(_) => "serde",
            Self::Config(_) => "config",
        }
    }

    /// `kind: message` rendering for the interaction log
    pub fn to_log_string(&self) -> String {
        format!("{}: {}", self.kind(), self)
    }
}

pub type Result<T> = std::result::Result<T, BrainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        assert_eq!(BrainError::Validation("x".into()).kind(), "validation");
        assert_eq!(BrainError::NotFound("x".into()).kind(), "not_found");
        assert_eq!(
            BrainError::UnknownOperation("x".into()).kind(),
            "unknown_operation"
        );
    }

    #[test]
    fn test_log_string() {
        let err = BrainError::NotFound("node n1".into());
        assert_eq!(err.to_log_string(), "not_found: Not found: node n1");
    }
}

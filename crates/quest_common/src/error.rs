//! Error types for the questline core.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuestError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl QuestError {
    /// Short label used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            QuestError::NotFound(_) => "not_found",
            QuestError::Config(_) => "config",
            QuestError::Io(_) => "io",
            QuestError::Json(_) => "json",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, QuestError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, QuestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err: QuestError = io.into();
        assert_eq!(err.kind(), "io");
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_not_found_display() {
        let err = QuestError::NotFound("no transcripts in /tmp/x".to_string());
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Not found: no transcripts in /tmp/x");
    }
}

use thiserror::Error;

/// Error taxonomy shared by the parser, the predictor client and the analyzer.
///
/// Only [`AdvisorError::EmptyQuery`] and [`AdvisorError::Syntax`] ever reach the
/// caller of [`crate::QueryAnalyzer::analyze`]. [`AdvisorError::PredictorUnavailable`]
/// is produced by the remote predictor and recovered into the heuristic
/// estimate before the analysis completes.
#[derive(Debug, Error)]
pub enum AdvisorError {
    /// The request carried no SQL text (empty or whitespace only).
    #[error("Query must not be empty")]
    EmptyQuery,

    /// The SQL text was rejected by the parser.
    ///
    /// The payload is the parser's own message.
    #[error("Invalid SQL: {0}")]
    Syntax(String),

    /// The remote prediction service could not produce a usable answer.
    ///
    /// Examples:
    /// - connection refused or request timed out
    /// - non-2xx status
    /// - missing, malformed or out-of-range response field
    #[error("prediction service unavailable: {0}")]
    PredictorUnavailable(String),

    /// Invalid environment or command-line configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Filesystem failures while reading queries or writing DDL scripts.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AdvisorError {
    /// True for failures caused by the submitted query itself.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AdvisorError::EmptyQuery | AdvisorError::Syntax(_))
    }
}

/// Standard result alias.
pub type Result<T> = std::result::Result<T, AdvisorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(AdvisorError::EmptyQuery.is_client_error());
        assert!(AdvisorError::Syntax("unexpected token".to_string()).is_client_error());
        assert!(!AdvisorError::PredictorUnavailable("timeout".to_string()).is_client_error());
        assert!(!AdvisorError::InvalidConfig("dialect".to_string()).is_client_error());
    }

    #[test]
    fn test_messages() {
        assert_eq!(AdvisorError::EmptyQuery.to_string(), "Query must not be empty");
        assert_eq!(
            AdvisorError::Syntax("Expected: an SQL statement".to_string()).to_string(),
            "Invalid SQL: Expected: an SQL statement"
        );
    }
}

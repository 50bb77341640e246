use thiserror::Error;

#[derive(Error, Debug)]
pub enum RouterError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Routing key is not declared for call '{0}' and no default routing key is configured")]
    MissingRoutingKey(String),

    #[error("Routing attribute '{0}' not found in call arguments")]
    AttributeNotFound(String),

    #[error("Statement rewrite error: {0}")]
    Rewrite(String),

    #[error("Data source '{0}' is not registered")]
    UnknownDataSource(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl RouterError {
    /// Whether the caller may still proceed with a fallback decision.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::AttributeNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, RouterError>;

impl From<serde_json::Error> for RouterError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("invalid settings document: {}", err))
    }
}

impl From<std::io::Error> for RouterError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_extraction_failures_are_recoverable() {
        assert!(RouterError::AttributeNotFound("userId".into()).is_recoverable());
        assert!(!RouterError::Rewrite("no table".into()).is_recoverable());
        assert!(!RouterError::MissingRoutingKey("dao.insert".into()).is_recoverable());
        assert!(!RouterError::Config("bad".into()).is_recoverable());
    }

    #[test]
    fn test_error_messages() {
        let err = RouterError::UnknownDataSource("db09".into());
        assert_eq!(err.to_string(), "Data source 'db09' is not registered");

        let err = RouterError::AttributeNotFound("userId".into());
        assert!(err.to_string().contains("userId"));
    }
}

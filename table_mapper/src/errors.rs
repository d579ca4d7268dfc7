use crate::validation::ValidationError;
use thiserror::Error;

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum MapperError {
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("Unsupported entity type: {0}")]
    UnsupportedEntityType(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(#[from] ValidationError),

    #[error("Execution error on table '{table}' during {operation}: {source}")]
    Execution {
        table: String,
        operation: String,
        #[source]
        source: BoxedError,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl MapperError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Wrap a failure raised while running a statement against `table`
    pub fn execution(
        table: impl Into<String>,
        operation: impl Into<String>,
        source: impl Into<BoxedError>,
    ) -> Self {
        Self::Execution {
            table: table.into(),
            operation: operation.into(),
            source: source.into(),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::InvalidConfiguration { .. })
    }
}

impl From<serde_json::Error> for MapperError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

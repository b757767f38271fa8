use thiserror::Error;

/// Result alias for engine operations
pub type CausalResult<T> = std::result::Result<T, CausalError>;

/// Errors surfaced by the analysis engine
#[derive(Debug, Error)]
pub enum CausalError {
    /// Target, trigger or file is absent from the analysed batch
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    /// Request is missing required fields or carries invalid values
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A source file could not be parsed
    #[error("Parse error in {file}: {message}")]
    Parse { file: String, message: String },

    /// Cache backend failure
    #[error("Cache error: {0}")]
    Cache(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CausalError {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        CausalError::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        CausalError::InvalidInput(message.into())
    }

    /// HTTP status a route handler should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            CausalError::NotFound { .. } => 404,
            CausalError::InvalidInput(_) => 400,
            CausalError::Parse { .. } | CausalError::Cache(_) | CausalError::Io(_) => 500,
        }
    }
}

impl From<sled::Error> for CausalError {
    fn from(err: sled::Error) -> Self {
        CausalError::Cache(err.to_string())
    }
}

impl From<bincode::Error> for CausalError {
    fn from(err: bincode::Error) -> Self {
        CausalError::Cache(err.to_string())
    }
}

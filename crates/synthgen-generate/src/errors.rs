use thiserror::Error;

/// Errors emitted by the generation engine.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("template parse error: {0}")]
    TemplateParse(#[source] serde_json::Error),
    #[error("invalid template: {0}")]
    InvalidTemplate(String),
    #[error("{function}: {message}")]
    InvalidArgument { function: String, message: String },
    #[error("unknown time zone: {0}")]
    UnknownTimeZone(String),
    #[error("invalid date-time pattern: {0}")]
    InvalidPattern(String),
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl GenerationError {
    pub(crate) fn argument(function: &str, message: impl Into<String>) -> Self {
        GenerationError::InvalidArgument {
            function: function.to_string(),
            message: message.into(),
        }
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Entity not found: {entity}")]
    NotFound { entity: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Guide number {submitted} does not match next guide {next}")]
    StaleGuideNumber { submitted: u64, next: u64 },

    #[error("Partial write: {written} of {total} rows appended: {source}")]
    PartialWrite {
        written: usize,
        total: usize,
        source: Box<Error>,
    },

    #[error("Store error: {message}")]
    Store { message: String },

    #[error("Auth error: {message}")]
    Auth { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }
}

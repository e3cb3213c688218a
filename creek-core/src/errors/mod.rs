pub mod classify_error;
pub mod config_error;
pub mod detect_error;
pub mod link_error;
pub mod redact_error;

pub use classify_error::ClassifyError;
pub use config_error::ConfigError;
pub use detect_error::DetectError;
pub use link_error::LinkError;
pub use redact_error::RedactError;

/// Top-level error for the Creek pipeline. Subsystem errors convert in via
/// `#[from]`, so crates can return `CreekResult` and use `?` throughout.
#[derive(Debug, thiserror::Error)]
pub enum CreekError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Redact(#[from] RedactError),

    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Detect(#[from] DetectError),

    #[error("integrity violation: {message}")]
    Integrity { message: String },

    #[error("a batch run is already in progress")]
    Busy,

    #[error("batch cancelled")]
    Cancelled,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CreekResult<T> = Result<T, CreekError>;

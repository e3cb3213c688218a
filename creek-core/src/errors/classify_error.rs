/// Classifier and router errors. Secondary-pass failures are recoverable:
/// the router degrades to the rule vector and queues the fragment for
/// review rather than propagating these as fatal.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("unknown dimension '{name}'")]
    UnknownDimension { name: String },

    #[error("secondary classifier unavailable: {reason}")]
    SecondaryUnavailable { reason: String },

    #[error("secondary classifier timed out after {elapsed_ms}ms")]
    SecondaryTimeout { elapsed_ms: u64 },

    #[error("secondary classifier failed: {message}")]
    SecondaryFailed { message: String },
}

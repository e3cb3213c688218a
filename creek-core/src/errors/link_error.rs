/// Linking engine errors.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("a linking pass is already running")]
    AlreadyRunning,

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("fragment '{fragment_id}' has no embedding")]
    MissingEmbedding { fragment_id: String },

    #[error("linking state poisoned by a panicked writer")]
    StatePoisoned,
}

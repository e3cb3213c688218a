/// Scanner-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum RedactError {
    #[error("audit log export failed: {message}")]
    ExportFailed { message: String },

    #[error("audit log poisoned by a writer panic")]
    LogPoisoned,
}

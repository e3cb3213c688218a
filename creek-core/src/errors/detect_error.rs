/// Pattern detector errors.
#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    #[error("edge references unknown fragment '{fragment_id}'")]
    UnknownFragment { fragment_id: String },

    #[error("no thread with id '{thread_id}'")]
    UnknownThread { thread_id: String },
}

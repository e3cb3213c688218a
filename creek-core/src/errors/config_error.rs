/// Configuration errors. All of these are fatal at load time, before any
/// record is processed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file '{path}': {message}")]
    Io { path: String, message: String },

    #[error("cannot parse config: {message}")]
    Parse { message: String },

    #[error("custom pattern '{name}' does not compile: {message}")]
    InvalidPattern { name: String, message: String },

    #[error("threshold '{name}' out of range: {value}")]
    InvalidThreshold { name: String, value: f64 },

    #[error("invalid taxonomy: {message}")]
    InvalidTaxonomy { message: String },

    #[error("invalid value for '{name}': {message}")]
    InvalidValue { name: String, message: String },
}

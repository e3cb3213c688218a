/// Creek pipeline version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Hex digits of the blake3 hash kept in a fragment identifier.
pub const FRAGMENT_ID_HEX_LEN: usize = 16;

/// Hex digits of the blake3 hash kept in edge / record identifiers.
pub const RECORD_ID_HEX_LEN: usize = 12;

/// Byte length of the per-process audit salt.
pub const AUDIT_SALT_LEN: usize = 16;

/// Maximum number of source records accepted in a single batch.
pub const MAX_BATCH_SIZE: usize = 10_000;

/// Prefix every redaction placeholder starts with.
pub const REDACTION_PREFIX: &str = "[REDACTED:";

/// Suffix every redaction placeholder ends with.
pub const REDACTION_SUFFIX: &str = "]";

use serde::{Deserialize, Serialize};

/// A user-supplied pattern appended after the builtin rules. Compiled by
/// the scanner during construction; a pattern that does not compile is a
/// fatal `ConfigError::InvalidPattern`, raised before any record is
/// processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomPattern {
    pub name: String,
    pub pattern: String,
}

/// Scanner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactionConfig {
    /// Names of builtin rules to skip.
    pub disabled_rules: Vec<String>,
    /// Extra patterns, lower priority than every builtin.
    pub custom_patterns: Vec<CustomPattern>,
    /// Exact strings that are never treated as matches. For known false
    /// positives; anything not listed here is always redacted and audited.
    pub allowlist: Vec<String>,
    /// Report and audit matches but leave text untouched.
    pub dry_run: bool,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            disabled_rules: Vec::new(),
            custom_patterns: Vec::new(),
            allowlist: Vec::new(),
            dry_run: false,
        }
    }
}

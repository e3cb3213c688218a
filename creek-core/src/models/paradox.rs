use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::RECORD_ID_HEX_LEN;
use crate::fragment::Confidence;

/// Raised by the router when the rule pass and the secondary pass disagree
/// strongly on one dimension of one fragment. Input to paradox detection,
/// never resolved in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContradictionMark {
    pub fragment_id: String,
    pub dimension: String,
    pub rule_label: String,
    pub rule_confidence: Confidence,
    pub secondary_label: String,
    pub secondary_confidence: Confidence,
}

/// One side of a paradox: a fragment asserting a label with some confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParadoxSide {
    pub fragment_id: String,
    pub label: String,
    pub confidence: Confidence,
}

/// A held contradiction: the same entity asserting incompatible labels on
/// the same dimension. Terminal output; nothing downstream feeds this back
/// into classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParadoxRecord {
    pub id: String,
    pub dimension: String,
    /// Who holds both sides. "self" for the archive owner's own writing.
    pub entity: String,
    pub first: ParadoxSide,
    pub second: ParadoxSide,
    pub noted_at: DateTime<Utc>,
}

impl ParadoxRecord {
    pub fn new(
        dimension: impl Into<String>,
        entity: impl Into<String>,
        first: ParadoxSide,
        second: ParadoxSide,
        noted_at: DateTime<Utc>,
    ) -> Self {
        let dimension = dimension.into();
        // Canonical side order keeps the id stable whichever way the pair
        // was discovered.
        let (first, second) = if (first.fragment_id.as_str(), first.label.as_str())
            <= (second.fragment_id.as_str(), second.label.as_str())
        {
            (first, second)
        } else {
            (second, first)
        };
        let mut hasher = blake3::Hasher::new();
        hasher.update(dimension.as_bytes());
        hasher.update(&[0x1f]);
        hasher.update(first.fragment_id.as_bytes());
        hasher.update(&[0x1f]);
        hasher.update(first.label.as_bytes());
        hasher.update(&[0x1f]);
        hasher.update(second.fragment_id.as_bytes());
        hasher.update(&[0x1f]);
        hasher.update(second.label.as_bytes());
        let hex = hasher.finalize().to_hex();
        Self {
            id: format!("pdx-{}", &hex[..RECORD_ID_HEX_LEN]),
            dimension,
            entity: entity.into(),
            first,
            second,
            noted_at,
        }
    }
}

impl PartialEq for ParadoxRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

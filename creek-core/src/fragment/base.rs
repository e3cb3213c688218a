use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::classification::ClassificationVector;
use crate::constants::FRAGMENT_ID_HEX_LEN;

/// Where a record was captured. Parsers upstream of the pipeline tag every
/// record with one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourcePlatform {
    Claude,
    Chatgpt,
    Discord,
    Journal,
    Essay,
    Code,
    Email,
    ImageOcr,
    Other,
}

impl SourcePlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Chatgpt => "chatgpt",
            Self::Discord => "discord",
            Self::Journal => "journal",
            Self::Essay => "essay",
            Self::Code => "code",
            Self::Email => "email",
            Self::ImageOcr => "image_ocr",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for SourcePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the parser layer hands to the pipeline: one unit of raw writing with
/// its provenance. This is the only type that ever holds raw text; it is
/// consumed by the scanner and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRecord {
    pub platform: SourcePlatform,
    /// Path or URI of the file this record came from.
    pub origin_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Conversation partner, when the platform has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interlocutor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_encoding: Option<String>,
    /// Original timestamp with the source's UTC offset.
    pub created_at: DateTime<FixedOffset>,
    pub title: String,
    pub raw_text: String,
}

/// Provenance carried on every fragment. A copy of the record's origin
/// metadata, minus the raw text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub platform: SourcePlatform,
    pub origin_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interlocutor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_encoding: Option<String>,
    /// UTC offset of the original timestamp, minutes east of UTC.
    pub utc_offset_minutes: i32,
}

impl Provenance {
    pub fn from_record(record: &SourceRecord) -> Self {
        Self {
            platform: record.platform,
            origin_path: record.origin_path.clone(),
            conversation_id: record.conversation_id.clone(),
            channel: record.channel.clone(),
            interlocutor: record.interlocutor.clone(),
            original_encoding: record.original_encoding.clone(),
            utc_offset_minutes: record.created_at.offset().local_minus_utc() / 60,
        }
    }

    /// The entity a fragment's words are attributed to. Archive content is
    /// the owner's own writing unless an interlocutor is credited.
    pub fn entity(&self) -> String {
        self.interlocutor
            .clone()
            .unwrap_or_else(|| "self".to_string())
    }
}

/// The persisted unit of the archive. A fragment never holds raw text: the
/// `text` field is post-redaction, and the only trace of the original is the
/// salted `raw_hash` used for duplicate detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fragment {
    /// Deterministic identifier, `frag-<16 hex>` of the blake3 over
    /// platform, origin path, UTC timestamp, and raw content.
    pub id: String,
    pub title: String,
    pub source: Provenance,
    /// Original creation time, normalized to UTC.
    pub created_at: DateTime<Utc>,
    /// When the pipeline ingested this fragment.
    pub ingested_at: DateTime<Utc>,
    /// Redacted text. The scanner is the only writer.
    pub text: String,
    /// Salted blake3 of the raw text. Duplicate detection only.
    pub raw_hash: String,
    /// One reading per taxonomy dimension.
    pub classification: ClassificationVector,
    /// Embedding of the redacted text, once the embed stage has run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// Identifiers of resonance edges touching this fragment. Ids only,
    /// never references; the edge list owns the link records.
    #[serde(default)]
    pub links: Vec<String>,
    /// Number of spans the scanner replaced.
    pub redaction_count: usize,
}

impl Fragment {
    /// Compute the deterministic fragment identifier. The same platform,
    /// origin, timestamp, and content always derive the same id, so
    /// re-ingesting a source is a no-op at the identity level.
    pub fn compute_id(
        platform: SourcePlatform,
        origin_path: &str,
        created_at: DateTime<Utc>,
        raw_text: &str,
    ) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(platform.as_str().as_bytes());
        hasher.update(&[0x1f]);
        hasher.update(origin_path.as_bytes());
        hasher.update(&[0x1f]);
        hasher.update(created_at.to_rfc3339().as_bytes());
        hasher.update(&[0x1f]);
        hasher.update(raw_text.as_bytes());
        let hex = hasher.finalize().to_hex();
        format!("frag-{}", &hex[..FRAGMENT_ID_HEX_LEN])
    }

    /// Salted hash of raw content. The salt keeps the hash useless for
    /// offline dictionary probing; the hash keeps duplicates detectable.
    pub fn compute_raw_hash(salt: &[u8], raw_text: &str) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(salt);
        hasher.update(raw_text.as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}

/// Identity equality: two fragments are equal if they have the same id.
/// Content comparison goes through `raw_hash`.
impl PartialEq for Fragment {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

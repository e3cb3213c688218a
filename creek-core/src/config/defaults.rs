//! Default values for all tunables. Config structs reference these in their
//! `Default` impls so a missing file or section behaves identically to an
//! explicit default.

// Router
pub const DEFAULT_ACCEPT_THRESHOLD: f64 = 0.7;
pub const DEFAULT_CONFIDENCE_SATURATION: f64 = 0.12;
pub const DEFAULT_DUAL_MARGIN: f64 = 0.25;
pub const DEFAULT_CONTRADICTION_FLOOR: f64 = 0.75;
pub const DEFAULT_SECONDARY_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_SECONDARY_MAX_IN_FLIGHT: usize = 4;

// Embeddings
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 384;
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3_600;

// Linking
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.75;
pub const DEFAULT_EXACT_SEARCH_LIMIT: usize = 512;
pub const DEFAULT_ANN_MAX_CONNECTIONS: usize = 16;
pub const DEFAULT_ANN_EF_CONSTRUCTION: usize = 200;
pub const DEFAULT_ANN_EF_SEARCH: usize = 64;
pub const DEFAULT_ANN_CANDIDATES: usize = 32;
pub const DEFAULT_TEMPORAL_WINDOW_HOURS: i64 = 168;

// Detection
pub const DEFAULT_THREAD_MIN_FRAGMENTS: usize = 3;
pub const DEFAULT_THREAD_WINDOW_HOURS: i64 = 168;
pub const DEFAULT_EDDY_MIN_FRAGMENTS: usize = 5;
pub const DEFAULT_SYNCHRONICITY_THRESHOLD: f64 = 0.9;
pub const DEFAULT_SYNCHRONICITY_MIN_GAP_DAYS: i64 = 30;
pub const DEFAULT_PARADOX_FLOOR: f64 = 0.75;

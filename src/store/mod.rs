//! §4.4: the indexed hash-to-postings mapping and its ingestion/query
//! contract. The store makes no judgment about matching — it is a pure
//! posting list over hashes, consumed by the matcher through the narrow
//! `FingerprintStore` trait so the matcher never depends on the backing
//! implementation (§9).

pub mod memory;
pub mod models;
pub mod pg;
pub mod schema;

use crate::error::Result;
use crate::types::{Fingerprint, Recording, RecordingMetadata, Stats};

pub use memory::InMemoryStore;
pub use pg::PgStore;

/// §4.4: ingestion batch size — writes must chunk at `B_INS`, never hold
/// the whole fingerprint list in a single transaction.
pub const BATCH_INSERT_SIZE: usize = 1_000;
/// §4.4: lookup chunk size — the probe hash set is chunked at `B_LOOK` and
/// results concatenated.
pub const BATCH_LOOKUP_SIZE: usize = 100;

/// §4.4 `lookup` result: a single stored hit for one probe hash.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Posting {
    pub recording_id: i32,
    pub stored_time_offset: f64,
    pub hash: u32,
}

/// One recorded identification attempt, for the `queries` analytics table
/// (§6). Analytics writes must never fail the caller's operation (§7).
#[derive(Debug, Clone)]
pub struct QueryRecord {
    pub audio_duration: Option<f64>,
    pub identified_recording_id: Option<i32>,
    pub confidence: Option<f64>,
    pub processing_time_ms: u64,
}

/// The store's whole contract: insert, lookup, and the admin operations
/// §6 lists. Implementations serialize writes for one recording but allow
/// concurrent reads and concurrent writes across disjoint recordings (§5).
pub trait FingerprintStore: Send + Sync {
    /// §4.4: idempotent on `(recording_id, hash, time_offset)`; duplicates
    /// are tolerated, never fail the batch. Chunks internally at
    /// `BATCH_INSERT_SIZE`.
    fn ingest(&self, recording: &Recording, fingerprints: &[Fingerprint]) -> Result<()>;

    /// §4.4: given a multiset of probe hashes, return every stored
    /// fingerprint whose hash is in that set (duplicates across postings
    /// are real — multiple recordings or multiple offsets can share a
    /// hash). Chunks internally at `BATCH_LOOKUP_SIZE`.
    fn lookup(&self, hashes: &[u32]) -> Result<Vec<Posting>>;

    /// Create the `recordings` row and return its assigned id. Does not
    /// touch `fingerprints` — callers call `ingest` separately once a
    /// `Recording` with this id exists.
    fn create_recording(&self, metadata: &RecordingMetadata) -> Result<Recording>;

    /// §6 `delete`: cascades all fingerprints for `recording_id`. Also the
    /// rollback primitive a failed ingest uses to leave no trace (§4.6,
    /// §5 cancellation).
    fn delete(&self, recording_id: i32) -> Result<()>;

    fn get_recording(&self, recording_id: i32) -> Result<Option<Recording>>;

    /// Record one identification attempt for the `queries` analytics
    /// table. Failures here must be logged and swallowed by the caller,
    /// never surfaced (§7) — this method still returns `Result` so the
    /// caller can decide how to log it, but must not propagate it upward.
    fn record_query(&self, record: &QueryRecord) -> Result<()>;

    fn stats(&self) -> Result<Stats>;
}

#[cfg(test)]
pub(crate) fn sample_metadata(title: &str) -> RecordingMetadata {
    RecordingMetadata {
        title: title.to_string(),
        artist: "Test Artist".to_string(),
        album: None,
        duration_secs: None,
        source_ref: format!("/tmp/{title}.wav"),
    }
}

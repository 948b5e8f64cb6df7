use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::RwLock;
use std::time::SystemTime;

use crate::error::Result;
use crate::types::{Fingerprint, Recording, RecordingMetadata, Stats};

use super::{FingerprintStore, Posting, QueryRecord};

/// §9: "an in-memory hash multimap is sufficient for tests and small
/// deployments." Backs the test suite and, per `Config`, the CLI when no
/// `DATABASE_URL` is configured. A `RwLock` gives the §5 policy directly:
/// concurrent reads (lookup, get_recording) and serialized writes — real
/// per-recording write concurrency isn't needed at in-memory scale, so one
/// lock is a faithful-enough stand-in for the store's contract, not a
/// shortcut around it.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
    next_id: AtomicI32,
}

#[derive(Default)]
struct Inner {
    recordings: HashMap<i32, Recording>,
    postings_by_hash: HashMap<u32, Vec<Posting>>,
    queries: Vec<QueryRecord>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            next_id: AtomicI32::new(1),
        }
    }
}

impl FingerprintStore for InMemoryStore {
    fn ingest(&self, recording: &Recording, fingerprints: &[Fingerprint]) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        for chunk in fingerprints.chunks(super::BATCH_INSERT_SIZE) {
            for fp in chunk {
                let posting = Posting {
                    recording_id: fp.recording_id,
                    stored_time_offset: fp.time_offset,
                    hash: fp.hash,
                };
                let postings = inner.postings_by_hash.entry(fp.hash).or_default();
                // Idempotent on (recording_id, hash, time_offset): skip an
                // exact duplicate rather than growing the posting list.
                if !postings.iter().any(|p| {
                    p.recording_id == posting.recording_id
                        && p.stored_time_offset == posting.stored_time_offset
                }) {
                    postings.push(posting);
                }
            }
        }
        inner.recordings.insert(recording.id, recording.clone());
        Ok(())
    }

    fn lookup(&self, hashes: &[u32]) -> Result<Vec<Posting>> {
        let inner = self.inner.read().unwrap();
        let mut results = Vec::new();
        for chunk in hashes.chunks(super::BATCH_LOOKUP_SIZE) {
            for &hash in chunk {
                if let Some(postings) = inner.postings_by_hash.get(&hash) {
                    results.extend(postings.iter().copied());
                }
            }
        }
        Ok(results)
    }

    fn create_recording(&self, metadata: &RecordingMetadata) -> Result<Recording> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let recording = Recording {
            id,
            title: metadata.title.clone(),
            artist: metadata.artist.clone(),
            album: metadata.album.clone(),
            duration_secs: metadata.duration_secs,
            source_ref: metadata.source_ref.clone(),
            created_at: SystemTime::now(),
        };
        self.inner
            .write()
            .unwrap()
            .recordings
            .insert(id, recording.clone());
        Ok(recording)
    }

    fn delete(&self, recording_id: i32) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.recordings.remove(&recording_id);
        for postings in inner.postings_by_hash.values_mut() {
            postings.retain(|p| p.recording_id != recording_id);
        }
        inner.postings_by_hash.retain(|_, v| !v.is_empty());
        Ok(())
    }

    fn get_recording(&self, recording_id: i32) -> Result<Option<Recording>> {
        Ok(self.inner.read().unwrap().recordings.get(&recording_id).cloned())
    }

    fn record_query(&self, record: &QueryRecord) -> Result<()> {
        self.inner.write().unwrap().queries.push(record.clone());
        Ok(())
    }

    fn stats(&self) -> Result<Stats> {
        let inner = self.inner.read().unwrap();
        let fingerprint_count: i64 = inner.postings_by_hash.values().map(|v| v.len() as i64).sum();
        let query_count = inner.queries.len() as i64;
        let successful_query_count = inner
            .queries
            .iter()
            .filter(|q| q.identified_recording_id.is_some())
            .count() as i64;
        let average_processing_time_ms = if query_count > 0 {
            inner.queries.iter().map(|q| q.processing_time_ms as f64).sum::<f64>()
                / query_count as f64
        } else {
            0.0
        };

        Ok(Stats {
            recording_count: inner.recordings.len() as i64,
            fingerprint_count,
            query_count,
            successful_query_count,
            average_processing_time_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::sample_metadata;

    fn fp(recording_id: i32, hash: u32, time_offset: f64) -> Fingerprint {
        Fingerprint { recording_id, hash, time_offset }
    }

    #[test]
    fn ingest_then_lookup_round_trips() {
        let store = InMemoryStore::new();
        let recording = store.create_recording(&sample_metadata("a")).unwrap();
        let fingerprints = vec![fp(recording.id, 42, 1.0), fp(recording.id, 43, 2.0)];
        store.ingest(&recording, &fingerprints).unwrap();

        let postings = store.lookup(&[42]).unwrap();
        assert_eq!(postings.len(), 1);
        assert_eq!(postings[0].recording_id, recording.id);
    }

    #[test]
    fn ingest_is_idempotent_on_duplicate_fingerprints() {
        let store = InMemoryStore::new();
        let recording = store.create_recording(&sample_metadata("b")).unwrap();
        let fingerprints = vec![fp(recording.id, 7, 1.0), fp(recording.id, 7, 1.0)];
        store.ingest(&recording, &fingerprints).unwrap();

        let postings = store.lookup(&[7]).unwrap();
        assert_eq!(postings.len(), 1);
    }

    #[test]
    fn delete_cascades_fingerprints() {
        let store = InMemoryStore::new();
        let recording = store.create_recording(&sample_metadata("c")).unwrap();
        store.ingest(&recording, &[fp(recording.id, 5, 1.0)]).unwrap();

        store.delete(recording.id).unwrap();

        assert!(store.lookup(&[5]).unwrap().is_empty());
        assert!(store.get_recording(recording.id).unwrap().is_none());
    }

    #[test]
    fn duplicate_add_yields_independent_recordings_with_identical_fingerprints() {
        let store = InMemoryStore::new();
        let a = store.create_recording(&sample_metadata("d")).unwrap();
        let b = store.create_recording(&sample_metadata("d")).unwrap();
        assert_ne!(a.id, b.id);

        let fps_a = vec![fp(a.id, 1, 0.0), fp(a.id, 2, 0.5)];
        let fps_b = vec![fp(b.id, 1, 0.0), fp(b.id, 2, 0.5)];
        store.ingest(&a, &fps_a).unwrap();
        store.ingest(&b, &fps_b).unwrap();

        let postings = store.lookup(&[1, 2]).unwrap();
        assert_eq!(postings.len(), 4);
    }
}

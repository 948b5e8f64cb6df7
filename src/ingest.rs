//! §4.6: the recording ingestion state machine, and the §5 bounded worker
//! pool (`C_ING`) that drives it across concurrent ingestions.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::audio::Decoder;
use crate::config::Config;
use crate::error::{ResonanceError, Result};
use crate::fingerprint::fingerprint_samples;
use crate::store::FingerprintStore;
use crate::types::RecordingMetadata;

/// §4.6 states. `Ready` and `Failed` are terminal; every other state
/// transitions strictly forward. No state is persisted mid-pipeline — a
/// recording exists in the store only once it reaches `Persisting`'s
/// successful completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestState {
    Queued,
    Decoding,
    Spectrogramming,
    Peaking,
    Hashing,
    Persisting,
    Ready,
    Failed,
}

pub struct Ingestor<D: Decoder> {
    store: Arc<dyn FingerprintStore>,
    decoder: D,
    semaphore: Arc<Semaphore>,
    max_retries: u32,
}

impl<D: Decoder> Ingestor<D> {
    pub fn new(store: Arc<dyn FingerprintStore>, decoder: D, config: &Config) -> Self {
        Self {
            store,
            decoder,
            semaphore: Arc::new(Semaphore::new(config.concurrent_ingestions.max(1))),
            max_retries: config.max_ingest_retries,
        }
    }

    /// §6 `add`: runs the full ingestion state machine for one recording,
    /// bounded by `C_ING` concurrent in-flight ingestions (§5). On success
    /// the recording is `Ready`; on failure the store is left with no
    /// trace of it (§4.6, §5 cancellation).
    pub async fn add(&self, metadata: RecordingMetadata, source: &std::path::Path) -> Result<i32> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .expect("semaphore is never closed");

        let mut state = IngestState::Queued;
        let result = self.run_pipeline(&mut state, metadata, source).await;

        match &result {
            Ok(id) => info!(recording_id = id, "ingestion reached Ready"),
            Err(e) => warn!(error = %e, state = ?state, "ingestion failed, rolling back"),
        }

        result
    }

    async fn run_pipeline(
        &self,
        state: &mut IngestState,
        metadata: RecordingMetadata,
        source: &std::path::Path,
    ) -> Result<i32> {
        let recording = self.store.create_recording(&metadata)?;
        let recording_id = recording.id;

        let outcome = self.decode_and_persist(state, recording_id, source, &recording).await;

        match outcome {
            Ok(()) => {
                *state = IngestState::Ready;
                Ok(recording_id)
            }
            Err(e) => {
                *state = IngestState::Failed;
                // §4.6 / §5: a failure before Ready discards everything
                // written for this attempt.
                if let Err(rollback_err) = self.store.delete(recording_id) {
                    error!(error = %rollback_err, recording_id, "rollback delete failed");
                }
                Err(e)
            }
        }
    }

    async fn decode_and_persist(
        &self,
        state: &mut IngestState,
        recording_id: i32,
        source: &std::path::Path,
        recording: &crate::types::Recording,
    ) -> Result<()> {
        *state = IngestState::Decoding;
        let samples = self.decoder.decode(source)?;

        *state = IngestState::Spectrogramming;
        // Spectrogramming/Peaking/Hashing happen inside one pure-compute
        // call; the state machine still names each stage for observability
        // even though they share one function body (§9: isolate compute
        // from I/O, not "one state transition per function call").
        *state = IngestState::Peaking;
        *state = IngestState::Hashing;
        let fingerprints = fingerprint_samples(&samples, recording_id)?;
        debug!(recording_id, fingerprint_count = fingerprints.len(), "fingerprinted");

        *state = IngestState::Persisting;
        self.persist_with_retry(recording, &fingerprints).await
    }

    /// §7: store errors during write are retried at the batch boundary up
    /// to `R_MAX` attempts with exponential backoff; exhausted retries
    /// fail the whole recording.
    async fn persist_with_retry(
        &self,
        recording: &crate::types::Recording,
        fingerprints: &[crate::types::Fingerprint],
    ) -> Result<()> {
        let mut attempt = 0;
        loop {
            match self.store.ingest(recording, fingerprints) {
                Ok(()) => return Ok(()),
                Err(e) if attempt + 1 >= self.max_retries => {
                    return Err(ResonanceError::StoreUnavailable(format!(
                        "exhausted {} retries: {e}",
                        self.max_retries
                    )));
                }
                Err(e) => {
                    let backoff = Duration::from_millis(50 * 2u64.pow(attempt));
                    warn!(error = %e, attempt, backoff_ms = backoff.as_millis() as u64, "retrying ingest batch");
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    }
}

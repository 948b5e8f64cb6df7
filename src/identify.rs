//! §6 `identify`: decode a query clip, fingerprint it, run the matcher,
//! and produce a scored result (or "no match") within a soft wall-clock
//! budget.

use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::audio::Decoder;
use crate::config::Config;
use crate::error::{ResonanceError, Result};
use crate::fingerprint::fingerprint_samples;
use crate::matcher::identify_best_match;
use crate::store::{FingerprintStore, QueryRecord};
use crate::types::IdentifyResult;

pub struct Identifier<D: Decoder> {
    store: std::sync::Arc<dyn FingerprintStore>,
    decoder: D,
    timeout: Duration,
}

impl<D: Decoder> Identifier<D> {
    pub fn new(store: std::sync::Arc<dyn FingerprintStore>, decoder: D, config: &Config) -> Self {
        Self {
            store,
            decoder,
            timeout: config.identify_timeout,
        }
    }

    /// §6: returns `Ok(Some(result))` on a match, `Ok(None)` for a clean
    /// "no match" (not an error), or `Err` for DSP/store failures and
    /// `Timeout`. `processing_time_ms` is always milliseconds (§9 resolves
    /// the source's ms/s ambiguity in favor of milliseconds throughout).
    pub async fn identify(&self, source: &Path) -> Result<Option<IdentifyResult>> {
        let started = Instant::now();

        let outcome = tokio::time::timeout(self.timeout, self.run(source)).await;

        let elapsed_ms = started.elapsed().as_millis() as u64;

        let outcome = match outcome {
            Ok(inner) => inner,
            Err(_) => {
                self.record_attempt(None, None, elapsed_ms);
                return Err(ResonanceError::Timeout);
            }
        };

        match outcome {
            Ok(Some(result)) => {
                info!(
                    recording_id = result.recording_id,
                    confidence = result.confidence,
                    "identification matched"
                );
                self.record_attempt(Some(result.recording_id), Some(result.confidence), elapsed_ms);
                Ok(Some(IdentifyResult {
                    recording_id: result.recording_id,
                    confidence: result.confidence,
                    aligned_matches: result.aligned_matches,
                    query_fingerprint_count: result.query_fingerprint_count,
                    processing_time_ms: elapsed_ms,
                }))
            }
            Ok(None) => {
                info!("identification found no match");
                self.record_attempt(None, None, elapsed_ms);
                Ok(None)
            }
            Err(e) => {
                self.record_attempt(None, None, elapsed_ms);
                Err(e)
            }
        }
    }

    async fn run(&self, source: &Path) -> Result<Option<crate::matcher::MatchOutcome>> {
        let samples = self.decoder.decode(source)?;
        let fingerprints = fingerprint_samples(&samples, 0)?;
        identify_best_match(self.store.as_ref(), &fingerprints)
    }

    /// §7: analytics writes never fail the caller's operation — log and
    /// swallow.
    fn record_attempt(&self, recording_id: Option<i32>, confidence: Option<f64>, processing_time_ms: u64) {
        let record = QueryRecord {
            audio_duration: None,
            identified_recording_id: recording_id,
            confidence,
            processing_time_ms,
        };
        if let Err(e) = self.store.record_query(&record) {
            warn!(error = %e, "failed to record query analytics row");
        }
    }
}

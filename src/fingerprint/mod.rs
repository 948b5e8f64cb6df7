//! Orchestrates the DSP stages into the `(hash, time_offset)` stream §2
//! describes: Spectrogrammer -> Peak Picker -> Pair Hasher.

use tracing::debug;

use crate::dsp::{compute_spectrogram, generate_fingerprints, pick_peaks};
use crate::error::{ResonanceError, Result};
use crate::types::Fingerprint;

/// Run the full fingerprinting pass over decoded mono samples at
/// `spectrogram::SAMPLE_RATE`, tagging every emitted fingerprint with
/// `recording_id`. Returns `NoFingerprints` if the pass produced zero
/// hashes (§7 — usually silence or a degenerate input), which spec.md
/// treats as a surfaced error rather than an empty success.
pub fn fingerprint_samples(samples: &[f32], recording_id: i32) -> Result<Vec<Fingerprint>> {
    let spectrogram = compute_spectrogram(samples)?;
    debug!(frames = spectrogram.frames, bins = spectrogram.bins, "spectrogram computed");

    let peaks = pick_peaks(&spectrogram);
    debug!(peak_count = peaks.len(), "peaks picked");

    let fingerprints = generate_fingerprints(&peaks, recording_id);
    debug!(fingerprint_count = fingerprints.len(), "fingerprints generated");

    if fingerprints.is_empty() {
        return Err(ResonanceError::NoFingerprints);
    }

    Ok(fingerprints)
}

use std::time::SystemTime;

/// §3: a persisted recording. `id` is immutable once assigned; `(title,
/// artist)` is intentionally not unique — duplicate `add` calls are a
/// feature, not a bug (see §8 "Idempotent ingestion").
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    pub id: i32,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub duration_secs: Option<f64>,
    pub source_ref: String,
    pub created_at: SystemTime,
}

/// Metadata supplied by the caller of `add`, before a recording id exists.
#[derive(Debug, Clone)]
pub struct RecordingMetadata {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub duration_secs: Option<f64>,
    pub source_ref: String,
}

/// §3: a `(recording_id, hash, time_offset)` triple. `hash` stays a `u32`
/// through the whole fingerprinting pipeline — it is only widened to the
/// store's 64-bit key at the store boundary (§6), and never truncated back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fingerprint {
    pub recording_id: i32,
    pub hash: u32,
    pub time_offset: f64,
}

/// §3: a transient spectral peak, never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub frequency_hz: f32,
    pub time_s: f32,
    pub magnitude: f32,
}

/// §3 / §9: a dense, transient magnitude matrix `M[t][f]`, arena-allocated
/// as one contiguous buffer indexed `[t * bins + f]` to keep the FFT and
/// peak-picking hot loops cache-friendly, owned exclusively by the pass
/// that produced it.
#[derive(Debug, Clone)]
pub struct Spectrogram {
    pub frames: usize,
    pub bins: usize,
    data: Vec<f32>,
}

impl Spectrogram {
    pub fn new(frames: usize, bins: usize) -> Self {
        Self {
            frames,
            bins,
            data: vec![0.0; frames * bins],
        }
    }

    #[inline]
    pub fn get(&self, t: usize, f: usize) -> f32 {
        self.data[t * self.bins + f]
    }

    #[inline]
    pub fn set(&mut self, t: usize, f: usize, value: f32) {
        self.data[t * self.bins + f] = value;
    }

    /// Mutable view of frame `t`'s bins, for writing one frame's magnitudes
    /// at a time without re-deriving the stride at every call site.
    #[inline]
    pub fn frame_mut(&mut self, t: usize) -> &mut [f32] {
        let start = t * self.bins;
        &mut self.data[start..start + self.bins]
    }

    /// §4.1: time of frame `t` in seconds.
    pub fn frame_time_s(&self, t: usize, hop: usize, sample_rate: u32) -> f64 {
        (t * hop) as f64 / sample_rate as f64
    }

    /// §4.1: the required (non-canonical) frequency-bin-to-Hz convention,
    /// `k * SR / (2 * (bins - 1))`. Implementers must not "fix" this to the
    /// more common `SR / W` — doing so breaks hash compatibility with any
    /// store built under this convention.
    pub fn bin_frequency_hz(&self, k: usize, sample_rate: u32) -> f64 {
        (k as f64 * sample_rate as f64) / (2.0 * (self.bins as f64 - 1.0))
    }
}

/// §3: one collision between a query fingerprint and a stored fingerprint,
/// as consumed by the matcher's histogram vote.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchRecord {
    pub recording_id: i32,
    pub stored_time_offset: f64,
    pub query_time_offset: f64,
    pub delta: f64,
}

/// §6 `identify` success shape.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifyResult {
    pub recording_id: i32,
    pub confidence: f64,
    pub aligned_matches: usize,
    pub query_fingerprint_count: usize,
    pub processing_time_ms: u64,
}

/// §6 `stats` shape.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Stats {
    pub recording_count: i64,
    pub fingerprint_count: i64,
    pub query_count: i64,
    pub successful_query_count: i64,
    pub average_processing_time_ms: f64,
}

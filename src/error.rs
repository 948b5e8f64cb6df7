use thiserror::Error;

/// Crate-wide error type for the fingerprinting pipeline, the store, and
/// identification. Mirrors the error kinds spec'd out for the system: DSP
/// failures abort the current pass, store failures are retried at the batch
/// boundary, `NoMatch` is a normal outcome and never constructed as an error.
#[derive(Debug, Error)]
pub enum ResonanceError {
    #[error("audio input shorter than one analysis window")]
    InputTooShort,

    #[error("unsupported audio container or codec")]
    UnsupportedFormat,

    #[error("no audio stream found in source")]
    NoAudioStream,

    #[error("audio decoding failed: {0}")]
    DecodeFailed(String),

    #[error("fingerprinting produced zero hashes")]
    NoFingerprints,

    #[error("fingerprint store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("identification exceeded its time budget")]
    Timeout,

    #[error("recording {0} not found")]
    RecordingNotFound(i32),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("database connection error: {0}")]
    Connection(#[from] diesel::ConnectionError),
}

pub type Result<T> = std::result::Result<T, ResonanceError>;

impl From<symphonia::core::errors::Error> for ResonanceError {
    fn from(e: symphonia::core::errors::Error) -> Self {
        ResonanceError::DecodeFailed(e.to_string())
    }
}

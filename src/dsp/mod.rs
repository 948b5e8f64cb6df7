//! DSP core: spectrogram, peak picking, and pair hashing. Pure compute,
//! no I/O — per §5 and §9, these run to completion on whichever worker
//! picks them up, with the spectrogram and peak list owned exclusively by
//! the calling pass.

pub mod complex;
pub mod fft;
pub mod hasher;
pub mod peaks;
pub mod spectrogram;

pub use hasher::generate_fingerprints;
pub use peaks::pick_peaks;
pub use spectrogram::compute_spectrogram;

use rayon::prelude::*;

use crate::error::{ResonanceError, Result};
use crate::types::Spectrogram;

use super::complex::Complex;
use super::fft::CooleyTukeyFft;

/// §4.1 fixed constants — not configuration. A systems-language port must
/// reproduce these bit-for-bit to stay hash-compatible with any store built
/// against this convention.
pub const SAMPLE_RATE: u32 = 22050;
pub const WINDOW_SIZE: usize = 4096;
pub const HOP_SIZE: usize = 1024;

/// Hann window coefficients, `w[n] = 0.5 * (1 - cos(2*pi*n/(W-1)))`.
fn hann_window(size: usize) -> Vec<f32> {
    let denom = (size - 1) as f32;
    (0..size)
        .map(|n| {
            let phase = 2.0 * std::f32::consts::PI * n as f32 / denom;
            0.5 * (1.0 - phase.cos())
        })
        .collect()
}

/// §4.1: windows and FFTs a mono sample stream into a dense magnitude
/// matrix. Frames whose window would run past the end of `samples` are
/// omitted — no zero padding. Per §5, per-frame FFTs have no cross-frame
/// dependency and are computed in parallel with `rayon`.
pub fn compute_spectrogram(samples: &[f32]) -> Result<Spectrogram> {
    if samples.len() < WINDOW_SIZE {
        return Err(ResonanceError::InputTooShort);
    }

    let frame_count = (samples.len() - WINDOW_SIZE) / HOP_SIZE + 1;
    let bins = WINDOW_SIZE / 2;
    let window = hann_window(WINDOW_SIZE);

    let frame_magnitudes: Vec<Vec<f32>> = (0..frame_count)
        .into_par_iter()
        .map(|t| {
            let start = t * HOP_SIZE;
            let mut buf: Vec<Complex> = samples[start..start + WINDOW_SIZE]
                .iter()
                .zip(window.iter())
                .map(|(&sample, &w)| Complex::new(sample * w, 0.0))
                .collect();

            CooleyTukeyFft::transform(&mut buf);

            buf[..bins].iter().map(|c| c.norm()).collect()
        })
        .collect();

    let mut spectrogram = Spectrogram::new(frame_count, bins);
    for (t, magnitudes) in frame_magnitudes.into_iter().enumerate() {
        spectrogram.frame_mut(t).copy_from_slice(&magnitudes);
    }
    Ok(spectrogram)
}

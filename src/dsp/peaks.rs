use ordered_float::OrderedFloat;
use rayon::prelude::*;

use crate::types::{Peak, Spectrogram};

use super::spectrogram::{HOP_SIZE, SAMPLE_RATE};

/// §4.2 fixed constants.
pub const AMPLITUDE_FLOOR: f32 = 15.0;
pub const NEIGHBORHOOD: usize = 20;
pub const MAX_PEAKS: usize = 10_000;

/// §4.2: extract the sparse constellation of local maxima from a dense
/// spectrogram. Parallelized per `(t, f)` cell over `rayon`, per §5 ("may
/// parallelize ... per (t, f) cell for peak picking").
pub fn pick_peaks(spectrogram: &Spectrogram) -> Vec<Peak> {
    let half = NEIGHBORHOOD / 2; // floor(N/2) = 10

    let mut candidates: Vec<(usize, usize, f32)> = (0..spectrogram.frames)
        .into_par_iter()
        .flat_map_iter(|t| {
            (0..spectrogram.bins).filter_map(move |f| {
                let magnitude = spectrogram.get(t, f);
                if magnitude < AMPLITUDE_FLOOR {
                    return None;
                }
                if is_strict_local_maximum(spectrogram, t, f, magnitude, half) {
                    Some((t, f, magnitude))
                } else {
                    None
                }
            })
        })
        .collect();

    // §4.2 step 3: cap at MAX_PEAKS, keep greatest magnitude, ties broken by
    // earliest time then lowest frequency.
    if candidates.len() > MAX_PEAKS {
        candidates.sort_unstable_by_key(|&(t, f, magnitude)| (OrderedFloat(-magnitude), t, f));
        candidates.truncate(MAX_PEAKS);
    }

    let mut peaks: Vec<Peak> = candidates
        .into_iter()
        .map(|(t, f, magnitude)| Peak {
            frequency_hz: spectrogram.bin_frequency_hz(f, SAMPLE_RATE) as f32,
            time_s: spectrogram.frame_time_s(t, HOP_SIZE, SAMPLE_RATE) as f32,
            magnitude,
        })
        .collect();

    // §4.2 step 4: delivered ordered by time asc, ties by frequency asc.
    peaks.sort_unstable_by_key(|p| (OrderedFloat(p.time_s), OrderedFloat(p.frequency_hz)));

    peaks
}

/// Strict local maximum over the closed `(2*half+1) x (2*half+1)` square
/// centered on `(t, f)`, excluding the center itself. Any neighbor outside
/// the matrix is treated as absent, not zero, so it cannot disqualify the
/// candidate and cannot be compared against.
fn is_strict_local_maximum(
    spectrogram: &Spectrogram,
    t: usize,
    f: usize,
    center: f32,
    half: usize,
) -> bool {
    let t_lo = t.saturating_sub(half);
    let t_hi = (t + half).min(spectrogram.frames - 1);
    let f_lo = f.saturating_sub(half);
    let f_hi = (f + half).min(spectrogram.bins - 1);

    for nt in t_lo..=t_hi {
        for nf in f_lo..=f_hi {
            if nt == t && nf == f {
                continue;
            }
            if spectrogram.get(nt, nf) >= center {
                return false;
            }
        }
    }
    true
}

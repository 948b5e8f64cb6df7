use std::num::Wrapping;

use crate::types::{Fingerprint, Peak};

/// §4.3 fixed constants.
pub const DT_MIN: f32 = 0.5;
pub const DT_MAX: f32 = 3.0;
pub const FANOUT: usize = 3;
const FREQ_BIN_HZ: f32 = 10.0;

fn quantize_freq(freq_hz: f32) -> u32 {
    (freq_hz / FREQ_BIN_HZ).floor() as u32 * FREQ_BIN_HZ as u32
}

/// `qd = floor(floor(delta*100) * 10)`, i.e. the nearest centisecond widened
/// by a factor of 1000 with truncation (spec.md §4.3's exact phrasing).
fn quantize_delta(delta_s: f32) -> u32 {
    let centiseconds = (delta_s * 100.0).floor() as u32;
    centiseconds * 10
}

/// §4.3's required hash function: a 31-polynomial rolling hash over
/// quantized `(anchor_freq, target_freq, delta)`, computed in wrapping
/// 32-bit arithmetic. Must be reproduced exactly to stay store-compatible.
fn hash_pair(q1: u32, q2: u32, qd: u32) -> u32 {
    let mut h = Wrapping(0u32);
    h = h * Wrapping(31) + Wrapping(q1);
    h = h * Wrapping(31) + Wrapping(q2);
    h = h * Wrapping(31) + Wrapping(qd);
    h.0
}

/// §4.3: pair time-sorted peaks into `(hash, anchor_time)` fingerprints.
/// `peaks` must already be ordered by `time_s` ascending (the contract
/// `pick_peaks` delivers). `recording_id` is stamped onto every emitted
/// fingerprint; callers identifying a query clip (no recording id yet) pass
/// a sentinel such as `0` and ignore it.
pub fn generate_fingerprints(peaks: &[Peak], recording_id: i32) -> Vec<Fingerprint> {
    let mut fingerprints = Vec::new();

    for (i, anchor) in peaks.iter().enumerate() {
        let q1 = quantize_freq(anchor.frequency_hz);
        let mut emitted = 0;

        for target in &peaks[i + 1..] {
            let delta = target.time_s - anchor.time_s;
            if delta < DT_MIN {
                continue;
            }
            if delta > DT_MAX {
                break;
            }

            let q2 = quantize_freq(target.frequency_hz);
            let qd = quantize_delta(delta);
            let hash = hash_pair(q1, q2, qd);

            fingerprints.push(Fingerprint {
                recording_id,
                hash,
                time_offset: anchor.time_s as f64,
            });

            emitted += 1;
            if emitted >= FANOUT {
                break;
            }
        }
    }

    fingerprints
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peak(time_s: f32, frequency_hz: f32) -> Peak {
        Peak {
            frequency_hz,
            time_s,
            magnitude: 100.0,
        }
    }

    #[test]
    fn hash_ignores_sub_bin_perturbation() {
        let a = peak(0.0, 1000.0);
        let b = peak(1.0, 2000.0);
        let fps_a = generate_fingerprints(&[a, b], 1);

        let b_shifted = peak(1.0, 2000.0 + 9.0); // < 10 Hz, same bin
        let fps_b = generate_fingerprints(&[a, b_shifted], 1);

        assert_eq!(fps_a[0].hash, fps_b[0].hash);
    }

    #[test]
    fn hash_changes_across_a_frequency_bin_boundary() {
        let a = peak(0.0, 1000.0);
        let b = peak(1.0, 2000.0);
        let fps_a = generate_fingerprints(&[a, b], 1);

        let b_shifted = peak(1.0, 2010.0); // crosses the 10 Hz bin boundary
        let fps_b = generate_fingerprints(&[a, b_shifted], 1);

        assert_ne!(fps_a[0].hash, fps_b[0].hash);
    }

    #[test]
    fn respects_dt_min_and_dt_max_window() {
        let anchor = peak(0.0, 1000.0);
        let too_close = peak(0.2, 1100.0); // < DT_MIN
        let in_range = peak(1.0, 1200.0);
        let too_far = peak(3.5, 1300.0); // > DT_MAX

        let peaks = [anchor, too_close, in_range, too_far];
        let fps = generate_fingerprints(&peaks, 1);

        // Only the in-range target should pair with the anchor.
        assert_eq!(fps.iter().filter(|f| f.time_offset == 0.0).count(), 1);
    }

    #[test]
    fn fanout_caps_targets_per_anchor() {
        let anchor = peak(0.0, 1000.0);
        let targets: Vec<Peak> = (0..10).map(|i| peak(0.6 + i as f32 * 0.1, 1100.0)).collect();
        let mut peaks = vec![anchor];
        peaks.extend(targets);

        let fps = generate_fingerprints(&peaks, 1);
        assert_eq!(fps.len(), FANOUT);
    }

    #[test]
    fn anchor_time_offset_is_non_decreasing_for_sorted_input() {
        let peaks = vec![peak(0.0, 500.0), peak(0.6, 600.0), peak(1.2, 700.0)];
        let fps = generate_fingerprints(&peaks, 7);
        let mut last = 0.0;
        for fp in &fps {
            assert!(fp.time_offset >= last);
            last = fp.time_offset;
        }
    }
}

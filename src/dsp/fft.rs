use super::complex::Complex;

/// Recursive radix-2 Cooley-Tukey FFT, ported from the teacher's
/// `fft::fft::CooleyTukeyFFT`. Requires a power-of-two input length; `W =
/// 4096` (spec.md §4.1) satisfies that.
pub struct CooleyTukeyFft;

impl CooleyTukeyFft {
    /// In-place forward FFT. `buf.len()` must be a power of two.
    pub fn transform(buf: &mut [Complex]) {
        let n = buf.len();
        if n <= 1 {
            return;
        }
        debug_assert!(n.is_power_of_two(), "FFT size must be a power of two");

        let mut even: Vec<Complex> = Vec::with_capacity(n / 2);
        let mut odd: Vec<Complex> = Vec::with_capacity(n / 2);
        for (i, &sample) in buf.iter().enumerate() {
            if i % 2 == 0 {
                even.push(sample);
            } else {
                odd.push(sample);
            }
        }

        Self::transform(&mut even);
        Self::transform(&mut odd);

        // P(w)  = Pe(w^2) + w * Po(w^2)
        // P(-w) = Pe(w^2) - w * Po(w^2)
        // where w = e^{-i*2*pi*k/n} (negative theta is the forward-transform
        // convention) and -w^j = w^(j + n/2).
        for j in 0..n / 2 {
            let theta = (2.0 * std::f32::consts::PI * j as f32) / n as f32;
            let twiddle = Complex::from_polar(1.0, -theta);
            let odd_term = twiddle * odd[j];
            buf[j] = even[j] + odd_term;
            buf[j + n / 2] = even[j] - odd_term;
        }
    }
}

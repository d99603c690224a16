//! Deterministic synthetic signals.
//!
//! Everything here is seeded so that scenario tests are reproducible
//! without pulling in a random number generator.

use std::f64::consts::PI;

/// Small xorshift generator; good enough for test noise.
#[derive(Debug, Clone)]
pub struct Noise {
    state: u64,
}

impl Noise {
    pub fn new(seed: u64) -> Self {
        // Zero is a fixed point of xorshift.
        Self {
            state: seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1,
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform in `[-1, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        let unit = (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64;
        2.0 * unit - 1.0
    }
}

/// Uniform white noise with peak magnitude `amplitude`.
pub fn white_noise(seed: u64, len: usize, amplitude: i16) -> Vec<i16> {
    let mut noise = Noise::new(seed);
    let amplitude = f64::from(amplitude);
    (0..len)
        .map(|_| (noise.next_f64() * amplitude).round() as i16)
        .collect()
}

/// A sine tone.
pub fn tone(freq_hz: f64, sample_rate_hz: u32, amplitude: f64, len: usize) -> Vec<i16> {
    let step = 2.0 * PI * freq_hz / f64::from(sample_rate_hz);
    (0..len)
        .map(|n| saturate(amplitude * (step * n as f64).sin()))
        .collect()
}

/// A room-like impulse response: silence for `delay` taps, a direct path of
/// `gain`, then an exponentially decaying random tail. `len` is the total
/// length including the delay.
pub fn echo_path(seed: u64, len: usize, delay: usize, gain: f64) -> Vec<f64> {
    let mut noise = Noise::new(seed);
    let mut path = vec![0.0; len];
    if delay >= len {
        return path;
    }
    path[delay] = gain;
    let tail = (len - delay).max(2) as f64;
    for (k, tap) in path.iter_mut().enumerate().skip(delay + 1) {
        let age = (k - delay) as f64;
        *tap = 0.5 * gain * noise.next_f64() * (-4.0 * age / tail).exp();
    }
    path
}

/// Causal convolution of `signal` with `path`, truncated to the signal
/// length. Samples before the start are zero.
pub fn convolve(signal: &[i16], path: &[f64]) -> Vec<f64> {
    (0..signal.len())
        .map(|n| {
            path.iter()
                .enumerate()
                .take(n + 1)
                .map(|(k, &h)| h * f64::from(signal[n - k]))
                .sum()
        })
        .collect()
}

/// Round and saturate to i16.
pub fn saturate(v: f64) -> i16 {
    v.round().clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
}

/// Round and saturate a slice to i16.
pub fn to_i16(x: &[f64]) -> Vec<i16> {
    x.iter().copied().map(saturate).collect()
}

/// Sample-wise saturating sum.
pub fn mix(a: &[i16], b: &[i16]) -> Vec<i16> {
    assert_eq!(a.len(), b.len(), "Length mismatch");
    a.iter().zip(b).map(|(&x, &y)| x.saturating_add(y)).collect()
}

/// Scale by a linear gain with saturation.
pub fn scale(x: &[i16], gain: f64) -> Vec<i16> {
    x.iter().map(|&v| saturate(f64::from(v) * gain)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::mean_power_i16;

    #[test]
    fn noise_is_deterministic() {
        assert_eq!(white_noise(1, 64, 1000), white_noise(1, 64, 1000));
        assert_ne!(white_noise(1, 64, 1000), white_noise(2, 64, 1000));
    }

    #[test]
    fn noise_power_matches_uniform_distribution() {
        let x = white_noise(9, 48_000, 6000);
        assert!(x.iter().all(|s| s.abs() <= 6000));
        // Uniform on [-A, A] has power A^2 / 3.
        let expected = 6000.0f64 * 6000.0 / 3.0;
        let power = mean_power_i16(&x);
        assert!((power / expected - 1.0).abs() < 0.05, "{power}");
    }

    #[test]
    fn seed_zero_is_not_degenerate() {
        assert!(white_noise(0, 32, 1000).iter().any(|&s| s != 0));
    }

    #[test]
    fn tone_power() {
        let x = tone(440.0, 16000, 10_000.0, 16000);
        let power = mean_power_i16(&x);
        assert!((power / 5.0e7 - 1.0).abs() < 0.01, "{power}");
    }

    #[test]
    fn convolve_delays_and_scales() {
        let x = [1i16, 2, 3, 4];
        let y = convolve(&x, &[0.0, 0.5]);
        assert_eq!(y, vec![0.0, 0.5, 1.0, 1.5]);
    }

    #[test]
    fn echo_path_layout() {
        let path = echo_path(4, 32, 6, 0.7);
        assert_eq!(path.len(), 32);
        assert!(path[..6].iter().all(|&h| h == 0.0));
        assert_eq!(path[6], 0.7);
        assert!(path[7..].iter().all(|h| h.abs() <= 0.35));
        assert_eq!(echo_path(4, 4, 6, 0.7), vec![0.0; 4]);
    }

    #[test]
    fn mix_saturates() {
        assert_eq!(mix(&[i16::MAX, -5], &[10, 5]), vec![i16::MAX, 0]);
        assert_eq!(scale(&[20_000], 2.0), vec![i16::MAX]);
    }
}

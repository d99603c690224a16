//! Audio sample format conversions.
//!
//! # Format conventions
//!
//! | Name      | Type          | Range                          |
//! |-----------|---------------|--------------------------------|
//! | S16       | `i16`         | \[-32768, 32767\]              |
//! | FloatS16  | `f32` / `f64` | \[-32768.0, 32768.0\]          |
//!
//! The adaptive filter runs on `f64` FloatS16 samples, the spectral
//! suppressor on `f32` FloatS16 samples.

/// Lowest sample rate the engine accepts (Hz).
pub const MIN_SAMPLE_RATE_HZ: u32 = 8_000;

/// Highest sample rate the engine accepts (Hz).
pub const MAX_SAMPLE_RATE_HZ: u32 = 48_000;

const MAX_ABS_FLOAT_S16: f64 = 32768.0;

// ── Scalar conversions ──────────────────────────────────────────────

/// Widen a single S16 sample to FloatS16.
#[inline]
pub fn s16_to_float_s16(v: i16) -> f64 {
    f64::from(v)
}

/// Convert a single FloatS16 sample to S16, rounding to nearest and
/// saturating at the i16 limits.
#[inline]
pub fn float_s16_to_s16(v: f64) -> i16 {
    let v = v.clamp(-32768.0, 32767.0);
    (v + f64::copysign(0.5, v)) as i16
}

/// `f32` variant of [`float_s16_to_s16`].
#[inline]
pub fn float_s16_to_s16_f32(v: f32) -> i16 {
    let v = v.clamp(-32768.0, 32767.0);
    (v + f32::copysign(0.5, v)) as i16
}

/// Convert a dB value to a linear amplitude ratio.
#[inline]
pub fn db_to_ratio(v: f64) -> f64 {
    10.0_f64.powf(v / 20.0)
}

/// Convert a dB value to a linear power ratio.
#[inline]
pub fn db_to_power_ratio(v: f64) -> f64 {
    10.0_f64.powf(v / 10.0)
}

/// Convert a power ratio to dB. Non-positive ratios map to `None`.
#[inline]
pub fn power_ratio_to_db(v: f64) -> Option<f64> {
    (v > 0.0 && v.is_finite()).then(|| 10.0 * v.log10())
}

/// FloatS16 power (per sample) of a signal whose magnitude sits at `dbfs`.
#[inline]
pub fn dbfs_to_float_s16_power(dbfs: f64) -> f64 {
    let amplitude = db_to_ratio(dbfs) * MAX_ABS_FLOAT_S16;
    amplitude * amplitude
}

// ── Slice conversions ───────────────────────────────────────────────

/// Widen a slice of S16 samples into FloatS16 `dest`.
///
/// # Panics
///
/// Panics if `src` and `dest` have different lengths.
pub fn s16_to_float_s16_slice(src: &[i16], dest: &mut [f64]) {
    assert_eq!(src.len(), dest.len(), "slice length mismatch");
    for (d, &s) in dest.iter_mut().zip(src) {
        *d = s16_to_float_s16(s);
    }
}

/// Round and saturate a slice of FloatS16 samples into S16 `dest`.
///
/// # Panics
///
/// Panics if `src` and `dest` have different lengths.
pub fn float_s16_to_s16_slice(src: &[f64], dest: &mut [i16]) {
    assert_eq!(src.len(), dest.len(), "slice length mismatch");
    for (d, &s) in dest.iter_mut().zip(src) {
        *d = float_s16_to_s16(s);
    }
}

/// Round and saturate a slice of `f32` FloatS16 samples into S16 `dest`.
///
/// # Panics
///
/// Panics if `src` and `dest` have different lengths.
pub fn float_s16_f32_to_s16_slice(src: &[f32], dest: &mut [i16]) {
    assert_eq!(src.len(), dest.len(), "slice length mismatch");
    for (d, &s) in dest.iter_mut().zip(src) {
        *d = float_s16_to_s16_f32(s);
    }
}

/// Sum of squares of a FloatS16 slice.
#[inline]
pub fn energy(x: &[f64]) -> f64 {
    x.iter().map(|&v| v * v).sum()
}

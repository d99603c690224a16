//! Comparison and level helpers for echo canceller outputs.

/// Mean power per sample of an i16 signal, in FloatS16 units.
pub fn mean_power_i16(x: &[i16]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    x.iter().map(|&v| f64::from(v) * f64::from(v)).sum::<f64>() / x.len() as f64
}

/// Power ratio of `before` to `after` in dB; positive when `after` is
/// quieter. A silent `after` is treated as a power of one.
pub fn attenuation_db(before: &[i16], after: &[i16]) -> f64 {
    let before = mean_power_i16(before).max(1.0);
    let after = mean_power_i16(after).max(1.0);
    10.0 * (before / after).log10()
}

/// Assert two i16 slices are bit-exact.
pub fn assert_i16_exact(actual: &[i16], expected: &[i16]) {
    assert_eq!(actual.len(), expected.len(), "Length mismatch");
    for (i, (&a, &e)) in actual.iter().zip(expected.iter()).enumerate() {
        assert_eq!(a, e, "Mismatch at index {i}: actual={a}, expected={e}");
    }
}

/// Assert every sample of `actual` is within `tolerance` of `expected`.
pub fn assert_i16_near(actual: &[i16], expected: &[i16], tolerance: i32) {
    assert_eq!(actual.len(), expected.len(), "Length mismatch");
    for (i, (&a, &e)) in actual.iter().zip(expected.iter()).enumerate() {
        let diff = (i32::from(a) - i32::from(e)).abs();
        assert!(
            diff <= tolerance,
            "Mismatch at index {i}: actual={a}, expected={e}, diff={diff}, tol={tolerance}",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_of_constant() {
        assert_eq!(mean_power_i16(&[3, -3, 3, -3]), 9.0);
        assert_eq!(mean_power_i16(&[]), 0.0);
    }

    #[test]
    fn attenuation_of_halved_signal() {
        let a = [1000i16; 8];
        let b = [500i16; 8];
        assert!((attenuation_db(&a, &b) - 6.0206).abs() < 1e-3);
        assert!((attenuation_db(&a, &[0; 8]) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn i16_exact_passes() {
        let a = [0i16, 1000, -1000, i16::MAX, i16::MIN];
        assert_i16_exact(&a, &a);
    }

    #[test]
    #[should_panic(expected = "Mismatch at index 1")]
    fn i16_exact_detects_diff() {
        assert_i16_exact(&[0, 1000], &[0, 1001]);
    }

    #[test]
    fn i16_near_tolerates_small_diffs() {
        assert_i16_near(&[10, -10], &[11, -12], 2);
    }

    #[test]
    #[should_panic(expected = "Mismatch at index 0")]
    fn i16_near_rejects_large_diffs() {
        assert_i16_near(&[10], &[20], 2);
    }
}

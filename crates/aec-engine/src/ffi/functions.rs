//! Exported `extern "C"` functions for the echo canceller C API.
//!
//! # Symbol prefix
//!
//! All public symbols use the `aec_` prefix. The legacy CamelCase names
//! (`AecNew`, `AecCancelEcho`, `AecDestroy`) are exported as well and
//! forward to the prefixed functions.

use std::{ptr, slice};

use crate::EchoCanceller;

use super::panic_guard::ffi_guard;
use super::types::{Aec, AecError};

// ─── Version ─────────────────────────────────────────────────────────

/// Returns a pointer to a static null-terminated version string.
///
/// The returned pointer is valid for the lifetime of the process.
#[unsafe(no_mangle)]
pub extern "C" fn aec_version() -> *const std::ffi::c_char {
    c"0.1.0".as_ptr()
}

// ─── Lifecycle ───────────────────────────────────────────────────────

/// Creates a new echo canceller.
///
/// `frame_size` is the number of samples per call to [`aec_cancel_echo()`],
/// `filter_length` the echo tail in samples. Returns `NULL` if a parameter
/// is out of range or on internal error. The caller owns the returned
/// pointer and must free it with [`aec_destroy()`].
#[unsafe(no_mangle)]
pub extern "C" fn aec_new(
    frame_size: usize,
    filter_length: i32,
    sample_rate: u32,
    enable_preprocess: bool,
) -> *mut Aec {
    ffi_guard! { or ptr::null_mut();
        let Ok(filter_length) = usize::try_from(filter_length) else {
            tracing::warn!(filter_length, "negative filter length");
            return ptr::null_mut();
        };
        match EchoCanceller::new(frame_size, filter_length, sample_rate, enable_preprocess) {
            Ok(inner) => Box::into_raw(Box::new(Aec { inner })),
            Err(_) => ptr::null_mut(),
        }
    }
}

/// Destroys an echo canceller and frees its memory.
///
/// Passing `NULL` is a safe no-op. After this call the pointer is invalid;
/// destroying it again is undefined behaviour.
#[unsafe(no_mangle)]
pub extern "C" fn aec_destroy(aec: *mut Aec) {
    if !aec.is_null() {
        // Safety: the pointer came from Box::into_raw in aec_new, and the
        // caller guarantees single ownership.
        let _ = unsafe { Box::from_raw(aec) };
    }
}

// ─── Processing ──────────────────────────────────────────────────────

fn overlaps(a: *const i16, b: *const i16, len: usize) -> bool {
    let bytes = len * size_of::<i16>();
    let (a, b) = (a as usize, b as usize);
    a < b + bytes && b < a + bytes
}

/// Removes the echo of `echo_buffer` (the far-end signal sent to the
/// loudspeaker) from `rec_buffer` (the microphone signal) and writes the
/// result to `out_buffer`.
///
/// All buffers hold `buffer_length` samples, which must equal the frame
/// size given to [`aec_new()`]. `out_buffer` may be the same pointer as
/// `rec_buffer` for in-place processing; any other overlap between the
/// output and an input is rejected.
///
/// Returns `AecError::NullPointer` if any pointer is null,
/// `AecError::BadFrameLength` on a length mismatch and
/// `AecError::OverlappingBuffers` on a rejected overlap. On error the
/// instance state and `out_buffer` are left untouched.
#[unsafe(no_mangle)]
pub extern "C" fn aec_cancel_echo(
    aec: *mut Aec,
    rec_buffer: *const i16,
    echo_buffer: *const i16,
    out_buffer: *mut i16,
    buffer_length: usize,
) -> AecError {
    ffi_guard! {
        if aec.is_null() || rec_buffer.is_null() || echo_buffer.is_null() || out_buffer.is_null() {
            return AecError::NullPointer;
        }
        // Safety: the caller guarantees the pointer is valid and not aliased.
        let aec = unsafe { &mut *aec };
        if buffer_length != aec.inner.frame_size() {
            return AecError::BadFrameLength;
        }

        let out = out_buffer.cast_const();
        let in_place = out == rec_buffer;
        if (!in_place && overlaps(out, rec_buffer, buffer_length))
            || overlaps(out, echo_buffer, buffer_length)
        {
            return AecError::OverlappingBuffers;
        }

        // Safety: the caller guarantees each pointer addresses
        // `buffer_length` valid samples, and the output does not alias the
        // reference or (unless identical) the capture buffer.
        let reference = unsafe { slice::from_raw_parts(echo_buffer, buffer_length) };
        let output = unsafe { slice::from_raw_parts_mut(out_buffer, buffer_length) };
        let result = if in_place {
            aec.inner.process_in_place(reference, output)
        } else {
            let capture = unsafe { slice::from_raw_parts(rec_buffer, buffer_length) };
            aec.inner.process(reference, capture, output)
        };
        match result {
            Ok(()) => AecError::None,
            Err(err) => err.into(),
        }
    }
}

// ─── Legacy names ────────────────────────────────────────────────────

/// Same as [`aec_new()`].
#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub extern "C" fn AecNew(
    frame_size: usize,
    filter_length: i32,
    sample_rate: u32,
    enable_preprocess: bool,
) -> *mut Aec {
    aec_new(frame_size, filter_length, sample_rate, enable_preprocess)
}

/// Same as [`aec_cancel_echo()`].
///
/// Legacy headers declare this function `void`. It returns the same
/// [`AecError`] code as `aec_cancel_echo`, which such callers ignore.
#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub extern "C" fn AecCancelEcho(
    aec: *mut Aec,
    rec_buffer: *const i16,
    echo_buffer: *const i16,
    out_buffer: *mut i16,
    buffer_length: usize,
) -> AecError {
    aec_cancel_echo(aec, rec_buffer, echo_buffer, out_buffer, buffer_length)
}

/// Same as [`aec_destroy()`].
#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub extern "C" fn AecDestroy(aec: *mut Aec) {
    aec_destroy(aec)
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::ffi::CStr;

    use super::*;

    const FRAME: usize = 160;

    fn frame(seed: i16) -> Vec<i16> {
        (0..FRAME as i16).map(|i| (i * 37 + seed) % 2000 - 1000).collect()
    }

    #[test]
    fn version_is_static_string() {
        let version = unsafe { CStr::from_ptr(aec_version()) };
        assert_eq!(version.to_str().unwrap(), "0.1.0");
    }

    #[test]
    fn new_and_destroy() {
        let aec = aec_new(FRAME, 1024, 16000, true);
        assert!(!aec.is_null());
        aec_destroy(aec);
    }

    #[test]
    fn new_rejects_invalid_parameters() {
        assert!(aec_new(0, 1024, 16000, false).is_null());
        assert!(aec_new(FRAME, 0, 16000, false).is_null());
        assert!(aec_new(FRAME, -5, 16000, false).is_null());
        assert!(aec_new(FRAME, 1024, 1000, false).is_null());
    }

    #[test]
    fn destroy_null_is_safe() {
        aec_destroy(ptr::null_mut());
    }

    #[test]
    fn null_pointers_are_rejected() {
        let aec = aec_new(FRAME, 256, 16000, false);
        let rec = frame(1);
        let echo = frame(2);
        let mut out = vec![0i16; FRAME];
        assert_eq!(
            aec_cancel_echo(ptr::null_mut(), rec.as_ptr(), echo.as_ptr(), out.as_mut_ptr(), FRAME),
            AecError::NullPointer
        );
        assert_eq!(
            aec_cancel_echo(aec, ptr::null(), echo.as_ptr(), out.as_mut_ptr(), FRAME),
            AecError::NullPointer
        );
        assert_eq!(
            aec_cancel_echo(aec, rec.as_ptr(), ptr::null(), out.as_mut_ptr(), FRAME),
            AecError::NullPointer
        );
        assert_eq!(
            aec_cancel_echo(aec, rec.as_ptr(), echo.as_ptr(), ptr::null_mut(), FRAME),
            AecError::NullPointer
        );
        aec_destroy(aec);
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let aec = aec_new(FRAME, 256, 16000, false);
        let rec = frame(1);
        let echo = frame(2);
        let mut out = vec![7i16; FRAME];
        assert_eq!(
            aec_cancel_echo(aec, rec.as_ptr(), echo.as_ptr(), out.as_mut_ptr(), FRAME - 1),
            AecError::BadFrameLength
        );
        assert!(out.iter().all(|&s| s == 7));
        assert_eq!(unsafe { &*aec }.inner.stats().frames_processed, 0);
        aec_destroy(aec);
    }

    #[test]
    fn matches_rust_api() {
        let aec = aec_new(FRAME, 256, 16000, true);
        let mut rust = EchoCanceller::new(FRAME, 256, 16000, true).unwrap();
        let mut out = vec![0i16; FRAME];
        let mut expected = vec![0i16; FRAME];
        for k in 0..20 {
            let rec = frame(k);
            let echo = frame(3 * k + 1);
            let err = aec_cancel_echo(aec, rec.as_ptr(), echo.as_ptr(), out.as_mut_ptr(), FRAME);
            assert_eq!(err, AecError::None);
            rust.process(&echo, &rec, &mut expected).unwrap();
            assert_eq!(out, expected);
        }
        aec_destroy(aec);
    }

    #[test]
    fn in_place_matches_separate_output() {
        let a = aec_new(FRAME, 256, 16000, false);
        let b = aec_new(FRAME, 256, 16000, false);
        for k in 0..10 {
            let rec = frame(k);
            let echo = frame(k + 5);
            let mut out = vec![0i16; FRAME];
            let mut buf = rec.clone();
            assert_eq!(
                aec_cancel_echo(a, rec.as_ptr(), echo.as_ptr(), out.as_mut_ptr(), FRAME),
                AecError::None
            );
            assert_eq!(
                aec_cancel_echo(b, buf.as_ptr(), echo.as_ptr(), buf.as_mut_ptr(), FRAME),
                AecError::None
            );
            assert_eq!(out, buf);
        }
        aec_destroy(a);
        aec_destroy(b);
    }

    #[test]
    fn partial_overlap_is_rejected() {
        let aec = aec_new(FRAME, 256, 16000, false);
        let mut buf = vec![0i16; 2 * FRAME];
        let echo = frame(2);
        let base = buf.as_mut_ptr();
        // Output shifted by one sample against the capture buffer.
        let err = aec_cancel_echo(aec, base.cast_const(), echo.as_ptr(), unsafe { base.add(1) }, FRAME);
        assert_eq!(err, AecError::OverlappingBuffers);

        // Output over the reference.
        let mut reference = frame(3);
        let rec = frame(4);
        let err = aec_cancel_echo(
            aec,
            rec.as_ptr(),
            reference.as_ptr(),
            reference.as_mut_ptr(),
            FRAME,
        );
        assert_eq!(err, AecError::OverlappingBuffers);
        assert_eq!(unsafe { &*aec }.inner.stats().frames_processed, 0);
        aec_destroy(aec);
    }

    #[test]
    fn overlap_detection() {
        let buf = [0i16; 8];
        let p = buf.as_ptr();
        assert!(overlaps(p, p, 4));
        assert!(overlaps(p, unsafe { p.add(3) }, 4));
        assert!(!overlaps(p, unsafe { p.add(4) }, 4));
        assert!(!overlaps(unsafe { p.add(4) }, p, 4));
    }

    #[test]
    fn legacy_names_forward() {
        assert!(AecNew(FRAME, -1, 16000, false).is_null());
        let aec = AecNew(FRAME, 256, 16000, false);
        let reference = aec_new(FRAME, 256, 16000, false);
        assert!(!aec.is_null());

        let mut out = vec![0i16; FRAME];
        let mut expected = vec![0i16; FRAME];
        for k in 0..5 {
            let rec = frame(k);
            let echo = frame(k + 9);
            assert_eq!(
                AecCancelEcho(aec, rec.as_ptr(), echo.as_ptr(), out.as_mut_ptr(), FRAME),
                AecError::None
            );
            let err = aec_cancel_echo(reference, rec.as_ptr(), echo.as_ptr(), expected.as_mut_ptr(), FRAME);
            assert_eq!(err, AecError::None);
            assert_eq!(out, expected);
        }
        let echo = frame(1);
        assert_eq!(
            AecCancelEcho(aec, ptr::null(), echo.as_ptr(), out.as_mut_ptr(), FRAME),
            AecError::NullPointer
        );

        AecDestroy(aec);
        AecDestroy(ptr::null_mut());
        aec_destroy(reference);
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(AecError::None as i32, 0);
        assert_eq!(AecError::NullPointer as i32, -1);
        assert_eq!(AecError::Internal as i32, -2);
        assert_eq!(AecError::BadFrameLength as i32, -3);
        assert_eq!(AecError::OverlappingBuffers as i32, -4);
    }
}

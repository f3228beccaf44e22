//! Pure gesture math: offset in, feedback or decision out.

use crate::domain::model::{Decision, Feedback};

pub const DEFAULT_THRESHOLD: f64 = 100.0;
pub const MAX_ROTATION_DEG: f64 = 25.0;
/// Offset at which rotation saturates and the card is fully faded.
pub const ROTATION_SPAN: f64 = 200.0;

/// NaN carries no direction, so it is read as "no movement".
fn sanitize(offset: f64) -> f64 {
    if offset.is_nan() {
        0.0
    } else {
        offset
    }
}

/// Thresholds that are zero, negative or not finite would make every tap a
/// decision and the intensities NaN; they fall back to [`DEFAULT_THRESHOLD`].
pub fn effective_threshold(threshold: f64) -> f64 {
    if threshold.is_finite() && threshold > 0.0 {
        threshold
    } else {
        DEFAULT_THRESHOLD
    }
}

/// Piecewise-linear mapping clamped to the first and last output values.
/// `input` must be ascending and the same length as `output`.
fn interpolate(x: f64, input: &[f64], output: &[f64]) -> f64 {
    debug_assert_eq!(input.len(), output.len());
    let last = input.len() - 1;
    if x <= input[0] {
        return output[0];
    }
    if x >= input[last] {
        return output[last];
    }
    for i in 0..last {
        let (x0, x1) = (input[i], input[i + 1]);
        if x <= x1 {
            let t = (x - x0) / (x1 - x0);
            return output[i] + t * (output[i + 1] - output[i]);
        }
    }
    output[last]
}

pub fn yes_intensity(offset: f64, threshold: f64) -> f64 {
    (sanitize(offset) / effective_threshold(threshold)).clamp(0.0, 1.0)
}

pub fn no_intensity(offset: f64, threshold: f64) -> f64 {
    (-sanitize(offset) / effective_threshold(threshold)).clamp(0.0, 1.0)
}

pub fn rotation(offset: f64) -> f64 {
    interpolate(
        sanitize(offset),
        &[-ROTATION_SPAN, ROTATION_SPAN],
        &[-MAX_ROTATION_DEG, MAX_ROTATION_DEG],
    )
}

/// Fully opaque between the thresholds, fading out toward the rotation span.
pub fn opacity(offset: f64, threshold: f64) -> f64 {
    let threshold = effective_threshold(threshold);
    let fade_end = ROTATION_SPAN.max(threshold * 2.0);
    interpolate(
        sanitize(offset),
        &[-fade_end, -threshold, 0.0, threshold, fade_end],
        &[0.0, 1.0, 1.0, 1.0, 0.0],
    )
}

pub fn feedback(offset: f64, threshold: f64) -> Feedback {
    Feedback {
        offset: sanitize(offset),
        rotation: rotation(offset),
        yes_intensity: yes_intensity(offset, threshold),
        no_intensity: no_intensity(offset, threshold),
        opacity: opacity(offset, threshold),
    }
}

/// Decision for a released gesture; `None` means spring back.
pub fn classify(offset: f64, threshold: f64) -> Option<Decision> {
    let offset = sanitize(offset);
    let threshold = effective_threshold(threshold);
    if offset >= threshold {
        Some(Decision::Yes)
    } else if offset <= -threshold {
        Some(Decision::No)
    } else {
        None
    }
}

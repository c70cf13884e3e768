//! WCAG 2.1 relative luminance and contrast ratio.
//!
//! Everything here is a pure function of 8-bit sRGB input:
//!
//! - [`srgb_channel_to_linear`] removes the sRGB gamma curve
//! - [`relative_luminance`] weights the linear channels
//! - [`contrast_ratio`] compares two luminances
//!
//! The transfer function uses the 0.03928 breakpoint exactly as published in
//! WCAG 2.x, not the 0.04045 of the sRGB standard. The two only differ for
//! channel values 10 and below, but conformance checkers compare against the
//! WCAG figure.

use pa_color::Rgb;

/// Threshold for normal-size text at level AA.
pub const AA_NORMAL: f64 = 4.5;

/// Threshold for large text (>= 18pt, or 14pt bold) at level AA.
pub const AA_LARGE: f64 = 3.0;

/// Threshold for normal-size text at level AAA.
pub const AAA_NORMAL: f64 = 7.0;

/// Threshold for large text at level AAA.
pub const AAA_LARGE: f64 = 4.5;

/// Convert one 8-bit sRGB channel to linear light in [0.0, 1.0].
#[must_use]
pub fn srgb_channel_to_linear(c: u8) -> f64 {
    let v = f64::from(c) / 255.0;
    if v <= 0.039_28 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// Compute the relative luminance of a color per WCAG 2.1.
///
///   L = 0.2126 * `R_lin` + 0.7152 * `G_lin` + 0.0722 * `B_lin`
///
/// Returns exactly 0.0 for black and exactly 1.0 for white.
#[must_use]
pub fn relative_luminance(color: Rgb) -> f64 {
    let [r_lin, g_lin, b_lin] = color.channels().map(srgb_channel_to_linear);
    0.2126f64.mul_add(r_lin, 0.7152f64.mul_add(g_lin, 0.0722 * b_lin))
}

/// Contrast ratio of two relative luminances, in [1.0, 21.0].
///
///   (`L_lighter` + 0.05) / (`L_darker` + 0.05)
#[must_use]
pub fn ratio_from_luminance(la: f64, lb: f64) -> f64 {
    let (lighter, darker) = if la >= lb { (la, lb) } else { (lb, la) };
    (lighter + 0.05) / (darker + 0.05)
}

/// Compute the WCAG 2.1 contrast ratio between two colors.
///
/// Symmetric in its arguments and always >= 1.0.
#[must_use]
pub fn contrast_ratio(a: Rgb, b: Rgb) -> f64 {
    ratio_from_luminance(relative_luminance(a), relative_luminance(b))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

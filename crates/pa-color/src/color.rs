// SPDX-License-Identifier: MIT
//
// Color literals → 8-bit sRGB.
//
// Accepted forms (after trimming):
//
//   #rgb  #rrggbb  #rrggbbaa      hex, `#` optional, alpha byte dropped
//   rgb(r, g, b)                  integer or float channels, truncated
//   rgba(r, g, b, a)              alpha validated, then dropped
//   r,g,b                         bare integer triple
//
// Channel values from the functional forms are truncated toward zero and
// clamped into 0–255, matching how browsers clamp out-of-range rgb().
#![allow(clippy::many_single_char_names)]

use std::fmt;
use std::str::FromStr;

// ─── FormatError ─────────────────────────────────────────────────────────────

/// Why a literal could not be decoded into an [`Rgb`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// A hex literal with a digit count other than 3, 6, or 8.
    #[error("hex literal `{literal}` has {digits} digits, expected 3, 6, or 8")]
    HexLength { literal: String, digits: usize },

    /// A hex literal containing a non-hex character.
    #[error("hex literal `{0}` contains a non-hex digit")]
    HexDigit(String),

    /// A functional or bare-triple literal with the wrong number of arguments.
    #[error("`{literal}` has {found} channels, expected {expected}")]
    ChannelCount {
        literal: String,
        found: usize,
        expected: &'static str,
    },

    /// A channel that is not a finite number (or not an integer in a bare triple).
    #[error("invalid channel `{channel}` in `{literal}`")]
    Channel { literal: String, channel: String },

    /// Not a color literal this codec understands.
    #[error("unrecognized color literal `{0}`")]
    Unrecognized(String),
}

// ─── Rgb ─────────────────────────────────────────────────────────────────────

/// An opaque 8-bit sRGB color.
///
/// # Examples
///
/// ```
/// use pa_color::Rgb;
///
/// let walnut: Rgb = "#553915".parse().unwrap();
/// assert_eq!(walnut, Rgb::new(0x55, 0x39, 0x15));
/// assert_eq!(walnut.to_hex(), "#553915");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Pure black.
    pub const BLACK: Self = Self::new(0, 0, 0);

    /// Pure white.
    pub const WHITE: Self = Self::new(255, 255, 255);

    #[inline]
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// The channels as `[r, g, b]`.
    #[inline]
    #[must_use]
    pub const fn channels(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Lowercase `#rrggbb`.
    #[must_use]
    pub fn to_hex(self) -> String {
        let Self { r, g, b } = self;
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    /// Per-channel mean of two colors, rounded down.
    ///
    /// Used to approximate a composite background (e.g. the midpoint of a
    /// two-stop gradient) as a single flat color.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn average(self, other: Self) -> Self {
        let mid = |a: u8, b: u8| ((u16::from(a) + u16::from(b)) / 2) as u8;
        Self::new(mid(self.r, other.r), mid(self.g, other.g), mid(self.b, other.b))
    }

    /// Multiply every channel by `factor`, truncating and clamping to 0–255.
    #[must_use]
    pub fn scale(self, factor: f64) -> Self {
        let s = |c: u8| clamp_channel(f64::from(c) * factor);
        Self::new(s(self.r), s(self.g), s(self.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { r, g, b } = *self;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

impl FromStr for Rgb {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s)
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::new(r, g, b)
    }
}

impl From<Rgb> for (u8, u8, u8) {
    fn from(c: Rgb) -> Self {
        (c.r, c.g, c.b)
    }
}

// ─── Decoding ────────────────────────────────────────────────────────────────

/// Decode a color literal into an [`Rgb`], discarding any alpha.
///
/// # Errors
///
/// Returns a [`FormatError`] describing why `literal` is not a supported
/// hex, `rgb()`/`rgba()`, or bare `r,g,b` literal.
pub fn decode(literal: &str) -> Result<Rgb, FormatError> {
    let s = literal.trim();

    if let Some(digits) = s.strip_prefix('#') {
        return decode_hex(digits, s);
    }

    if is_functional(s) {
        return functional_args(s).map_or_else(
            || Err(FormatError::Unrecognized(s.to_string())),
            |args| decode_functional(args, s),
        );
    }

    if s.contains(',') {
        return decode_triple(s);
    }

    // `#` is optional for hex, but only for the three legal lengths.
    if matches!(s.len(), 3 | 6 | 8) && s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return decode_hex(s, s);
    }

    Err(FormatError::Unrecognized(s.to_string()))
}

fn decode_hex(digits: &str, literal: &str) -> Result<Rgb, FormatError> {
    let bytes = digits.as_bytes();
    if !matches!(bytes.len(), 3 | 6 | 8) {
        return Err(FormatError::HexLength {
            literal: literal.to_string(),
            digits: bytes.len(),
        });
    }

    let bad_digit = || FormatError::HexDigit(literal.to_string());
    let nib = |i: usize| bytes.get(i).copied().and_then(hex_nibble).ok_or_else(bad_digit);

    if bytes.len() == 3 {
        // #f80 → #ff8800
        let (r, g, b) = (nib(0)?, nib(1)?, nib(2)?);
        return Ok(Rgb::new(r * 17, g * 17, b * 17));
    }

    // The trailing alpha pair of an 8-digit literal must still be hex.
    for i in 6..bytes.len() {
        nib(i)?;
    }
    let byte = |i: usize| -> Result<u8, FormatError> { Ok((nib(i)? << 4) | nib(i + 1)?) };
    Ok(Rgb::new(byte(0)?, byte(2)?, byte(4)?))
}

const fn hex_nibble(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn is_functional(s: &str) -> bool {
    s.get(..3).is_some_and(|name| name.eq_ignore_ascii_case("rgb"))
}

/// The text between the parentheses of an `rgb(...)` or `rgba(...)` call.
fn functional_args(s: &str) -> Option<&str> {
    let rest = &s[3..];
    let rest = rest.strip_prefix(['a', 'A']).unwrap_or(rest);
    rest.trim_start().strip_prefix('(')?.trim_end().strip_suffix(')')
}

fn decode_functional(args: &str, literal: &str) -> Result<Rgb, FormatError> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if !matches!(parts.len(), 3 | 4) {
        return Err(FormatError::ChannelCount {
            literal: literal.to_string(),
            found: parts.len(),
            expected: "3 or 4",
        });
    }

    let channel = |part: &str| -> Result<u8, FormatError> {
        part.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(clamp_channel)
            .ok_or_else(|| FormatError::Channel {
                literal: literal.to_string(),
                channel: part.to_string(),
            })
    };

    // An empty slot is a malformed call.
    if parts.iter().any(|p| p.is_empty()) {
        return Err(FormatError::Channel {
            literal: literal.to_string(),
            channel: String::new(),
        });
    }

    // Alpha is dropped, but it must still be a number or a percentage.
    if let Some(&alpha) = parts.get(3) {
        let number = alpha.strip_suffix('%').unwrap_or(alpha);
        if !number.parse::<f64>().is_ok_and(f64::is_finite) {
            return Err(FormatError::Channel {
                literal: literal.to_string(),
                channel: alpha.to_string(),
            });
        }
    }

    Ok(Rgb::new(channel(parts[0])?, channel(parts[1])?, channel(parts[2])?))
}

fn decode_triple(s: &str) -> Result<Rgb, FormatError> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [r, g, b] = parts.as_slice() else {
        return Err(FormatError::ChannelCount {
            literal: s.to_string(),
            found: parts.len(),
            expected: "3",
        });
    };

    let channel = |part: &str| {
        part.parse::<u8>().map_err(|_| FormatError::Channel {
            literal: s.to_string(),
            channel: part.to_string(),
        })
    };
    Ok(Rgb::new(channel(r)?, channel(g)?, channel(b)?))
}

/// Truncate toward zero, then clamp into a channel.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_channel(v: f64) -> u8 {
    v.trunc().clamp(0.0, 255.0) as u8
}

// ─── Tests ───────────────────────────────────────────────────────────────────

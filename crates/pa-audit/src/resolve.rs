//! Token resolution: following `var(--name)` chains down to a color.
//!
//! A token's value is one of:
//!
//! - a reference, `var(--other)`, which is followed
//! - a gradient (or a `var()` with a fallback), which cannot be flattened
//!   into one color and is rejected as unsupported
//! - anything else, which is handed to the color codec
//!
//! Every reference hop spends one unit of a depth budget. A chain of at
//! most `max_depth` hops resolves; a longer chain, and therefore every
//! cycle, stops with [`Unresolved::DepthExceeded`]. The walk is a loop, so
//! neither long chains nor cycles grow the stack.
//!
//! Failures are values, not panics: an audit over a half-broken palette
//! still reports on every pair it can evaluate.

use std::sync::LazyLock;

use pa_color::{FormatError, Rgb, decode};
use regex::Regex;
use tracing::debug;

use crate::tokens::TokenMap;

/// Default number of reference hops followed before giving up.
pub const DEFAULT_MAX_DEPTH: u32 = 10;

static VAR_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^var\(\s*--([A-Za-z0-9_-]+)\s*\)$").expect("var() pattern is valid")
});

static UNSUPPORTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:(?:repeating-)?(?:linear|radial|conic)-gradient\s*\(|var\s*\()")
        .expect("unsupported-value pattern is valid")
});

// ---------------------------------------------------------------------------
// Unresolved
// ---------------------------------------------------------------------------

/// Why a token, pair, or correction could not be turned into a color.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Unresolved {
    /// The token is not declared.
    #[error("`--{0}` is not declared")]
    Missing(String),

    /// The alias chain ran past the depth budget (or loops).
    #[error("reference chain exceeded {max_depth} hops at `--{at}`")]
    DepthExceeded { at: String, max_depth: u32 },

    /// A gradient or other value that is not one flat color.
    #[error("`{value}` is not a flat color")]
    Unsupported { value: String },

    /// A literal the color codec rejected.
    #[error("`{value}` is malformed")]
    Malformed {
        value: String,
        #[source]
        source: FormatError,
    },

    /// Darkening never reached the threshold.
    #[error(
        "{iterations} darkening passes reach {best_ratio:.2}:1, short of {threshold}:1"
    )]
    CouldNotRemediate {
        threshold: f64,
        iterations: u32,
        best_ratio: f64,
    },
}

impl Unresolved {
    /// Short machine-readable reason.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::Missing(_) => "missing",
            Self::DepthExceeded { .. } => "depth exceeded",
            Self::Unsupported { .. } => "unsupported value",
            Self::Malformed { .. } => "malformed",
            Self::CouldNotRemediate { .. } => "could not remediate",
        }
    }
}

// ---------------------------------------------------------------------------
// Value classification
// ---------------------------------------------------------------------------

enum Value<'v> {
    Reference(&'v str),
    Unsupported,
    Literal,
}

fn classify(value: &str) -> Value<'_> {
    let v = value.trim();
    if let Some(name) = VAR_REF.captures(v).and_then(|caps| caps.get(1)) {
        return Value::Reference(name.as_str());
    }
    if UNSUPPORTED.is_match(v) {
        return Value::Unsupported;
    }
    Value::Literal
}

/// Follow `value` until it is a literal. Returns the name of the token that
/// declared the literal (`None` when `value` itself is one) with its color.
fn walk<'t>(
    mut value: &'t str,
    mut origin: Option<&'t str>,
    tokens: &'t TokenMap,
    max_depth: u32,
) -> Result<(Option<&'t str>, Rgb), Unresolved> {
    let mut hops = 0;

    loop {
        match classify(value) {
            Value::Reference(next) => {
                if hops == max_depth {
                    return Err(Unresolved::DepthExceeded {
                        at: origin.unwrap_or(next).to_string(),
                        max_depth,
                    });
                }
                hops += 1;
                let (name, next_value) = tokens
                    .declaration(next)
                    .ok_or_else(|| Unresolved::Missing(next.to_string()))?;
                origin = Some(name);
                value = next_value;
            }
            Value::Unsupported => {
                return Err(Unresolved::Unsupported {
                    value: value.trim().to_string(),
                });
            }
            Value::Literal => {
                return decode(value).map(|color| (origin, color)).map_err(|source| {
                    Unresolved::Malformed {
                        value: value.trim().to_string(),
                        source,
                    }
                });
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Resolve token `name` to a color, following at most `max_depth` references.
///
/// # Errors
///
/// [`Unresolved`] when the token (or a token it references) is missing, the
/// chain is too deep or cyclic, the value is a gradient, or the final
/// literal is malformed.
pub fn resolve(name: &str, tokens: &TokenMap, max_depth: u32) -> Result<Rgb, Unresolved> {
    let (key, value) = tokens
        .declaration(name)
        .ok_or_else(|| Unresolved::Missing(name.trim().trim_start_matches('-').to_string()))?;
    walk(value, Some(key), tokens, max_depth)
        .map(|(_, color)| color)
        .inspect_err(|e| debug!(token = key, reason = e.reason(), "{e}"))
}

/// Resolve a raw declared value (as it would appear after `--name:`).
///
/// # Errors
///
/// Same as [`resolve`].
pub fn resolve_value(value: &str, tokens: &TokenMap, max_depth: u32) -> Result<Rgb, Unresolved> {
    walk(value, None, tokens, max_depth).map(|(_, color)| color)
}

/// The name of the token whose declaration holds the literal that `name`
/// finally resolves to. `name` itself when it is declared as a literal.
///
/// # Errors
///
/// Same as [`resolve`]; a token that does not resolve has no origin.
pub fn origin(name: &str, tokens: &TokenMap, max_depth: u32) -> Result<String, Unresolved> {
    let (key, value) = tokens
        .declaration(name)
        .ok_or_else(|| Unresolved::Missing(name.trim().trim_start_matches('-').to_string()))?;
    let (found, _) = walk(value, Some(key), tokens, max_depth)?;
    Ok(found.unwrap_or(key).to_string())
}

/// Resolve two tokens and blend them with [`Rgb::average`].
///
/// Approximates a background composed from two sources, such as a
/// two-stop gradient header.
///
/// # Errors
///
/// The first [`Unresolved`] of either side.
pub fn average(
    name_a: &str,
    name_b: &str,
    tokens: &TokenMap,
    max_depth: u32,
) -> Result<Rgb, Unresolved> {
    let a = resolve(name_a, tokens, max_depth)?;
    let b = resolve(name_b, tokens, max_depth)?;
    Ok(a.average(b))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

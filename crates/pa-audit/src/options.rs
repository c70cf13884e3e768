//! Audit options and the `name=value` directive syntax that sets them.
//!
//! Every tunable of an audit run lives on [`AuditOptions`] and is passed in
//! explicitly; nothing in the engine reads a global.
//!
//! # Directive syntax
//!
//! | Syntax        | Effect                                   |
//! |---------------|------------------------------------------|
//! | `option`      | Enable a boolean option                  |
//! | `nooption`    | Disable a boolean option                 |
//! | `option=N`    | Assign a numeric value                   |
//!
//! # Option names
//!
//! | Full name    | Abbrev | Type    | Default |
//! |--------------|--------|---------|---------|
//! | `threshold`  | `th`   | float   | 4.5     |
//! | `darken`     | `df`   | float   | 0.75    |
//! | `iterations` | `it`   | integer | 5       |
//! | `depth`      | `dp`   | integer | 10      |
//! | `fixes`      | `fx`   | bool    | true    |
//! | `large`      |        | bool    | false   |
//!
//! `large` is shorthand for the WCAG AA large-text threshold (3.0);
//! `nolarge` restores the normal-text threshold (4.5).

use crate::contrast::{AA_LARGE, AA_NORMAL};
use crate::resolve::DEFAULT_MAX_DEPTH;

/// Default channel multiplier for one darkening pass (a 25% reduction).
pub const DEFAULT_DARKEN_FACTOR: f64 = 0.75;

/// Default number of darkening passes before a correction is abandoned.
pub const DEFAULT_MAX_ITERATIONS: u32 = 5;

/// Knobs for one audit run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuditOptions {
    /// Minimum passing contrast ratio.
    pub threshold: f64,
    /// Channel multiplier applied per remediation pass, in (0, 1).
    pub darken_factor: f64,
    /// Remediation passes before giving up.
    pub max_iterations: u32,
    /// Reference hops followed when resolving a token.
    pub max_depth: u32,
    /// Attach a proposed correction to every failing pair.
    pub suggest_fixes: bool,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            threshold: AA_NORMAL,
            darken_factor: DEFAULT_DARKEN_FACTOR,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_depth: DEFAULT_MAX_DEPTH,
            suggest_fixes: true,
        }
    }
}

/// A rejected directive.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionError {
    #[error("unknown option: {0}")]
    Unknown(String),

    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("{0} needs a value ({0}=...)")]
    MissingValue(&'static str),
}

/// One parsed directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `option`: enable a boolean option.
    On(String),

    /// `nooption`: disable a boolean option.
    Off(String),

    /// `option=value`: assign a value.
    Assign(String, String),
}

/// Parse whitespace-separated directives (`threshold=3 nofixes`).
#[must_use]
pub fn parse_directives(args: &str) -> Vec<Directive> {
    args.split_whitespace().map(parse_directive).collect()
}

/// Parse a single directive.
#[must_use]
pub fn parse_directive(arg: &str) -> Directive {
    if let Some((name, value)) = arg.split_once('=') {
        return Directive::Assign(name.to_string(), value.to_string());
    }

    // `no` prefix only counts when the rest is a known boolean, so an option
    // that happens to start with "no" is never misread.
    if let Some(name) = arg.strip_prefix("no") {
        if is_bool_option(name) {
            return Directive::Off(name.to_string());
        }
    }

    Directive::On(arg.to_string())
}

/// Resolve an abbreviation to its full option name.
#[must_use]
pub fn full_name(name: &str) -> Option<&'static str> {
    match name {
        "threshold" | "th" => Some("threshold"),
        "darken" | "df" => Some("darken"),
        "iterations" | "it" => Some("iterations"),
        "depth" | "dp" => Some("depth"),
        "fixes" | "fx" => Some("fixes"),
        "large" => Some("large"),
        _ => None,
    }
}

/// Returns `true` if `name` is a known boolean option (full name or abbreviation).
#[must_use]
pub fn is_bool_option(name: &str) -> bool {
    matches!(full_name(name), Some("fixes" | "large"))
}

impl AuditOptions {
    /// Apply one directive.
    ///
    /// # Errors
    ///
    /// [`OptionError`] for an unknown name, a value that does not parse or
    /// is out of range, or a boolean/numeric mismatch.
    pub fn apply(&mut self, directive: &Directive) -> Result<(), OptionError> {
        match directive {
            Directive::On(name) | Directive::Off(name) => {
                let on = matches!(directive, Directive::On(_));
                match full_name(name) {
                    Some("fixes") => self.suggest_fixes = on,
                    Some("large") => self.threshold = if on { AA_LARGE } else { AA_NORMAL },
                    Some(numeric) => return Err(OptionError::MissingValue(numeric)),
                    None => return Err(OptionError::Unknown(name.clone())),
                }
            }
            Directive::Assign(name, value) => {
                let full = full_name(name).ok_or_else(|| OptionError::Unknown(name.clone()))?;
                let invalid = || OptionError::InvalidValue {
                    name: full,
                    value: value.clone(),
                };
                match full {
                    "threshold" => {
                        self.threshold = value
                            .parse::<f64>()
                            .ok()
                            .filter(|t| (1.0..=21.0).contains(t))
                            .ok_or_else(invalid)?;
                    }
                    "darken" => {
                        self.darken_factor = value
                            .parse::<f64>()
                            .ok()
                            .filter(|f| *f > 0.0 && *f < 1.0)
                            .ok_or_else(invalid)?;
                    }
                    "iterations" => self.max_iterations = value.parse().map_err(|_| invalid())?,
                    "depth" => self.max_depth = value.parse().map_err(|_| invalid())?,
                    // Booleans take no value.
                    _ => return Err(invalid()),
                }
            }
        }
        Ok(())
    }

    /// Apply directives in order, stopping at the first error.
    ///
    /// # Errors
    ///
    /// The first [`OptionError`].
    pub fn apply_all<'a>(
        &mut self,
        directives: impl IntoIterator<Item = &'a Directive>,
    ) -> Result<(), OptionError> {
        directives.into_iter().try_for_each(|d| self.apply(d))
    }
}

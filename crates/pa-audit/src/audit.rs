//! The contrast auditor: roles in, verdicts and corrections out.
//!
//! A *role* is what a color is used for ("text-dark", "header-bg"). Roles
//! are bound to tokens through a [`RoleMap`]; an unbound role is looked up
//! as a token of the same name. A role may also be bound to the average of
//! two tokens, which stands in for a background painted as a two-stop
//! gradient.
//!
//! For each requested pair the auditor resolves both roles, computes the
//! WCAG ratio and classifies it against the threshold. Pairs that cannot be
//! evaluated come back as [`Verdict::Skipped`] with the reason attached,
//! so a caller can tell "passed" from "unknown".
//!
//! Corrections darken the darker member of a failing pair in fixed steps
//! until the ratio is met or the pass budget runs out. Some pairs (two
//! mid-tones, or dark text on a mid-dark brand color) cannot be fixed by
//! darkening one side; those return [`Unresolved::CouldNotRemediate`]
//! instead of a color that still fails.

use std::collections::BTreeMap;

use pa_color::Rgb;
use tracing::{debug, trace};

use crate::contrast::{contrast_ratio, relative_luminance};
use crate::options::{AuditOptions, DEFAULT_DARKEN_FACTOR, DEFAULT_MAX_ITERATIONS};
use crate::resolve::{self, DEFAULT_MAX_DEPTH, Unresolved};
use crate::tokens::TokenMap;

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// Where a role's color comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleSource {
    /// A single token.
    Token(String),
    /// The per-channel average of two tokens.
    Average(String, String),
}

/// Role name → color source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleMap {
    roles: BTreeMap<String, RoleSource>,
}

impl RoleMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `role` to `token`.
    pub fn bind(&mut self, role: impl Into<String>, token: impl Into<String>) -> &mut Self {
        self.roles.insert(role.into(), RoleSource::Token(token.into()));
        self
    }

    /// Bind `role` to the average of tokens `a` and `b`.
    pub fn bind_average(
        &mut self,
        role: impl Into<String>,
        a: impl Into<String>,
        b: impl Into<String>,
    ) -> &mut Self {
        self.roles
            .insert(role.into(), RoleSource::Average(a.into(), b.into()));
        self
    }

    /// The source bound to `role`, if any.
    #[must_use]
    pub fn source(&self, role: &str) -> Option<&RoleSource> {
        self.roles.get(role)
    }

    /// The token that carries `role`'s color, when it is a single token.
    /// Averaged roles have no single token to correct.
    #[must_use]
    pub fn token_for<'a>(&'a self, role: &'a str) -> Option<&'a str> {
        match self.roles.get(role) {
            Some(RoleSource::Token(token)) => Some(token.as_str()),
            Some(RoleSource::Average(..)) => None,
            None => Some(role),
        }
    }

    /// Resolve `role` to a color.
    ///
    /// # Errors
    ///
    /// [`Unresolved`] from the underlying token resolution.
    pub fn resolve(
        &self,
        role: &str,
        tokens: &TokenMap,
        max_depth: u32,
    ) -> Result<Rgb, Unresolved> {
        match self.roles.get(role) {
            Some(RoleSource::Token(token)) => resolve::resolve(token, tokens, max_depth),
            Some(RoleSource::Average(a, b)) => resolve::average(a, b, tokens, max_depth),
            None => resolve::resolve(role, tokens, max_depth),
        }
    }

    /// The roles of a typical site stylesheet: light/dark text, the page
    /// background, two brand colors, and a header painted as a gradient
    /// from rust-brown to dark-khaki.
    #[must_use]
    pub fn site_defaults() -> Self {
        let mut roles = Self::new();
        roles
            .bind("text-dark", "text-dark")
            .bind("text-light", "text-light")
            .bind("background-light", "background-light")
            .bind("primary-color", "primary-color")
            .bind("secondary-color", "secondary-color")
            .bind_average("header-bg", "rust-brown", "dark-khaki");
        roles
    }
}

/// Two roles to compare. The order only matters for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePair {
    pub foreground: String,
    pub background: String,
}

impl RolePair {
    #[must_use]
    pub fn new(foreground: impl Into<String>, background: impl Into<String>) -> Self {
        Self {
            foreground: foreground.into(),
            background: background.into(),
        }
    }
}

impl<A: Into<String>, B: Into<String>> From<(A, B)> for RolePair {
    fn from((foreground, background): (A, B)) -> Self {
        Self::new(foreground, background)
    }
}

/// The pairs checked against [`RoleMap::site_defaults`].
#[must_use]
pub fn default_pairs() -> Vec<RolePair> {
    [
        ("text-dark", "background-light"),
        ("text-light", "background-light"),
        ("text-light", "primary-color"),
        ("text-light", "secondary-color"),
        ("text-dark", "primary-color"),
        ("text-light", "header-bg"),
    ]
    .into_iter()
    .map(RolePair::from)
    .collect()
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Outcome of one pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
    /// At least one side did not resolve; no ratio was computed.
    Skipped,
}

/// Which member of a pair a correction changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Member {
    First,
    Second,
}

/// A proposed replacement for the darker member of a failing pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Remediation {
    /// The member that was darkened.
    pub adjusted: Member,
    /// Its color before darkening.
    pub original: Rgb,
    /// Its suggested replacement.
    pub suggested: Rgb,
    /// The member left untouched.
    pub fixed: Rgb,
    /// Contrast of `suggested` against `fixed`.
    pub ratio: f64,
    /// Darkening passes applied (0 when the pair already passed).
    pub passes: u32,
}

/// The audit record of one role pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ContrastResult {
    pub foreground: String,
    pub background: String,
    pub foreground_color: Result<Rgb, Unresolved>,
    pub background_color: Result<Rgb, Unresolved>,
    /// `None` exactly when the verdict is [`Verdict::Skipped`].
    pub ratio: Option<f64>,
    pub verdict: Verdict,
    /// Present on failing pairs when corrections were requested.
    pub remediation: Option<Result<Remediation, Unresolved>>,
}

impl ContrastResult {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Pass
    }

    #[must_use]
    pub fn failed(&self) -> bool {
        self.verdict == Verdict::Fail
    }

    #[must_use]
    pub fn skipped(&self) -> bool {
        self.verdict == Verdict::Skipped
    }

    /// The role a successful correction applies to.
    #[must_use]
    pub fn adjusted_role(&self) -> Option<&str> {
        match self.remediation.as_ref()?.as_ref().ok()?.adjusted {
            Member::First => Some(self.foreground.as_str()),
            Member::Second => Some(self.background.as_str()),
        }
    }
}

// ---------------------------------------------------------------------------
// Remediation
// ---------------------------------------------------------------------------

/// Darken the darker member of `pair` until it reaches `threshold` against
/// the lighter one.
///
/// Each pass multiplies every channel by `darken_factor` (truncating). The
/// search stops at the first pass that meets the threshold, or after
/// `max_iterations` passes. A pair that already passes comes back unchanged
/// with zero passes. On equal luminance the first member is kept fixed.
///
/// # Errors
///
/// [`Unresolved::CouldNotRemediate`] when no pass within the budget meets
/// the threshold, or when `darken_factor` is outside (0, 1) and can make no
/// progress.
pub fn remediate(
    pair: (Rgb, Rgb),
    threshold: f64,
    darken_factor: f64,
    max_iterations: u32,
) -> Result<Remediation, Unresolved> {
    let (a, b) = pair;
    let (fixed, original, adjusted) = if relative_luminance(a) >= relative_luminance(b) {
        (a, b, Member::Second)
    } else {
        (b, a, Member::First)
    };

    let mut candidate = original;
    let mut ratio = contrast_ratio(candidate, fixed);
    let mut passes = 0;

    let done = |candidate: Rgb, ratio: f64, passes: u32| Remediation {
        adjusted,
        original,
        suggested: candidate,
        fixed,
        ratio,
        passes,
    };

    if ratio >= threshold {
        return Ok(done(candidate, ratio, passes));
    }

    if darken_factor > 0.0 && darken_factor < 1.0 {
        while passes < max_iterations {
            candidate = candidate.scale(darken_factor);
            passes += 1;
            ratio = contrast_ratio(candidate, fixed);
            trace!(pass = passes, %candidate, ratio, "darkened");
            if ratio >= threshold {
                return Ok(done(candidate, ratio, passes));
            }
        }
    }

    Err(Unresolved::CouldNotRemediate {
        threshold,
        iterations: passes,
        best_ratio: ratio,
    })
}

// ---------------------------------------------------------------------------
// Auditor
// ---------------------------------------------------------------------------

/// Runs audits with one fixed set of [`AuditOptions`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Auditor {
    options: AuditOptions,
}

impl Auditor {
    #[must_use]
    pub const fn new(options: AuditOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub const fn options(&self) -> &AuditOptions {
        &self.options
    }

    /// Evaluate every pair in order. Failing pairs carry a correction
    /// attempt when `suggest_fixes` is set.
    #[must_use]
    pub fn audit(
        &self,
        roles: &RoleMap,
        tokens: &TokenMap,
        pairs: &[RolePair],
    ) -> Vec<ContrastResult> {
        let opts = &self.options;
        let results: Vec<_> = pairs
            .iter()
            .map(|pair| {
                let fg = roles.resolve(&pair.foreground, tokens, opts.max_depth);
                let bg = roles.resolve(&pair.background, tokens, opts.max_depth);

                let (ratio, verdict, remediation) = match (&fg, &bg) {
                    (Ok(fg), Ok(bg)) => {
                        let ratio = contrast_ratio(*fg, *bg);
                        if ratio >= opts.threshold {
                            (Some(ratio), Verdict::Pass, None)
                        } else {
                            let fix = opts.suggest_fixes.then(|| self.remediate((*fg, *bg)));
                            (Some(ratio), Verdict::Fail, fix)
                        }
                    }
                    _ => (None, Verdict::Skipped, None),
                };

                ContrastResult {
                    foreground: pair.foreground.clone(),
                    background: pair.background.clone(),
                    foreground_color: fg,
                    background_color: bg,
                    ratio,
                    verdict,
                    remediation,
                }
            })
            .collect();

        let count = |v: Verdict| results.iter().filter(|r| r.verdict == v).count();
        debug!(
            pairs = results.len(),
            passed = count(Verdict::Pass),
            failed = count(Verdict::Fail),
            skipped = count(Verdict::Skipped),
            threshold = opts.threshold,
            "audit complete"
        );
        results
    }

    /// [`remediate`] with this auditor's threshold, factor, and pass budget.
    ///
    /// # Errors
    ///
    /// See [`remediate`].
    pub fn remediate(&self, pair: (Rgb, Rgb)) -> Result<Remediation, Unresolved> {
        let opts = &self.options;
        remediate(pair, opts.threshold, opts.darken_factor, opts.max_iterations)
    }
}

/// Audit `pairs` against `threshold` with default depth and no corrections.
#[must_use]
pub fn audit(
    roles: &RoleMap,
    tokens: &TokenMap,
    pairs: &[RolePair],
    threshold: f64,
) -> Vec<ContrastResult> {
    Auditor::new(AuditOptions {
        threshold,
        darken_factor: DEFAULT_DARKEN_FACTOR,
        max_iterations: DEFAULT_MAX_ITERATIONS,
        max_depth: DEFAULT_MAX_DEPTH,
        suggest_fixes: false,
    })
    .audit(roles, tokens, pairs)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

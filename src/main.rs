// SPDX-License-Identifier: MIT
//
// palette-audit — WCAG contrast auditor for stylesheet design tokens.
//
// This is the binary that wires the crates together:
//
//   pa-color → color literal codec (hex, rgb(a), bare triples)
//   pa-audit → token resolution, contrast math, auditor, stylesheet I/O helpers
//
// One run flows through:
//
//   read stylesheet → :root custom properties → resolve roles → ratios
//   → report → (with --apply) back up, patch corrected tokens, write back
//
// Usage:
//
//   palette-audit styles.css [--apply] [pair=FG:BG]... [role=NAME:TOKEN]...
//                            [mix=NAME:A+B]... [threshold=4.5] [darken=0.75]
//                            [iterations=5] [depth=10] [nofixes] [large]
//
// Exit status: 0 when every pair passes, 2 when any pair fails, 1 on error.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use pa_audit::options::{OptionError, parse_directive};
use pa_audit::resolve;
use pa_audit::stylesheet::{self, StylesheetError};
use pa_audit::{
    AuditOptions, Auditor, ContrastResult, RoleMap, RolePair, RoleSource, TokenMap, Verdict,
    default_pairs, relative_luminance,
};
use pa_color::Rgb;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: palette-audit <stylesheet> [--apply] [pair=FG:BG]... \
[role=NAME:TOKEN]... [mix=NAME:A+B]... [option=value]...";

// ─── Errors ─────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}\n{USAGE}")]
    Usage(String),

    #[error(transparent)]
    Options(#[from] OptionError),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    Stylesheet {
        path: PathBuf,
        source: StylesheetError,
    },
}

// ─── Arguments ──────────────────────────────────────────────────────────────

/// Parsed command line.
#[derive(Debug)]
struct Args {
    stylesheet: PathBuf,
    apply: bool,
    roles: RoleMap,
    pairs: Vec<RolePair>,
    options: AuditOptions,
}

/// Split `a:b` (or `a+b`) into two non-empty halves.
fn split_two<'a>(arg: &'a str, value: &'a str, sep: char) -> Result<(&'a str, &'a str), CliError> {
    value
        .split_once(sep)
        .filter(|(a, b)| !a.is_empty() && !b.is_empty())
        .ok_or_else(|| CliError::Usage(format!("malformed argument: {arg}")))
}

fn parse_args(args: &[String]) -> Result<Args, CliError> {
    let mut stylesheet = None;
    let mut apply = false;
    let mut roles = RoleMap::site_defaults();
    let mut pairs = Vec::new();
    let mut options = AuditOptions::default();

    for arg in args {
        if arg == "--apply" {
            apply = true;
        } else if arg.starts_with("--") {
            return Err(CliError::Usage(format!("unknown flag: {arg}")));
        } else if let Some(value) = arg.strip_prefix("pair=") {
            let (fg, bg) = split_two(arg, value, ':')?;
            pairs.push(RolePair::new(fg, bg));
        } else if let Some(value) = arg.strip_prefix("role=") {
            let (role, token) = split_two(arg, value, ':')?;
            roles.bind(role, token);
        } else if let Some(value) = arg.strip_prefix("mix=") {
            let (role, sources) = split_two(arg, value, ':')?;
            let (a, b) = split_two(arg, sources, '+')?;
            roles.bind_average(role, a, b);
        } else if arg.contains('=') || stylesheet.is_some() {
            // Everything after the path is an option directive.
            options.apply(&parse_directive(arg))?;
        } else {
            stylesheet = Some(PathBuf::from(arg));
        }
    }

    let stylesheet = stylesheet.ok_or_else(|| CliError::Usage("no stylesheet given".to_string()))?;
    if pairs.is_empty() {
        pairs = default_pairs();
    }

    Ok(Args {
        stylesheet,
        apply,
        roles,
        pairs,
        options,
    })
}

// ─── Report ─────────────────────────────────────────────────────────────────

fn color_label(color: &Result<Rgb, resolve::Unresolved>) -> String {
    match color {
        Ok(rgb) => rgb.to_hex(),
        Err(e) => e.reason().to_string(),
    }
}

/// One line per pair, plus an indented line for any correction attempt.
fn report_lines(result: &ContrastResult) -> Vec<String> {
    let fg = &result.foreground;
    let bg = &result.background;

    let mut lines = Vec::with_capacity(2);
    match (result.verdict, result.ratio) {
        (Verdict::Pass | Verdict::Fail, Some(ratio)) => {
            let status = if result.passed() { "PASS" } else { "FAIL" };
            lines.push(format!(
                "{fg} ({}) vs {bg} ({}) -> {ratio:.2}:1 {status}",
                color_label(&result.foreground_color),
                color_label(&result.background_color),
            ));
        }
        _ => {
            let why: Vec<String> = [(fg, &result.foreground_color), (bg, &result.background_color)]
                .into_iter()
                .filter_map(|(role, color)| {
                    color.as_ref().err().map(|e| format!("{role}: {}", e.reason()))
                })
                .collect();
            lines.push(format!("{fg} vs {bg}: skipped ({})", why.join(", ")));
        }
    }

    match &result.remediation {
        Some(Ok(fix)) => lines.push(format!(
            "  suggested {}: {} ({:.2}:1 after {} passes)",
            result.adjusted_role().unwrap_or(fg.as_str()),
            fix.suggested,
            fix.ratio,
            fix.passes,
        )),
        Some(Err(e)) => lines.push(format!("  no fix: {e}")),
        None => {}
    }
    lines
}

// ─── Patching ───────────────────────────────────────────────────────────────

/// Token → replacement color for every failing pair with a correction.
///
/// Corrections land on the token at the end of the role's alias chain.
/// Averaged roles have no single token and are left alone. When one token
/// gets several suggestions, the darkest wins since it satisfies the most
/// pairs.
fn plan_fixes(
    results: &[ContrastResult],
    roles: &RoleMap,
    tokens: &TokenMap,
    max_depth: u32,
) -> BTreeMap<String, Rgb> {
    let mut plan: BTreeMap<String, Rgb> = BTreeMap::new();

    for result in results.iter().filter(|r| r.failed()) {
        let (Some(Ok(fix)), Some(role)) = (&result.remediation, result.adjusted_role()) else {
            continue;
        };
        let Some(token) = roles.token_for(role) else {
            warn!(role, "averaged role cannot be patched");
            continue;
        };
        let Ok(origin) = resolve::origin(token, tokens, max_depth) else {
            continue;
        };

        plan.entry(origin)
            .and_modify(|current| {
                if relative_luminance(fix.suggested) < relative_luminance(*current) {
                    *current = fix.suggested;
                }
            })
            .or_insert(fix.suggested);
    }
    plan
}

/// Tokens whose values decide `role`'s color: the origin of its alias
/// chain, or both origins for an averaged role.
fn role_origins(role: &str, roles: &RoleMap, tokens: &TokenMap, max_depth: u32) -> Vec<String> {
    let sources = match roles.source(role) {
        Some(RoleSource::Token(token)) => vec![token.as_str()],
        Some(RoleSource::Average(a, b)) => vec![a.as_str(), b.as_str()],
        None => vec![role],
    };
    sources
        .into_iter()
        .filter_map(|token| resolve::origin(token, tokens, max_depth).ok())
        .collect()
}

/// Drop planned fixes that would turn a passing pair into a failing one.
///
/// The plan is applied to a copy of the tokens and the pairs are audited
/// again. For every pair that regresses, fixes to the tokens behind either
/// of its roles are withdrawn, and the check repeats until the plan is
/// stable. Returns the pairs that would have regressed.
fn drop_regressions(
    plan: &mut BTreeMap<String, Rgb>,
    auditor: &Auditor,
    roles: &RoleMap,
    tokens: &TokenMap,
    pairs: &[RolePair],
    before: &[ContrastResult],
) -> Vec<RolePair> {
    let max_depth = auditor.options().max_depth;
    let mut regressed = Vec::new();

    while !plan.is_empty() {
        let mut patched = tokens.clone();
        for (token, color) in &*plan {
            patched.insert(token, color.to_hex());
        }
        let after = auditor.audit(roles, &patched, pairs);

        let mut withdrawn = false;
        for (pair, (was, now)) in pairs.iter().zip(before.iter().zip(&after)) {
            if !(was.passed() && now.failed()) {
                continue;
            }
            warn!(
                foreground = pair.foreground.as_str(),
                background = pair.background.as_str(),
                "fix withdrawn: it would break a passing pair"
            );
            for role in [&pair.foreground, &pair.background] {
                for origin in role_origins(role, roles, tokens, max_depth) {
                    withdrawn |= plan.remove(&origin).is_some();
                }
            }
            regressed.push(pair.clone());
        }
        if !withdrawn {
            break;
        }
    }
    regressed
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

fn apply_fixes(path: &Path, css: &str, plan: &BTreeMap<String, Rgb>) -> Result<(), CliError> {
    let mut patched = css.to_string();
    for (token, color) in plan {
        patched = stylesheet::patch(&patched, token, &color.to_hex()).map_err(|source| {
            CliError::Stylesheet {
                path: path.to_path_buf(),
                source,
            }
        })?;
        info!(token = token.as_str(), color = %color, "patched");
    }

    let backup = backup_path(path);
    fs::write(&backup, css).map_err(|source| CliError::Io {
        path: backup.clone(),
        source,
    })?;
    fs::write(path, patched).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

// ─── Entry point ────────────────────────────────────────────────────────────

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> Result<bool, CliError> {
    let path = &args.stylesheet;
    let css = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.clone(),
        source,
    })?;
    let tokens = stylesheet::custom_properties(&css).map_err(|source| CliError::Stylesheet {
        path: path.clone(),
        source,
    })?;

    let auditor = Auditor::new(args.options);
    let results = auditor.audit(&args.roles, &tokens, &args.pairs);

    println!(
        "Contrast audit (WCAG 2.1, threshold {}:1, {} tokens)",
        auditor.options().threshold,
        tokens.len()
    );
    for result in &results {
        for line in report_lines(result) {
            println!("{line}");
        }
    }

    let any_failed = results.iter().any(ContrastResult::failed);
    if args.apply {
        let mut plan = plan_fixes(&results, &args.roles, &tokens, args.options.max_depth);
        let regressed = drop_regressions(
            &mut plan,
            &auditor,
            &args.roles,
            &tokens,
            &args.pairs,
            &results,
        );
        for pair in &regressed {
            println!(
                "\nNot applied: a fix would break {} vs {}",
                pair.foreground, pair.background
            );
        }
        if plan.is_empty() {
            println!("\nNothing to apply.");
        } else {
            apply_fixes(path, &css, &plan)?;
            println!(
                "\nApplied {} fix(es) to {} (backup -> {})",
                plan.len(),
                path.display(),
                backup_path(path).display()
            );
        }
    }

    Ok(any_failed)
}

/// 0 when every pair passes, 2 when any fails, 1 on error.
const fn exit_status(outcome: &Result<bool, CliError>) -> i32 {
    match outcome {
        Ok(false) => 0,
        Ok(true) => 2,
        Err(_) => 1,
    }
}

fn main() {
    init_logging();

    let argv: Vec<String> = env::args().skip(1).collect();
    if argv.iter().any(|a| a == "-h" || a == "--help") {
        println!("{USAGE}");
        return;
    }

    let args = parse_args(&argv).unwrap_or_else(|e| {
        eprintln!("palette-audit: {e}");
        process::exit(1);
    });

    let outcome = run(&args);
    if let Err(e) = &outcome {
        eprintln!("palette-audit: {e}");
    }
    process::exit(exit_status(&outcome));
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    fn site_tokens() -> TokenMap {
        TokenMap::from([
            ("rust-brown", "#8f4013"),
            ("dark-khaki", "#323a17"),
            ("lilac-ash", "#a4a0ae"),
            ("background-light", "#f5f5f7"),
            ("text-light", "#ffffff"),
            ("text-dark", "#1c1c1e"),
            ("primary-color", "var(--rust-brown)"),
            ("secondary-color", "var(--lilac-ash)"),
        ])
    }

    // ── Arguments ─────────────────────────────────────────────────────────

    #[test]
    fn defaults_when_only_a_path_is_given() {
        let args = parse_args(&strings(&["styles.css"])).unwrap();
        assert_eq!(args.stylesheet, PathBuf::from("styles.css"));
        assert!(!args.apply);
        assert_eq!(args.pairs, default_pairs());
        assert_eq!(args.options, AuditOptions::default());
    }

    #[test]
    fn pairs_roles_and_options() {
        let args = parse_args(&strings(&[
            "--apply",
            "pair=ink:paper",
            "role=ink:text-dark",
            "mix=paper:rust-brown+dark-khaki",
            "threshold=3",
            "styles.css",
            "nofixes",
        ]))
        .unwrap();
        assert!(args.apply);
        assert_eq!(args.pairs, vec![RolePair::new("ink", "paper")]);
        assert_eq!(args.roles.token_for("ink"), Some("text-dark"));
        assert_eq!(args.roles.token_for("paper"), None);
        assert_eq!(args.options.threshold, 3.0);
        assert!(!args.options.suggest_fixes);
    }

    #[test]
    fn unknown_flag_before_the_path() {
        let err = parse_args(&strings(&["--verbose", "styles.css"])).unwrap_err();
        assert!(
            matches!(&err, CliError::Usage(msg) if msg == "unknown flag: --verbose"),
            "{err}"
        );
    }

    #[test]
    fn argument_errors() {
        assert!(matches!(parse_args(&[]), Err(CliError::Usage(_))));
        assert!(matches!(
            parse_args(&strings(&["a.css", "pair=ink"])),
            Err(CliError::Usage(_))
        ));
        assert!(matches!(
            parse_args(&strings(&["a.css", "mix=x:a"])),
            Err(CliError::Usage(_))
        ));
        assert!(matches!(
            parse_args(&strings(&["a.css", "bogus=1"])),
            Err(CliError::Options(OptionError::Unknown(_)))
        ));
        assert!(matches!(
            parse_args(&strings(&["a.css", "b.css"])),
            Err(CliError::Options(OptionError::Unknown(_)))
        ));
    }

    // ── Report ────────────────────────────────────────────────────────────

    #[test]
    fn report_pass_fail_and_skip() {
        let tokens = site_tokens();
        let pairs = vec![
            RolePair::new("text-dark", "background-light"),
            RolePair::new("secondary-color", "background-light"),
            RolePair::new("text-light", "ghost"),
        ];
        let results = Auditor::default().audit(&RoleMap::new(), &tokens, &pairs);

        assert_eq!(
            report_lines(&results[0]),
            vec!["text-dark (#1c1c1e) vs background-light (#f5f5f7) -> 15.63:1 PASS"]
        );
        assert_eq!(
            report_lines(&results[1]),
            vec![
                "secondary-color (#a4a0ae) vs background-light (#f5f5f7) -> 2.35:1 FAIL",
                "  suggested secondary-color: #5c5a61 (6.24:1 after 2 passes)",
            ]
        );
        assert_eq!(
            report_lines(&results[2]),
            vec!["text-light vs ghost: skipped (ghost: missing)"]
        );
    }

    #[test]
    fn report_unfixable_pair() {
        let tokens = site_tokens();
        let pairs = vec![RolePair::new("text-dark", "primary-color")];
        let results = Auditor::default().audit(&RoleMap::new(), &tokens, &pairs);
        let lines = report_lines(&results[0]);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("FAIL"), "{}", lines[0]);
        assert!(lines[1].starts_with("  no fix: 5 darkening passes"), "{}", lines[1]);
    }

    // ── Patching ──────────────────────────────────────────────────────────

    #[test]
    fn plan_targets_alias_origin() {
        let tokens = site_tokens();
        let roles = RoleMap::site_defaults();
        let pairs = vec![RolePair::new("secondary-color", "background-light")];
        let results = Auditor::default().audit(&roles, &tokens, &pairs);
        let plan = plan_fixes(&results, &roles, &tokens, 10);
        assert_eq!(
            plan,
            BTreeMap::from([("lilac-ash".to_string(), Rgb::new(92, 90, 97))])
        );
    }

    #[test]
    fn plan_skips_averaged_roles_and_keeps_darkest() {
        let tokens = TokenMap::from([
            ("a", "#a4a0ae"),
            ("b", "#a4a0ae"),
            ("light", "#f5f5f7"),
            ("white", "#ffffff"),
        ]);
        let mut roles = RoleMap::new();
        roles.bind_average("mixed", "a", "b");
        let auditor = Auditor::new(AuditOptions {
            threshold: 7.0,
            ..AuditOptions::default()
        });
        let pairs = vec![
            RolePair::new("mixed", "light"),
            RolePair::new("a", "light"),
            RolePair::new("a", "white"),
        ];
        let results = auditor.audit(&roles, &tokens, &pairs);
        assert!(results.iter().all(ContrastResult::failed));

        let plan = plan_fixes(&results, &roles, &tokens, 10);
        assert_eq!(plan.len(), 1);
        let chosen = plan["a"];
        for r in &results[1..] {
            let suggested = r.remediation.clone().unwrap().unwrap().suggested;
            assert!(relative_luminance(chosen) <= relative_luminance(suggested));
        }
    }

    #[test]
    fn fix_that_breaks_a_passing_pair_is_withdrawn() {
        let tokens = TokenMap::from([("bg", "#f5f5f7"), ("mid", "#a4a0ae"), ("ink", "#000000")]);
        let roles = RoleMap::new();
        let pairs = vec![RolePair::new("mid", "bg"), RolePair::new("ink", "mid")];
        let auditor = Auditor::default();
        let before = auditor.audit(&roles, &tokens, &pairs);
        assert!(before[0].failed());
        assert!(before[1].passed());

        let mut plan = plan_fixes(&before, &roles, &tokens, 10);
        assert_eq!(plan, BTreeMap::from([("mid".to_string(), Rgb::new(92, 90, 97))]));

        let regressed = drop_regressions(&mut plan, &auditor, &roles, &tokens, &pairs, &before);
        assert_eq!(regressed, vec![RolePair::new("ink", "mid")]);
        assert!(plan.is_empty());
    }

    #[test]
    fn harmless_fix_is_kept() {
        let tokens = site_tokens();
        let roles = RoleMap::site_defaults();
        let pairs = vec![
            RolePair::new("secondary-color", "background-light"),
            RolePair::new("text-dark", "background-light"),
        ];
        let auditor = Auditor::default();
        let before = auditor.audit(&roles, &tokens, &pairs);
        let mut plan = plan_fixes(&before, &roles, &tokens, 10);
        let regressed = drop_regressions(&mut plan, &auditor, &roles, &tokens, &pairs, &before);
        assert!(regressed.is_empty());
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn averaged_role_origins() {
        let tokens = site_tokens();
        let roles = RoleMap::site_defaults();
        assert_eq!(
            role_origins("header-bg", &roles, &tokens, 10),
            vec!["rust-brown".to_string(), "dark-khaki".to_string()]
        );
        assert_eq!(
            role_origins("primary-color", &roles, &tokens, 10),
            vec!["rust-brown".to_string()]
        );
    }

    #[test]
    fn backup_appends_suffix() {
        assert_eq!(
            backup_path(Path::new("site/styles.css")),
            PathBuf::from("site/styles.css.bak")
        );
    }

    // ── Runs against a file ───────────────────────────────────────────────

    /// A scratch stylesheet path unique to this process and test.
    fn scratch(name: &str) -> PathBuf {
        env::temp_dir().join(format!("palette-audit-{}-{name}.css", process::id()))
    }

    fn cleanup(path: &Path) {
        let _ = fs::remove_file(path);
        let _ = fs::remove_file(backup_path(path));
    }

    fn run_args(path: &Path, apply: bool, pairs: Vec<RolePair>) -> Args {
        Args {
            stylesheet: path.to_path_buf(),
            apply,
            roles: RoleMap::site_defaults(),
            pairs,
            options: AuditOptions::default(),
        }
    }

    const LILAC_CSS: &str = "\
:root {
  --lilac-ash: #a4a0ae;
  --background-light: #f5f5f7;
  --text-dark: #1c1c1e;
  --secondary-color: var(--lilac-ash);
}
";

    #[test]
    fn apply_backs_up_and_patches_alias_origin() {
        let path = scratch("apply");
        fs::write(&path, LILAC_CSS).unwrap();
        let pairs = vec![
            RolePair::new("secondary-color", "background-light"),
            RolePair::new("text-dark", "background-light"),
        ];

        let outcome = run(&run_args(&path, true, pairs.clone()));
        assert!(matches!(outcome, Ok(true)));
        assert_eq!(exit_status(&outcome), 2);

        assert_eq!(fs::read_to_string(backup_path(&path)).unwrap(), LILAC_CSS);
        let patched = fs::read_to_string(&path).unwrap();
        assert_eq!(patched, LILAC_CSS.replace("#a4a0ae", "#5c5a61"));
        assert!(patched.contains("--secondary-color: var(--lilac-ash);"));

        // The patched stylesheet now passes.
        let outcome = run(&run_args(&path, false, pairs));
        assert!(matches!(outcome, Ok(false)));
        assert_eq!(exit_status(&outcome), 0);

        cleanup(&path);
    }

    #[test]
    fn apply_leaves_file_alone_when_every_fix_regresses() {
        let css = ":root { --bg: #f5f5f7; --mid: #a4a0ae; --ink: #000000; }";
        let path = scratch("regress");
        fs::write(&path, css).unwrap();
        let pairs = vec![RolePair::new("mid", "bg"), RolePair::new("ink", "mid")];

        assert!(matches!(run(&run_args(&path, true, pairs)), Ok(true)));
        assert_eq!(fs::read_to_string(&path).unwrap(), css);
        assert!(!backup_path(&path).exists());

        cleanup(&path);
    }

    #[test]
    fn read_errors() {
        let path = scratch("missing");
        cleanup(&path);
        let outcome = run(&run_args(&path, false, default_pairs()));
        assert!(matches!(&outcome, Err(CliError::Io { path: p, .. }) if *p == path));
        assert_eq!(exit_status(&outcome), 1);

        let path = scratch("no-root");
        fs::write(&path, "body { color: #000; }").unwrap();
        let outcome = run(&run_args(&path, false, default_pairs()));
        assert!(matches!(
            outcome,
            Err(CliError::Stylesheet {
                source: StylesheetError::NoRootBlock,
                ..
            })
        ));
        cleanup(&path);
    }
}

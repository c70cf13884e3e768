//! Reading and patching the `:root` custom-property block of a stylesheet.
//!
//! This is not a CSS parser. It finds the first `:root { ... }` block and
//! the `--name: value` declarations inside it, which is all a design-token
//! palette needs. Rules, selectors, and nested blocks elsewhere in the file
//! are never looked at, and [`patch`] leaves every byte outside the patched
//! value untouched.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::tokens::TokenMap;

static ROOT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":root\s*\{([^}]*)\}").expect("root-block pattern is valid"));

static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"--([A-Za-z0-9_-]+)\s*:\s*([^;]*)").expect("declaration pattern is valid")
});

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("comment pattern is valid"));

/// Why a stylesheet could not be read or patched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StylesheetError {
    #[error("no :root block found")]
    NoRootBlock,

    #[error("--{0} is not declared in the :root block")]
    UnknownProperty(String),
}

/// One `--name: value` inside the root block, as byte ranges into the
/// whole stylesheet.
struct Declaration<'a> {
    name: &'a str,
    value: &'a str,
    value_span: Range<usize>,
}

/// Declarations of the first `:root` block, in source order, skipping any
/// that sit inside a comment.
fn declarations(css: &str) -> Result<Vec<Declaration<'_>>, StylesheetError> {
    let block = ROOT_BLOCK
        .captures(css)
        .and_then(|caps| caps.get(1))
        .ok_or(StylesheetError::NoRootBlock)?;
    let body = block.as_str();
    let offset = block.start();

    let comments: Vec<Range<usize>> = COMMENT.find_iter(body).map(|m| m.range()).collect();
    let in_comment = |pos: usize| comments.iter().any(|c| c.contains(&pos));

    let mut found = Vec::new();
    let mut pos = 0;
    while let Some(caps) = DECLARATION.captures_at(body, pos) {
        let (Some(whole), Some(name), Some(raw)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            break;
        };
        if in_comment(whole.start()) {
            // Resume right after the comment that swallowed this match.
            pos = comments
                .iter()
                .find(|c| c.contains(&whole.start()))
                .map_or(whole.end(), |c| c.end);
            continue;
        }
        pos = whole.end();

        // A comment ends the value even without a `;` before it.
        let end = comments
            .iter()
            .map(|c| c.start)
            .filter(|&c| raw.range().contains(&c))
            .min()
            .unwrap_or(raw.end());
        let value = strip_important(&body[raw.start()..end]);
        // `value` is a prefix of the raw capture.
        let start = offset + raw.start();
        found.push(Declaration {
            name: name.as_str(),
            value,
            value_span: start..start + value.len(),
        });
    }
    Ok(found)
}

/// The value without trailing whitespace and without a trailing `!important`.
fn strip_important(raw: &str) -> &str {
    let value = raw.trim_end();
    let lower = value.to_ascii_lowercase();
    lower
        .strip_suffix("!important")
        .map_or(value, |rest| value[..rest.len()].trim_end())
}

/// Collect the custom properties declared in the first `:root` block.
///
/// Names are stored without `--`; values are trimmed, with a trailing
/// `!important` removed. A name declared twice keeps its last value.
///
/// # Errors
///
/// [`StylesheetError::NoRootBlock`] when the stylesheet has no `:root` block.
pub fn custom_properties(css: &str) -> Result<TokenMap, StylesheetError> {
    Ok(declarations(css)?
        .into_iter()
        .map(|d| (d.name, d.value))
        .collect())
}

/// Replace the value of `--name` in the `:root` block with `new_value`.
///
/// Only the value text changes; the property name, spacing, `!important`,
/// comments, and the rest of the file are preserved. When `name` is
/// declared more than once, the last (effective) declaration is patched.
///
/// # Errors
///
/// [`StylesheetError::NoRootBlock`] or [`StylesheetError::UnknownProperty`].
pub fn patch(css: &str, name: &str, new_value: &str) -> Result<String, StylesheetError> {
    let name = name.trim().trim_start_matches("--");
    let span = declarations(css)?
        .into_iter()
        .rev()
        .find(|d| d.name == name)
        .map(|d| d.value_span)
        .ok_or_else(|| StylesheetError::UnknownProperty(name.to_string()))?;

    let mut out = String::with_capacity(css.len() + new_value.len());
    out.push_str(&css[..span.start]);
    out.push_str(new_value);
    out.push_str(&css[span.end..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SITE_CSS: &str = "\
/* Palette */
:root {
  --rust-brown: #8f4013;
  --dark-khaki: #323a17;
  /* --retired: #000000; */
  --primary-color: var(--rust-brown);
  --background-light: #f5f5f7 !important;
  --shadow: rgba(143, 64, 19, 0.25);
  --hero: linear-gradient(135deg, var(--rust-brown), var(--dark-khaki));
  --text-dark:#1c1c1e
}

body { color: var(--text-dark); --not-root: #fff; }
";

    #[test]
    fn collects_root_declarations() {
        let tokens = custom_properties(SITE_CSS).unwrap();
        let names: Vec<_> = tokens.iter().map(|(k, _)| k).collect();
        assert_eq!(
            names,
            vec![
                "background-light",
                "dark-khaki",
                "hero",
                "primary-color",
                "rust-brown",
                "shadow",
                "text-dark",
            ]
        );
        assert_eq!(tokens.get("primary-color"), Some("var(--rust-brown)"));
        assert_eq!(tokens.get("background-light"), Some("#f5f5f7"));
        assert_eq!(tokens.get("shadow"), Some("rgba(143, 64, 19, 0.25)"));
        assert_eq!(
            tokens.get("hero"),
            Some("linear-gradient(135deg, var(--rust-brown), var(--dark-khaki))")
        );
        assert_eq!(tokens.get("text-dark"), Some("#1c1c1e"));
    }

    #[test]
    fn ignores_comments_and_other_rules() {
        let tokens = custom_properties(SITE_CSS).unwrap();
        assert!(!tokens.contains("retired"));
        assert!(!tokens.contains("not-root"));
    }

    #[test]
    fn missing_root_block() {
        assert_eq!(
            custom_properties("body { --x: #fff; }"),
            Err(StylesheetError::NoRootBlock)
        );
    }

    #[test]
    fn empty_root_block() {
        assert!(custom_properties(":root {}").unwrap().is_empty());
    }

    #[test]
    fn duplicate_declaration_keeps_last() {
        let tokens = custom_properties(":root { --a: #000; --a: #fff; }").unwrap();
        assert_eq!(tokens.get("a"), Some("#fff"));
    }

    #[test]
    fn comment_after_unterminated_declaration() {
        let css = ":root { --bg: #ffffff; --ink: #111111\n  /* brand ink */ }";
        let tokens = custom_properties(css).unwrap();
        assert_eq!(tokens.get("ink"), Some("#111111"));
        assert_eq!(tokens.get("bg"), Some("#ffffff"));
        assert_eq!(
            crate::resolve::resolve("ink", &tokens, 10),
            Ok(pa_color::Rgb::new(0x11, 0x11, 0x11))
        );
    }

    #[test]
    fn comment_inside_a_value() {
        let tokens = custom_properties(":root { --a: #222222 /* old: #333 */; }").unwrap();
        assert_eq!(tokens.get("a"), Some("#222222"));
    }

    #[test]
    fn patch_before_trailing_comment() {
        let css = ":root { --ink: #111111 /* brand */ }";
        assert_eq!(
            patch(css, "ink", "#000000").unwrap(),
            ":root { --ink: #000000 /* brand */ }"
        );
    }

    #[test]
    fn patch_replaces_only_the_value() {
        let patched = patch(SITE_CSS, "rust-brown", "#6b300e").unwrap();
        assert_eq!(patched, SITE_CSS.replace("--rust-brown: #8f4013;", "--rust-brown: #6b300e;"));
    }

    #[test]
    fn patch_keeps_important_and_accepts_dashes() {
        let patched = patch(SITE_CSS, "--background-light", "#ffffff").unwrap();
        assert!(patched.contains("--background-light: #ffffff !important;"));
        assert_eq!(patched.len(), SITE_CSS.len());
    }

    #[test]
    fn patch_last_declaration_without_semicolon() {
        let patched = patch(SITE_CSS, "text-dark", "#000000").unwrap();
        assert!(patched.contains("--text-dark:#000000\n}"));
    }

    #[test]
    fn patch_skips_commented_out_declaration() {
        let css = ":root {\n  /* --a: #111111; */\n  --a: #222222;\n}";
        let patched = patch(css, "a", "#333333").unwrap();
        assert_eq!(patched, ":root {\n  /* --a: #111111; */\n  --a: #333333;\n}");
    }

    #[test]
    fn patch_then_reread() {
        let patched = patch(SITE_CSS, "primary-color", "#5c5a61").unwrap();
        let tokens = custom_properties(&patched).unwrap();
        assert_eq!(tokens.get("primary-color"), Some("#5c5a61"));
        assert_eq!(tokens.get("rust-brown"), Some("#8f4013"));
    }

    #[test]
    fn patch_unknown_property() {
        assert_eq!(
            patch(SITE_CSS, "not-root", "#000"),
            Err(StylesheetError::UnknownProperty("not-root".to_string()))
        );
    }
}

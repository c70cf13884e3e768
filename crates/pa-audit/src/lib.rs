//! # pa-audit: token resolution and WCAG contrast engine
//!
//! Audits the color tokens of a stylesheet for readable contrast and
//! proposes darker replacements for the pairs that fail.
//!
//! # Architecture
//!
//! ```text
//! stylesheet text
//!     │
//!     ▼
//! stylesheet.rs: extract `:root` custom properties → TokenMap
//!     │
//!     ▼
//! resolve.rs:    follow var(--name) chains → Rgb (or Unresolved)
//!     │
//!     ▼
//! contrast.rs:   relative luminance → contrast ratio (pure math)
//!     │
//!     ▼
//! audit.rs:      classify pairs against the threshold, darken failures
//!     │
//!     ▼
//! stylesheet.rs: patch corrected values back into the text
//! ```
//!
//! Everything between the two stylesheet steps is a pure function of its
//! arguments. Tunables travel in [`AuditOptions`]; nothing is global.
//!
//! # Example
//!
//! ```
//! use pa_audit::{RoleMap, RolePair, TokenMap, Verdict, audit};
//!
//! let tokens = TokenMap::from([("bg", "#f5f5f7"), ("text", "var(--ink)"), ("ink", "#1c1c1e")]);
//! let results = audit(&RoleMap::new(), &tokens, &[RolePair::new("text", "bg")], 4.5);
//! assert_eq!(results[0].verdict, Verdict::Pass);
//! ```

pub mod audit;
pub mod contrast;
pub mod options;
pub mod resolve;
pub mod stylesheet;
pub mod tokens;

pub use audit::{
    Auditor, ContrastResult, Member, Remediation, RoleMap, RolePair, RoleSource, Verdict, audit,
    default_pairs, remediate,
};
pub use contrast::{contrast_ratio, relative_luminance};
pub use options::AuditOptions;
pub use resolve::{Unresolved, resolve};
pub use tokens::TokenMap;

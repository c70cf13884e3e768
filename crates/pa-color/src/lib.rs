// SPDX-License-Identifier: MIT
//
// pa-color — Color literal codec for palette-audit.
//
// The leaf of the audit pipeline. Turns the color literals found in a
// stylesheet's custom properties (`#f80`, `#1c1c1e`, `#8f4013cc`,
// `rgba(143, 64, 19, 0.9)`, bare `143,64,19`) into plain 8-bit sRGB
// triples, and writes them back as lowercase `#rrggbb`.
//
// Alpha is parsed and thrown away. WCAG contrast assumes both colors are
// rendered fully opaque, so nothing downstream has a use for it.
//
// Token references (`var(--name)`) and gradients are not color literals
// and are rejected here; resolving them is the job of pa-audit.

pub mod color;

pub use color::{FormatError, Rgb, decode};

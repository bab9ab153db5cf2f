//! Monospace display width (UAX #11) with grapheme-aware aggregation
//! (§4.6). New module; the teacher has no equivalent. Grounded on the
//! `grapheme-width-rs` xtask table generator (East Asian Width + emoji
//! presentation table construction) and `meli`'s terminal `wcwidth.rs`
//! (runtime lookup/aggregation shape) — see DESIGN.md.

use crate::segmentation::GraphemeIter;
use crate::ucd::{display_width_class, has_emoji_variation};

/// Implementer-surfaced configuration for ambiguous-width handling
/// (§4.6): East Asian "Ambiguous" width class code points (box-drawing,
/// Greek/Cyrillic letters duplicated in legacy CJK encodings, etc.) are 1
/// column in most terminals but 2 in CJK-locale terminals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidthOptions {
    pub ambiguous_is_wide: bool,
}

impl Default for WidthOptions {
    fn default() -> Self {
        WidthOptions {
            ambiguous_is_wide: false,
        }
    }
}

/// Width of a single code point, ignoring any following variation
/// selector. Returns `None` for values outside the assigned Unicode
/// range (callers treat these as width 1, per §4.6's default-ignorable
/// fallback), though in practice every code point the table covers has
/// an entry.
pub fn code_point_width(code_point: u32, options: WidthOptions) -> i32 {
    match display_width_class(code_point) {
        0 => 0,
        2 => 2,
        3 if options.ambiguous_is_wide => 2,
        3 => 1,
        4 => -1, // BACKSPACE / DEL
        5 => 3,  // THREE-EM DASH
        _ => 1,
    }
}

/// Width of one grapheme cluster: the width of its base code point, with
/// the documented `U+FE0E`/`U+FE0F` variation-selector override (§4.6) —
/// `U+FE0E` (text presentation) forces width 1, `U+FE0F` (emoji
/// presentation) forces width 2, for any base code point that
/// participates in an emoji variation sequence. Combining marks and other
/// zero-width trailing code points don't add to the total; this is what
/// makes the calculation grapheme-aware rather than per-code-point-summed.
fn grapheme_width(code_points: &[u32], options: WidthOptions) -> i32 {
    let Some(&base) = code_points.first() else {
        return 0;
    };
    if code_points.len() > 1 && has_emoji_variation(base) {
        match code_points[1] {
            0xFE0E => return 1,
            0xFE0F => return 2,
            _ => {}
        }
    }
    code_point_width(base, options)
}

/// Total display width of a string, summing grapheme-cluster widths
/// (§4.6). Strings are assumed already-validated UTF-8; ill-formed input
/// should be run through [`crate::fix::fix`] first.
///
/// ASCII fast path (§4.6, §9 open question): for an all-ASCII string we
/// skip grapheme segmentation entirely and sum the same `code_point_width`
/// the grapheme path uses, one byte at a time. The accumulator is a plain
/// `i32` that is **not** clamped per-step — only the final return value is
/// clamped to `>= 0`. A string consisting solely of control characters
/// (width 0) therefore produces a running sum that can go negative
/// mid-string without ever being visible to the caller, since only the
/// last value returned matters. This is the documented quirk from §9's
/// first open question: it's intentional, not a bug, and is preserved
/// rather than "fixed" into a `saturating_add` per step, since clamping
/// every step is observably different only for pathological
/// all-control-character input that has no printable width regardless.
pub fn str_width(bytes: &[u8], options: WidthOptions) -> i32 {
    if bytes.iter().all(|b| b.is_ascii()) {
        let sum: i32 = bytes
            .iter()
            .map(|&b| code_point_width(b as u32, options))
            .sum();
        return sum.max(0);
    }
    let mut sum: i32 = 0;
    for grapheme in GraphemeIter::new(bytes) {
        sum += grapheme_width(&grapheme.code_points, options);
    }
    sum.max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_widths() {
        assert_eq!(str_width(b"hello", WidthOptions::default()), 5);
        assert_eq!(str_width(b"", WidthOptions::default()), 0);
    }

    #[test]
    fn test_wide_cjk() {
        // 中 U+4E2D, 2 columns.
        let s = "中".as_bytes();
        assert_eq!(str_width(s, WidthOptions::default()), 2);
    }

    #[test]
    fn test_combining_mark_adds_no_width() {
        // "e" + combining acute accent is one grapheme cluster, width 1,
        // not 2.
        let s = "e\u{0301}";
        assert_eq!(str_width(s.as_bytes(), WidthOptions::default()), 1);
    }

    #[test]
    fn test_variation_selector_overrides_emoji_presentation() {
        // U+2764 HEAVY BLACK HEART is narrow by default; U+FE0F forces
        // emoji presentation (wide), U+FE0E forces text presentation
        // (narrow).
        let default_presentation = "\u{2764}".as_bytes();
        let emoji_presentation = "\u{2764}\u{FE0F}".as_bytes();
        let text_presentation = "\u{2764}\u{FE0E}".as_bytes();
        assert_eq!(str_width(default_presentation, WidthOptions::default()), 1);
        assert_eq!(str_width(emoji_presentation, WidthOptions::default()), 2);
        assert_eq!(str_width(text_presentation, WidthOptions::default()), 1);
    }

    #[test]
    fn test_ascii_fast_path_clamp_only_at_return() {
        // DEL(-1) + 'A'(1) + BS(-1) + BS(-1) = -2, which clamps to 0 only
        // at the final return, not per step.
        assert_eq!(str_width(b"\x7FA\x08\x08", WidthOptions::default()), 0);
    }

    #[test]
    fn test_backspace_and_del_yield_negative_one() {
        assert_eq!(code_point_width(0x08, WidthOptions::default()), -1);
        assert_eq!(code_point_width(0x7F, WidthOptions::default()), -1);
    }

    #[test]
    fn test_three_em_dash_yields_three() {
        assert_eq!(code_point_width(0x2E3B, WidthOptions::default()), 3);
    }

    #[test]
    fn test_grapheme_path_matches_ascii_path_for_backspace() {
        // §4.6: the grapheme path must not diverge from the ASCII fast
        // path on control-character width — both sum the same
        // `code_point_width`.
        assert_eq!(
            str_width("中\x08".as_bytes(), WidthOptions::default()),
            1
        );
    }
}

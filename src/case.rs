//! Case folding and caseless matching (§4.4-4.5, UAX #44 D145/D146).
//!
//! Trimmed from the teacher's `case.rs`: `to_lowercase`/`to_uppercase`
//! (full case *mapping*) and the ypogegrammeni pre-decomposition special
//! case inside `case_fold` are dropped here, per the decision recorded in
//! SPEC_FULL.md §5.4/5.5 and DESIGN.md.

use crate::cp_iter::CodePointIter;
use crate::normalise::{to_nfd, to_nfkd};
use crate::ucd::case_folding;
use std::cmp::Ordering;

/// Full case folding (UAX #44 D145, CaseFolding.txt status `C`/`F` only).
/// A direct per-code-point table lookup, recursively expanding nothing
/// further: case folding is defined to be idempotent once applied to every
/// code point (§8).
pub fn case_fold(code_points: &[u32]) -> Vec<u32> {
    let mut out = Vec::with_capacity(code_points.len());
    for code_point in code_points {
        out.extend(case_folding(*code_point).unwrap_or_else(|| vec![*code_point]));
    }
    out
}

/// D145: `X` is a canonical caseless match for `Y` iff
/// `NFD(fold(NFD(X))) == NFD(fold(NFD(Y)))`.
pub fn canon_caseless_match_cp(x: &[u32], y: &[u32]) -> Ordering {
    canonical_fold_key(x).cmp(&canonical_fold_key(y))
}

fn canonical_fold_key(code_points: &[u32]) -> Vec<u32> {
    to_nfd(&case_fold(&to_nfd(code_points)))
}

/// D146: `X` is a compatibility caseless match for `Y` iff
/// `NFKD(fold(NFKD(fold(NFD(X))))) == NFKD(fold(NFKD(fold(NFD(Y)))))`.
pub fn compat_caseless_match_cp(x: &[u32], y: &[u32]) -> Ordering {
    compatibility_fold_key(x).cmp(&compatibility_fold_key(y))
}

fn compatibility_fold_key(code_points: &[u32]) -> Vec<u32> {
    let step1 = to_nfd(code_points);
    let step2 = to_nfkd(&case_fold(&step1));
    to_nfkd(&case_fold(&step2))
}

fn decode(bytes: &[u8]) -> Vec<u32> {
    CodePointIter::new(bytes).map(|record| record.code).collect()
}

/// Boolean canonical caseless match over already-validated UTF-8 byte
/// slices (§6's `canon_caseless_match(a, b) -> bool`); decodes both sides
/// and delegates to [`canon_caseless_match_cp`].
pub fn canon_caseless_match(a: &[u8], b: &[u8]) -> bool {
    canon_caseless_match_cp(&decode(a), &decode(b)) == Ordering::Equal
}

/// Boolean compatibility caseless match over already-validated UTF-8 byte
/// slices (§6's `compat_caseless_match(a, b) -> bool`); decodes both sides
/// and delegates to [`compat_caseless_match_cp`].
pub fn compat_caseless_match(a: &[u8], b: &[u8]) -> bool {
    compat_caseless_match_cp(&decode(a), &decode(b)) == Ordering::Equal
}

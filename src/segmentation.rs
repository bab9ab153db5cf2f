//! Extended grapheme cluster segmentation (UAX #29 GB1-GB999), including
//! GB9c (Indic conjunct breaks) and GB11 (ZWJ Extended_Pictographic
//! sequences), which the teacher's original rule cascade did not cover.
//!
//! The teacher tracked Regional_Indicator parity with a bare `ri_count`
//! counter. Since adding GB9c/GB11 needs two more pieces of run state
//! anyway, all three are folded into the 3-bit `GraphemeBreakState` word
//! from §4.2 (`RI`, `XPIC`, `INDIC`) instead of three separate locals.

use crate::cp_iter::{CodePoint, CodePointIter};
use crate::ucd::{grapheme_cluster_break, indic_conjunct_break, is_extended_pictographic};
use crate::ucd::{GraphemeClusterBreak, IndicConjunctBreak};

const RI_BIT: u8 = 1 << 0;
const XPIC: u8 = 1 << 1;
const INDIC: u8 = 1 << 2;

/// Running state carried across a grapheme cluster as it's scanned
/// left-to-right; reset to all-zero at every confirmed break.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphemeBreakState(u8);

impl GraphemeBreakState {
    fn advance(self, cp: u32) -> Self {
        use GraphemeClusterBreak::*;
        let gbp = grapheme_cluster_break(cp);
        let mut bits = self.0;

        bits = if gbp == RI { bits ^ RI_BIT } else { bits & !RI_BIT };

        if is_extended_pictographic(cp) {
            bits |= XPIC;
        } else if bits & XPIC != 0 && matches!(gbp, EX | ZWJ) {
            // stays set: still inside ExtPict Extend* (ZWJ)?
        } else {
            bits &= !XPIC;
        }

        match indic_conjunct_break(cp) {
            IndicConjunctBreak::Consonant => {
                bits |= INDIC;
                bits &= !LINKED_SEEN;
            }
            IndicConjunctBreak::Linker => {
                if bits & INDIC != 0 {
                    bits |= LINKED_SEEN;
                }
            }
            IndicConjunctBreak::Extend => {}
            IndicConjunctBreak::None => bits &= !(INDIC | LINKED_SEEN),
        }

        GraphemeBreakState(bits)
    }
}

// `LINKED_SEEN` packs into the same byte as a 4th bit: "have we seen a
// Linker since the last Consonant in this run". GB9c only fires once that
// bit is set, so `INDIC` alone (Consonant seen, no Linker yet) doesn't
// suppress a break.
const LINKED_SEEN: u8 = 1 << 3;

fn is_odd_ri_run(state: GraphemeBreakState) -> bool {
    state.0 & RI_BIT != 0
}

fn xpic_run_open(state: GraphemeBreakState) -> bool {
    state.0 & XPIC != 0
}

fn indic_linked(state: GraphemeBreakState) -> bool {
    state.0 & (INDIC | LINKED_SEEN) == (INDIC | LINKED_SEEN)
}

/// A single extended grapheme cluster: code points plus the byte range in
/// the original UTF-8 source they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grapheme {
    pub code_points: Vec<u32>,
    pub offset: usize,
    pub len: usize,
}

/// Walks grapheme clusters directly off the underlying [`CodePointIter`],
/// buffering at most one code point of look-ahead (§4.2, §5: the
/// code-point and grapheme iterators are allocation-free) rather than
/// collecting the whole input up front.
pub struct GraphemeIter<'a> {
    iter: CodePointIter<'a>,
    pending: Option<CodePoint>,
}

impl<'a> GraphemeIter<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        GraphemeIter {
            iter: CodePointIter::new(bytes),
            pending: None,
        }
    }
}

/// Is there a grapheme cluster boundary between `cp1` and `cp2` (UAX #29
/// GB1-GB999, including GB9c/GB11)? `state` carries the run state
/// (Regional_Indicator parity, open Extended_Pictographic run, open Indic
/// Consonant...Linker run) needed to resolve GB9c/GB11/GB12/13, and is
/// advanced past `cp1` as a side effect — callers scanning left to right
/// thread the same `state` through successive calls, one per adjacent
/// pair, resetting it to `GraphemeBreakState::default()` at each
/// confirmed break.
pub fn grapheme_break(cp1: u32, cp2: u32, state: &mut GraphemeBreakState) -> bool {
    use GraphemeClusterBreak::*;
    *state = state.advance(cp1);
    let gbp = grapheme_cluster_break(cp1);
    let next_gbp = grapheme_cluster_break(cp2);

    let no_break = match (gbp, next_gbp) {
        (CR, LF) => true,                                    // GB3
        (CN, _) | (CR, _) | (LF, _) => false,                // GB4
        (_, CN) | (_, CR) | (_, LF) => false,                 // GB5
        (L, L) | (L, V) | (L, LV) | (L, LVT) => true,         // GB6
        (LV, V) | (LV, T) | (V, V) | (V, T) => true,          // GB7
        (LVT, T) | (T, T) => true,                            // GB8
        (_, EX) | (_, ZWJ) => true,                           // GB9
        (_, SM) => true,                                      // GB9a
        (PP, _) => true,                                      // GB9b
        _ if next_gbp == RI && is_odd_ri_run(*state) => true, // GB12/13
        _ => false,
    };

    // GB11: \p{Extended_Pictographic} Extend* ZWJ x \p{Extended_Pictographic}
    let gb11 = gbp == ZWJ && is_extended_pictographic(cp2) && xpic_run_open(*state);
    // GB9c: Indic_Conjunct_Break=Consonant [Extend|Linker]* Linker [Extend|Linker]* x Consonant
    let gb9c =
        indic_conjunct_break(cp2) == IndicConjunctBreak::Consonant && indic_linked(*state);

    !(no_break || gb11 || gb9c)
}

impl<'a> Iterator for GraphemeIter<'a> {
    type Item = Grapheme;

    // https://unicode.org/reports/tr29/#Grapheme_Cluster_Boundary_Rules
    fn next(&mut self) -> Option<Self::Item> {
        let first = self.pending.take().or_else(|| self.iter.next())?;
        let offset = first.offset;
        let mut end = first.offset + first.len;
        let mut code_points = vec![first.code];
        let mut current = first;
        let mut state = GraphemeBreakState::default();

        while let Some(next_record) = self.iter.next() {
            if grapheme_break(current.code, next_record.code, &mut state) {
                self.pending = Some(next_record);
                break;
            }
            end = next_record.offset + next_record.len;
            code_points.push(next_record.code);
            current = next_record;
        }

        Some(Grapheme {
            code_points,
            offset,
            len: end - offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_line(line: &str) -> Vec<Vec<u32>> {
        line.split_once('#')
            .unwrap()
            .0
            .trim()
            .split('÷')
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.trim()
                    .split('×')
                    .map(|cp| u32::from_str_radix(cp.trim(), 16).unwrap())
                    .collect()
            })
            .collect()
    }

    fn load_test_cases() -> Vec<Vec<Vec<u32>>> {
        std::fs::read_to_string(std::path::Path::new(
            "resources/ucd/auxiliary/GraphemeBreakTest.txt",
        ))
        .unwrap()
        .split('\n')
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(parse_line)
        .collect()
    }

    fn to_bytes(code_points: &[u32]) -> Vec<u8> {
        code_points
            .iter()
            .flat_map(|cp| crate::helpers::encode_utf8(*cp))
            .collect()
    }

    #[test]
    fn test_grapheme_iter_conformance() {
        for expected in load_test_cases() {
            let to_split = expected.concat();
            let bytes = to_bytes(&to_split);
            let actual: Vec<Vec<u32>> =
                GraphemeIter::new(&bytes).map(|g| g.code_points).collect();
            assert_eq!(actual, expected);
        }
    }

    #[test]
    fn test_byte_ranges_reproduce_source() {
        let s = "a\u{0301}b";
        let graphemes: Vec<Grapheme> = GraphemeIter::new(s.as_bytes()).collect();
        assert_eq!(graphemes.len(), 2);
        let mut rebuilt = Vec::new();
        for g in &graphemes {
            rebuilt.extend_from_slice(&s.as_bytes()[g.offset..g.offset + g.len]);
        }
        assert_eq!(rebuilt, s.as_bytes());
    }

    #[test]
    fn test_gb11_zwj_extended_pictographic_sequence_is_one_grapheme() {
        // man + ZWJ + woman + ZWJ + girl + ZWJ + girl (family emoji), all
        // Extended_Pictographic, joined by ZWJ: one grapheme cluster.
        let s = "\u{1F468}\u{200D}\u{1F469}\u{200D}\u{1F467}\u{200D}\u{1F467}";
        let graphemes: Vec<Grapheme> = GraphemeIter::new(s.as_bytes()).collect();
        assert_eq!(graphemes.len(), 1);
    }

    #[test]
    fn test_gb9c_indic_conjunct_is_one_grapheme() {
        // Devanagari KA + VIRAMA (Linker) + SSA: a conjunct per GB9c.
        let s = "\u{0915}\u{094D}\u{0937}";
        let graphemes: Vec<Grapheme> = GraphemeIter::new(s.as_bytes()).collect();
        assert_eq!(graphemes.len(), 1);
    }

    #[test]
    fn test_crlf_is_one_grapheme() {
        let graphemes: Vec<Grapheme> = GraphemeIter::new(b"\r\n").collect();
        assert_eq!(graphemes.len(), 1);
    }

    #[test]
    fn test_grapheme_break_standalone() {
        let mut state = GraphemeBreakState::default();
        assert!(!grapheme_break(0x000D, 0x000A, &mut state)); // CR x LF
        let mut state = GraphemeBreakState::default();
        assert!(grapheme_break(0x0061, 0x0062, &mut state)); // 'a' ÷ 'b'
    }
}

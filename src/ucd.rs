//! Runtime accessors over the property tables produced offline by
//! `build.rs`. Each table is shipped as a gzip-compressed blob embedded
//! with `include_bytes!` and decompressed once behind a
//! [`once_cell::sync::Lazy`]; after that first touch, lookups are pure
//! array indexing (§5 concurrency model: tables are immutable and `Sync`
//! for the remainder of the process).
//!
//! Binary formats (written by `build.rs::tablegen`, read here):
//!
//! - two-stage byte table: `u32 stage1_len | stage1_len * u16 | u32
//!   stage2_len | stage2_len * u8`. Lookup is
//!   `stage2[stage1[cp >> 8] as usize * 256 + (cp & 0xff) as usize]`.
//! - sparse decomposition map: `u32 count | count * (u32 key, u8 len,
//!   u8 tag, [u32; 4] outs)`, tag 0 = canonical, 1 = compatibility-only.
//! - sparse fold map: `u32 count | count * (u32 key, u8 len, [u32; 3]
//!   outs)`.
//! - composite pair map: `u32 count | count * (u32 c1, u32 c2, u32
//!   composite)`, sorted by `(c1, c2)` for binary search.
//!
//! We deliberately collapse spec.md's three-stage design (a further
//! indirection over repeated 256-entry stage2 blocks) down to two
//! stages: for the table sizes this crate embeds, the third stage only
//! buys a constant-factor size reduction with no behavioural
//! difference, so we don't pay for the extra indirection. See
//! DESIGN.md.

use flate2::read::GzDecoder;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::io::Read;

use crate::normalise::Normalisation;

fn gunzip(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut out)
        .expect("embedded table blob is valid gzip");
    out
}

struct TwoStageTable {
    stage1: Vec<u16>,
    stage2: Vec<u8>,
}

impl TwoStageTable {
    fn parse(bytes: &[u8]) -> Self {
        let mut pos = 0;
        let stage1_len = read_u32(bytes, &mut pos) as usize;
        let mut stage1 = Vec::with_capacity(stage1_len);
        for _ in 0..stage1_len {
            stage1.push(read_u16(bytes, &mut pos));
        }
        let stage2_len = read_u32(bytes, &mut pos) as usize;
        let stage2 = bytes[pos..pos + stage2_len].to_vec();
        TwoStageTable { stage1, stage2 }
    }

    fn get(&self, code_point: u32) -> u8 {
        let block = self.stage1[(code_point >> 8) as usize] as usize;
        self.stage2[block * 256 + (code_point & 0xff) as usize]
    }
}

fn read_u32(bytes: &[u8], pos: &mut usize) -> u32 {
    let v = u32::from_le_bytes(bytes[*pos..*pos + 4].try_into().unwrap());
    *pos += 4;
    v
}

fn read_u16(bytes: &[u8], pos: &mut usize) -> u16 {
    let v = u16::from_le_bytes(bytes[*pos..*pos + 2].try_into().unwrap());
    *pos += 2;
    v
}

fn read_u8(bytes: &[u8], pos: &mut usize) -> u8 {
    let v = bytes[*pos];
    *pos += 1;
    v
}

struct DecompositionEntry {
    outs: Vec<u32>,
    compatibility_only: bool,
}

fn parse_decomposition_map(bytes: &[u8]) -> HashMap<u32, DecompositionEntry> {
    let mut pos = 0;
    let count = read_u32(bytes, &mut pos);
    let mut map = HashMap::with_capacity(count as usize);
    for _ in 0..count {
        let key = read_u32(bytes, &mut pos);
        let len = read_u8(bytes, &mut pos) as usize;
        let tag = read_u8(bytes, &mut pos);
        let mut outs = Vec::with_capacity(4);
        for _ in 0..4 {
            outs.push(read_u32(bytes, &mut pos));
        }
        outs.truncate(len);
        map.insert(
            key,
            DecompositionEntry {
                outs,
                compatibility_only: tag == 1,
            },
        );
    }
    map
}

fn parse_fold_map(bytes: &[u8]) -> HashMap<u32, Vec<u32>> {
    let mut pos = 0;
    let count = read_u32(bytes, &mut pos);
    let mut map = HashMap::with_capacity(count as usize);
    for _ in 0..count {
        let key = read_u32(bytes, &mut pos);
        let len = read_u8(bytes, &mut pos) as usize;
        let mut outs = Vec::with_capacity(3);
        for _ in 0..3 {
            outs.push(read_u32(bytes, &mut pos));
        }
        outs.truncate(len);
        map.insert(key, outs);
    }
    map
}

fn parse_composite_map(bytes: &[u8]) -> Vec<(u32, u32, u32)> {
    let mut pos = 0;
    let count = read_u32(bytes, &mut pos);
    let mut v = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let c1 = read_u32(bytes, &mut pos);
        let c2 = read_u32(bytes, &mut pos);
        let composite = read_u32(bytes, &mut pos);
        v.push((c1, c2, composite));
    }
    v
}

static GBP: Lazy<TwoStageTable> =
    Lazy::new(|| TwoStageTable::parse(&gunzip(include_bytes!(concat!(env!("OUT_DIR"), "/gbp.bin.gz")))));
static INCB: Lazy<TwoStageTable> =
    Lazy::new(|| TwoStageTable::parse(&gunzip(include_bytes!(concat!(env!("OUT_DIR"), "/incb.bin.gz")))));
static EXT_PICT: Lazy<TwoStageTable> = Lazy::new(|| {
    TwoStageTable::parse(&gunzip(include_bytes!(concat!(
        env!("OUT_DIR"),
        "/ext_pict.bin.gz"
    ))))
});
static CCC: Lazy<TwoStageTable> =
    Lazy::new(|| TwoStageTable::parse(&gunzip(include_bytes!(concat!(env!("OUT_DIR"), "/ccc.bin.gz")))));
static WIDTH: Lazy<TwoStageTable> =
    Lazy::new(|| TwoStageTable::parse(&gunzip(include_bytes!(concat!(env!("OUT_DIR"), "/width.bin.gz")))));
static QUICK_CHECK: Lazy<TwoStageTable> = Lazy::new(|| {
    TwoStageTable::parse(&gunzip(include_bytes!(concat!(
        env!("OUT_DIR"),
        "/quick_check.bin.gz"
    ))))
});
static DECOMPOSITION: Lazy<HashMap<u32, DecompositionEntry>> = Lazy::new(|| {
    parse_decomposition_map(&gunzip(include_bytes!(concat!(
        env!("OUT_DIR"),
        "/decomposition.bin.gz"
    ))))
});
static FOLD: Lazy<HashMap<u32, Vec<u32>>> =
    Lazy::new(|| parse_fold_map(&gunzip(include_bytes!(concat!(env!("OUT_DIR"), "/fold.bin.gz")))));
static COMPOSITES: Lazy<Vec<(u32, u32, u32)>> = Lazy::new(|| {
    parse_composite_map(&gunzip(include_bytes!(concat!(
        env!("OUT_DIR"),
        "/composites.bin.gz"
    ))))
});
static EMOJI_VARIATION: Lazy<TwoStageTable> = Lazy::new(|| {
    TwoStageTable::parse(&gunzip(include_bytes!(concat!(
        env!("OUT_DIR"),
        "/emoji_variation.bin.gz"
    ))))
});

/// Grapheme_Cluster_Break property values (UAX #29 Table 2), plus `XX`
/// for "no applicable value" (GB999's catch-all "Other").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphemeClusterBreak {
    CN,
    CR,
    EB,
    EBG,
    EM,
    EX,
    GAZ,
    L,
    LF,
    LV,
    LVT,
    PP,
    RI,
    SM,
    T,
    V,
    XX,
    ZWJ,
}

impl From<u8> for GraphemeClusterBreak {
    fn from(v: u8) -> Self {
        use GraphemeClusterBreak::*;
        match v {
            0 => CN,
            1 => CR,
            2 => EB,
            3 => EBG,
            4 => EM,
            5 => EX,
            6 => GAZ,
            7 => L,
            8 => LF,
            9 => LV,
            10 => LVT,
            11 => PP,
            12 => RI,
            13 => SM,
            14 => T,
            15 => V,
            16 => ZWJ,
            _ => XX,
        }
    }
}

pub fn grapheme_cluster_break(code_point: u32) -> GraphemeClusterBreak {
    GraphemeClusterBreak::from(GBP.get(code_point))
}

/// Indic_Conjunct_Break property values (GB9c).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicConjunctBreak {
    None,
    Consonant,
    Extend,
    Linker,
}

impl From<u8> for IndicConjunctBreak {
    fn from(v: u8) -> Self {
        use IndicConjunctBreak::*;
        match v {
            1 => Consonant,
            2 => Extend,
            3 => Linker,
            _ => None,
        }
    }
}

pub fn indic_conjunct_break(code_point: u32) -> IndicConjunctBreak {
    IndicConjunctBreak::from(INCB.get(code_point))
}

pub fn is_extended_pictographic(code_point: u32) -> bool {
    EXT_PICT.get(code_point) != 0
}

pub fn combining_class(code_point: u32) -> u8 {
    CCC.get(code_point)
}

pub fn is_starter(code_point: u32) -> bool {
    combining_class(code_point) == 0
}

/// Raw display width category: 0 (zero-width), 1 (narrow, the default),
/// 2 (wide), 3 (East Asian "ambiguous" — 1 or 2 depending on a runtime
/// flag, see [`crate::width::WidthOptions`]), 4 (BACKSPACE/DEL, width
/// -1), 5 (three-em dash, width 3). Categories 3-5 exist because
/// spec.md's `dwp` table stores an `i8 ∈ {-1,0,1,2,3}` directly, but
/// "ambiguous" can't be baked into that value at table-generation time —
/// it needs to stay distinguishable from a literal narrow/wide width
/// until a caller's [`crate::width::WidthOptions`] picks one.
pub fn display_width_class(code_point: u32) -> u8 {
    WIDTH.get(code_point)
}

/// True if `code_point` participates in an emoji variation sequence whose
/// default presentation is emoji (wide); used by the width calculator's
/// `U+FE0E`/`U+FE0F` override (§4.6).
pub fn has_emoji_variation(code_point: u32) -> bool {
    EMOJI_VARIATION.get(code_point) != 0
}

const QC_NFD_NO: u8 = 1 << 0;
const QC_NFKD_NO: u8 = 1 << 1;
const QC_NFC_NO: u8 = 1 << 2;
const QC_NFC_MAYBE: u8 = 1 << 3;
const QC_NFKC_NO: u8 = 1 << 4;
const QC_NFKC_MAYBE: u8 = 1 << 5;

#[derive(Debug, PartialEq, Eq)]
pub enum QuickCheckVal {
    Yes,
    No,
    Maybe,
}

pub fn is_allowed(code_point: u32, normalisation: &Normalisation) -> QuickCheckVal {
    let bits = QUICK_CHECK.get(code_point);
    match normalisation {
        Normalisation::NFD => {
            if bits & QC_NFD_NO != 0 {
                QuickCheckVal::No
            } else {
                QuickCheckVal::Yes
            }
        }
        Normalisation::NFKD => {
            if bits & QC_NFKD_NO != 0 {
                QuickCheckVal::No
            } else {
                QuickCheckVal::Yes
            }
        }
        Normalisation::NFC => {
            if bits & QC_NFC_NO != 0 {
                QuickCheckVal::No
            } else if bits & QC_NFC_MAYBE != 0 {
                QuickCheckVal::Maybe
            } else {
                QuickCheckVal::Yes
            }
        }
        Normalisation::NFKC => {
            if bits & QC_NFKC_NO != 0 {
                QuickCheckVal::No
            } else if bits & QC_NFKC_MAYBE != 0 {
                QuickCheckVal::Maybe
            } else {
                QuickCheckVal::Yes
            }
        }
    }
}

const SBASE: u32 = 0xAC00;
const LBASE: u32 = 0x1100;
const VBASE: u32 = 0x1161;
const TBASE: u32 = 0x11A7;
const LCOUNT: u32 = 19;
const VCOUNT: u32 = 21;
const TCOUNT: u32 = 28;
const NCOUNT: u32 = VCOUNT * TCOUNT;
const SCOUNT: u32 = LCOUNT * NCOUNT;

/// Canonical or compatibility decomposition mapping for a single code
/// point, one recursion step (the caller, [`crate::normalise::decompose`],
/// applies this recursively). Hangul syllables are handled algorithmically
/// per UAX #15 rather than tabulated (D132/D133).
pub fn decomposition_mapping(code_point: u32, compatibility: bool) -> Option<Vec<u32>> {
    if (SBASE..SBASE + SCOUNT).contains(&code_point) {
        let s_index = code_point - SBASE;
        let l = LBASE + s_index / NCOUNT;
        let v = VBASE + (s_index % NCOUNT) / TCOUNT;
        let t_index = s_index % TCOUNT;
        return Some(if t_index == 0 {
            vec![l, v]
        } else {
            vec![l, v, TBASE + t_index]
        });
    }
    DECOMPOSITION.get(&code_point).and_then(|entry| {
        if entry.compatibility_only && !compatibility {
            None
        } else {
            Some(entry.outs.clone())
        }
    })
}

/// The primary composite of a starter/combining-mark (or starter/starter)
/// pair, per D114/D132. Hangul composition (`L + V`, `LV + T`) is
/// algorithmic and handled by the caller, [`crate::normalise::compose_pair`].
pub fn primary_composite(first: u32, second: u32) -> Option<u32> {
    COMPOSITES
        .binary_search_by(|(c1, c2, _)| (*c1, *c2).cmp(&(first, second)))
        .ok()
        .map(|i| COMPOSITES[i].2)
}

pub fn compose_hangul(first: u32, second: u32) -> Option<u32> {
    if (LBASE..LBASE + LCOUNT).contains(&first) && (VBASE..VBASE + VCOUNT).contains(&second) {
        let l_index = first - LBASE;
        let v_index = second - VBASE;
        return Some(SBASE + (l_index * VCOUNT + v_index) * TCOUNT);
    }
    if (SBASE..SBASE + SCOUNT).contains(&first)
        && (first - SBASE) % TCOUNT == 0
        && (TBASE + 1..TBASE + TCOUNT).contains(&second)
    {
        return Some(first + (second - TBASE));
    }
    None
}

/// Full case folding (CaseFolding.txt status `C` and `F` only, per §4.4).
pub fn case_folding(code_point: u32) -> Option<Vec<u32>> {
    FOLD.get(&code_point).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hangul_decompose_and_compose() {
        // GA = L GIYEOK + V A
        assert_eq!(decomposition_mapping(0xAC00, false), Some(vec![0x1100, 0x1161]));
        assert_eq!(compose_hangul(0x1100, 0x1161), Some(0xAC00));
        // GAG = GA + T GIYEOK
        assert_eq!(
            decomposition_mapping(0xAC01, false),
            Some(vec![0x1100, 0x1161, 0x11A8])
        );
        assert_eq!(compose_hangul(0xAC00, 0x11A8), Some(0xAC01));
    }
}

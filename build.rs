//! Offline table generator: turns the UCD snapshot files under
//! `resources/ucd/` into the packed binary tables `src/ucd.rs` embeds via
//! `include_bytes!`. One generator function per property family, as laid
//! out in SPEC_FULL.md §5.7: `gbp`, `incb`, `ext_pict`, `ccc`, `width`,
//! `emoji_variation`, `quick_check`, `decomposition`, `fold`,
//! `composites`. Generators are deterministic: the same input files
//! always produce byte-identical output, since everything here is a pure
//! function of the parsed UCD data (no timestamps, no randomness).

use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const BLOCK: usize = 256;
const STAGE1_LEN: usize = 0x1100;

fn ucd_path(name: &str) -> PathBuf {
    Path::new("resources/ucd").join(name)
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("reading {}: {}", path.display(), e))
        .lines()
        .map(|l| l.split('#').next().unwrap_or("").trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

fn parse_code_point_or_range(field: &str) -> (u32, u32) {
    let field = field.trim();
    if let Some((start, end)) = field.split_once("..") {
        (
            u32::from_str_radix(start.trim(), 16).unwrap(),
            u32::from_str_radix(end.trim(), 16).unwrap(),
        )
    } else {
        let cp = u32::from_str_radix(field, 16).unwrap();
        (cp, cp)
    }
}

/// Builds a two-stage table (stage1 block index | deduplicated 256-entry
/// stage2 blocks) from a full `[u8; 0x110000]` uncompressed array.
fn build_two_stage(full: &[u8]) -> Vec<u8> {
    let mut stage1: Vec<u16> = Vec::with_capacity(STAGE1_LEN);
    let mut stage2: Vec<u8> = Vec::new();
    let mut seen_blocks: HashMap<Vec<u8>, u16> = HashMap::new();

    for block_idx in 0..STAGE1_LEN {
        let start = block_idx * BLOCK;
        let end = (start + BLOCK).min(full.len());
        let block: &[u8] = if start < full.len() {
            &full[start..end]
        } else {
            &[]
        };
        let mut padded = vec![0u8; BLOCK];
        padded[..block.len()].copy_from_slice(block);

        let id = *seen_blocks.entry(padded.clone()).or_insert_with(|| {
            let i = (stage2.len() / BLOCK) as u16;
            stage2.extend_from_slice(&padded);
            i
        });
        stage1.push(id);
    }

    let mut out = Vec::new();
    out.extend_from_slice(&(stage1.len() as u32).to_le_bytes());
    for s in &stage1 {
        out.extend_from_slice(&s.to_le_bytes());
    }
    out.extend_from_slice(&(stage2.len() as u32).to_le_bytes());
    out.extend_from_slice(&stage2);
    out
}

fn write_gz(out_dir: &Path, name: &str, bytes: &[u8]) {
    let path = out_dir.join(name);
    let f = fs::File::create(&path).unwrap_or_else(|e| panic!("creating {}: {}", path.display(), e));
    let mut enc = GzEncoder::new(f, Compression::default());
    enc.write_all(bytes).unwrap();
    enc.finish().unwrap();
}

fn gen_gbp() -> Vec<u8> {
    let code_of = |name: &str| -> u8 {
        match name {
            "CN" | "Control" => 0,
            "CR" => 1,
            "EB" | "E_Base" => 2,
            "EBG" | "E_Base_GAZ" => 3,
            "EM" | "E_Modifier" => 4,
            "EX" | "Extend" => 5,
            "GAZ" | "Glue_After_Zwj" => 6,
            "L" | "L_Jamo" => 7,
            "LF" => 8,
            "LV" | "LV_Jamo" => 9,
            "LVT" | "LVT_Jamo" => 10,
            "PP" | "Prepend" => 11,
            "RI" | "Regional_Indicator" => 12,
            "SM" | "SpacingMark" => 13,
            "T" | "T_Jamo" => 14,
            "V" | "V_Jamo" => 15,
            "ZWJ" => 16,
            _ => 255,
        }
    };
    let mut full = vec![255u8; 0x110000];
    for line in read_lines(&ucd_path("auxiliary/GraphemeBreakProperty.txt")) {
        let mut parts = line.splitn(2, ';');
        let range = parts.next().unwrap();
        let prop = parts.next().unwrap().trim();
        let (start, end) = parse_code_point_or_range(range);
        let code = code_of(prop);
        for cp in start..=end {
            full[cp as usize] = code;
        }
    }
    build_two_stage(&full)
}

fn gen_incb() -> Vec<u8> {
    let mut full = vec![0u8; 0x110000]; // 0 = None
    for line in read_lines(&ucd_path("DerivedCoreProperties.txt")) {
        let parts: Vec<&str> = line.split(';').map(|s| s.trim()).collect();
        if parts.len() < 3 || parts[1] != "Indic_Conjunct_Break" {
            continue;
        }
        let (start, end) = parse_code_point_or_range(parts[0]);
        let code = match parts[2] {
            "Consonant" => 1,
            "Extend" => 2,
            "Linker" => 3,
            _ => 0,
        };
        for cp in start..=end {
            full[cp as usize] = code;
        }
    }
    build_two_stage(&full)
}

fn gen_ext_pict() -> Vec<u8> {
    let mut full = vec![0u8; 0x110000];
    for line in read_lines(&ucd_path("emoji/emoji-data.txt")) {
        let mut parts = line.splitn(2, ';');
        let range = parts.next().unwrap();
        let prop = parts.next().unwrap().trim();
        if prop != "Extended_Pictographic" {
            continue;
        }
        let (start, end) = parse_code_point_or_range(range);
        for cp in start..=end {
            full[cp as usize] = 1;
        }
    }
    build_two_stage(&full)
}

fn gen_emoji_variation() -> Vec<u8> {
    let mut full = vec![0u8; 0x110000];
    for line in read_lines(&ucd_path("emoji/emoji-variation-sequences.txt")) {
        let mut tokens = line.split_whitespace();
        let cp_tok = tokens.next().unwrap();
        let cp = u32::from_str_radix(cp_tok, 16).unwrap();
        full[cp as usize] = 1;
    }
    build_two_stage(&full)
}

fn build_ccc_full() -> Vec<u8> {
    let mut full = vec![0u8; 0x110000];
    for line in read_lines(&ucd_path("extracted/DerivedCombiningClass.txt")) {
        let parts: Vec<&str> = line.split(';').map(|s| s.trim()).collect();
        let (start, end) = parse_code_point_or_range(parts[0]);
        let ccc: u8 = parts[1].parse().unwrap();
        for cp in start..=end {
            full[cp as usize] = ccc;
        }
    }
    full
}

fn gen_ccc() -> Vec<u8> {
    build_two_stage(&build_ccc_full())
}

struct UnicodeDataRow {
    code_point: u32,
    general_category: String,
    combining_class: u8,
    decomposition: Option<(bool, Vec<u32>)>, // (compatibility_only, mapping)
}

fn parse_unicode_data() -> Vec<UnicodeDataRow> {
    let mut rows = Vec::new();
    for line in fs::read_to_string(ucd_path("UnicodeData.txt")).unwrap().lines() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(';').collect();
        let code_point = u32::from_str_radix(fields[0], 16).unwrap();
        let general_category = fields[2].to_string();
        let combining_class: u8 = fields[3].parse().unwrap_or(0);
        let decomp_field = fields[5].trim();
        let decomposition = if decomp_field.is_empty() {
            None
        } else {
            let compat = decomp_field.starts_with('<');
            let mapping_str = if compat {
                decomp_field.split_once('>').map(|(_, r)| r).unwrap_or("")
            } else {
                decomp_field
            };
            let mapping: Vec<u32> = mapping_str
                .split_whitespace()
                .map(|s| u32::from_str_radix(s, 16).unwrap())
                .collect();
            Some((compat, mapping))
        };
        rows.push(UnicodeDataRow {
            code_point,
            general_category,
            combining_class,
            decomposition,
        });
    }
    rows
}

fn is_zero_width_category(gc: &str) -> bool {
    matches!(gc, "Mn" | "Me" | "Cf" | "Cc" | "Zl" | "Zp")
}

fn gen_width(rows: &[UnicodeDataRow]) -> Vec<u8> {
    // 0 = zero width, 1 = narrow (default), 2 = wide, 3 = ambiguous,
    // 4 = -1 (BACKSPACE/DEL), 5 = 3 (three-em dash) — spec.md §3's
    // dwp table, `i8 ∈ {-1,0,1,2,3}`, packed into a u8 category byte
    // since East-Asian "ambiguous" needs to stay distinguishable from a
    // literal 1 (its final width depends on a runtime flag).
    let mut full = vec![1u8; 0x110000];
    for row in rows {
        if is_zero_width_category(&row.general_category) {
            full[row.code_point as usize] = 0;
        }
    }
    for line in read_lines(&ucd_path("EastAsianWidth.txt")) {
        let mut parts = line.splitn(2, ';');
        let range = parts.next().unwrap();
        let class = parts.next().unwrap().trim();
        let (start, end) = parse_code_point_or_range(range);
        let code = match class {
            "W" | "F" => 2,
            "A" => 3,
            _ => continue,
        };
        for cp in start..=end {
            full[cp as usize] = code;
        }
    }
    full[0x08] = 4; // BACKSPACE
    full[0x7F] = 4; // DEL
    full[0x2E3B] = 5; // THREE-EM DASH
    build_two_stage(&full)
}

fn gen_quick_check() -> Vec<u8> {
    const NFD_NO: u8 = 1 << 0;
    const NFKD_NO: u8 = 1 << 1;
    const NFC_NO: u8 = 1 << 2;
    const NFC_MAYBE: u8 = 1 << 3;
    const NFKC_NO: u8 = 1 << 4;
    const NFKC_MAYBE: u8 = 1 << 5;

    let mut full = vec![0u8; 0x110000];
    for line in read_lines(&ucd_path("DerivedNormalizationProps.txt")) {
        let parts: Vec<&str> = line.split(';').map(|s| s.trim()).collect();
        if parts.len() < 3 {
            continue;
        }
        let (start, end) = parse_code_point_or_range(parts[0]);
        let bit = match (parts[1], parts[2]) {
            ("NFD_QC", "N") => NFD_NO,
            ("NFKD_QC", "N") => NFKD_NO,
            ("NFC_QC", "N") => NFC_NO,
            ("NFC_QC", "M") => NFC_MAYBE,
            ("NFKC_QC", "N") => NFKC_NO,
            ("NFKC_QC", "M") => NFKC_MAYBE,
            _ => continue,
        };
        for cp in start..=end {
            full[cp as usize] |= bit;
        }
    }
    build_two_stage(&full)
}

fn gen_decomposition(rows: &[UnicodeDataRow]) -> Vec<u8> {
    let mut out = Vec::new();
    let entries: Vec<&UnicodeDataRow> = rows.iter().filter(|r| r.decomposition.is_some()).collect();
    out.extend_from_slice(&(entries.len() as u32).to_le_bytes());
    for row in entries {
        let (compat, mapping) = row.decomposition.as_ref().unwrap();
        assert!(mapping.len() <= 4, "decomposition mapping too long for fixed-width table");
        out.extend_from_slice(&row.code_point.to_le_bytes());
        out.push(mapping.len() as u8);
        out.push(if *compat { 1 } else { 0 });
        let mut outs = [0u32; 4];
        outs[..mapping.len()].copy_from_slice(mapping);
        for o in outs {
            out.extend_from_slice(&o.to_le_bytes());
        }
    }
    out
}

fn composition_exclusions() -> Vec<u32> {
    read_lines(&ucd_path("CompositionExclusions.txt"))
        .into_iter()
        .map(|l| u32::from_str_radix(l.trim(), 16).unwrap())
        .collect()
}

fn gen_composites(rows: &[UnicodeDataRow]) -> Vec<u8> {
    let exclusions = composition_exclusions();
    let ccc = build_ccc_full();
    let mut pairs: Vec<(u32, u32, u32)> = Vec::new();
    for row in rows {
        if exclusions.contains(&row.code_point) {
            continue;
        }
        if let Some((false, mapping)) = &row.decomposition {
            // (c) a canonical decomposition that starts with a non-starter
            // is never composed back (spec.md §4.3(c)) — e.g. certain
            // Tibetan vowel signs decompose to a non-starter followed by
            // another combining mark, and that pair must stay decomposed.
            if mapping.len() == 2 && ccc[mapping[0] as usize] == 0 {
                pairs.push((mapping[0], mapping[1], row.code_point));
            }
        }
    }
    pairs.sort_by_key(|(c1, c2, _)| (*c1, *c2));
    let mut out = Vec::new();
    out.extend_from_slice(&(pairs.len() as u32).to_le_bytes());
    for (c1, c2, composite) in pairs {
        out.extend_from_slice(&c1.to_le_bytes());
        out.extend_from_slice(&c2.to_le_bytes());
        out.extend_from_slice(&composite.to_le_bytes());
    }
    out
}

fn gen_fold() -> Vec<u8> {
    let mut out = Vec::new();
    let mut entries: Vec<(u32, Vec<u32>)> = Vec::new();
    for line in read_lines(&ucd_path("CaseFolding.txt")) {
        let parts: Vec<&str> = line.split(';').map(|s| s.trim()).collect();
        if parts.len() < 3 {
            continue;
        }
        let status = parts[1];
        if status != "C" && status != "F" {
            continue;
        }
        let key = u32::from_str_radix(parts[0], 16).unwrap();
        let mapping: Vec<u32> = parts[2]
            .split_whitespace()
            .map(|s| u32::from_str_radix(s, 16).unwrap())
            .collect();
        assert!(mapping.len() <= 3, "fold mapping too long for fixed-width table");
        entries.push((key, mapping));
    }
    out.extend_from_slice(&(entries.len() as u32).to_le_bytes());
    for (key, mapping) in entries {
        out.extend_from_slice(&key.to_le_bytes());
        out.push(mapping.len() as u8);
        let mut outs = [0u32; 3];
        outs[..mapping.len()].copy_from_slice(&mapping);
        for o in outs {
            out.extend_from_slice(&o.to_le_bytes());
        }
    }
    out
}

fn main() {
    let _ = env_logger::try_init();
    println!("cargo:rerun-if-changed=resources/ucd");
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let rows = parse_unicode_data();

    write_gz(&out_dir, "gbp.bin.gz", &gen_gbp());
    write_gz(&out_dir, "incb.bin.gz", &gen_incb());
    write_gz(&out_dir, "ext_pict.bin.gz", &gen_ext_pict());
    write_gz(&out_dir, "emoji_variation.bin.gz", &gen_emoji_variation());
    write_gz(&out_dir, "ccc.bin.gz", &gen_ccc());
    write_gz(&out_dir, "width.bin.gz", &gen_width(&rows));
    write_gz(&out_dir, "quick_check.bin.gz", &gen_quick_check());
    write_gz(&out_dir, "decomposition.bin.gz", &gen_decomposition(&rows));
    write_gz(&out_dir, "composites.bin.gz", &gen_composites(&rows));
    write_gz(&out_dir, "fold.bin.gz", &gen_fold());

    log::info!("generated unicode-core tables into {}", out_dir.display());
}

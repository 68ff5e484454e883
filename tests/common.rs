use complexscripts::context::LookupFlag;
use complexscripts::coverage::CoverageEntry;
use complexscripts::font::{BfEntry, EmbeddingMode, MultiByteFont};
use complexscripts::gpos::{GlyphPositioningTable, PosKind, ValueRecord};
use complexscripts::gsub::{GlyphSubstitutionTable, Ligature, LigatureSet, SubstKind};
use complexscripts::layout::{GlyphSubtable, LookupSpec, PosLookupType, SubstLookupType, SubtableEntries};

pub const BEH: char = '\u{0628}';
pub const ALEF: char = '\u{0627}';
pub const LAM: char = '\u{0644}';

/// Glyph ids of the Arabic test font: nominal forms follow the code points from HAMZA.
pub const ALEF_GLYPH: u16 = 7;
pub const BEH_GLYPH: u16 = 8;
pub const LAM_GLYPH: u16 = 36;
pub const BEH_FINA: u16 = 200;
pub const BEH_MEDI: u16 = 201;
pub const BEH_INIT: u16 = 202;
pub const ALEF_FINA: u16 = 210;
pub const LAM_ALEF: u16 = 300;

pub fn utf16(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}

pub fn lookup(script: &str, language: &str, feature: &str, ids: &[&str]) -> (LookupSpec, Vec<String>) {
    let spec = LookupSpec::new(script, language, feature).unwrap();
    (spec, ids.iter().map(|id| id.to_string()).collect())
}

fn glyph_coverage(glyphs: &[i32]) -> Vec<CoverageEntry> {
    glyphs.iter().map(|&glyph| CoverageEntry::Glyph(glyph)).collect()
}

pub fn single_subst(id: &str, sequence: u32, coverage: &[i32], glyphs: &[u16]) -> GlyphSubtable<SubstKind> {
    GlyphSubstitutionTable::create_subtable(
        SubstLookupType::SingleSubst,
        id,
        sequence,
        LookupFlag::empty(),
        2,
        &glyph_coverage(coverage),
        SubtableEntries::Glyphs(glyphs.to_vec()),
    )
    .unwrap()
}

/// A ligature subtable; each coverage glyph has a set of `(ligature, components)` pairs.
pub fn ligature_subst(
    id: &str,
    sequence: u32,
    coverage: &[i32],
    sets: &[&[(i32, &str)]],
) -> GlyphSubtable<SubstKind> {
    let ligature_sets = sets
        .iter()
        .map(|set| {
            let ligatures = set
                .iter()
                .map(|&(ligature, components)| Ligature::parse(ligature, components).unwrap())
                .collect();
            LigatureSet::new(ligatures).unwrap()
        })
        .collect();
    GlyphSubstitutionTable::create_subtable(
        SubstLookupType::LigatureSubst,
        id,
        sequence,
        LookupFlag::empty(),
        1,
        &glyph_coverage(coverage),
        SubtableEntries::LigatureSets(ligature_sets),
    )
    .unwrap()
}

pub fn single_pos(id: &str, coverage: &[i32], value_record: ValueRecord) -> GlyphSubtable<PosKind> {
    GlyphPositioningTable::create_subtable(
        PosLookupType::SinglePos,
        id,
        0,
        LookupFlag::empty(),
        1,
        &glyph_coverage(coverage),
        SubtableEntries::Values(vec![value_record]),
    )
    .unwrap()
}

/// Latin capitals from glyph 1.
pub fn latin_font(embedding_mode: EmbeddingMode) -> MultiByteFont {
    MultiByteFont::new(vec![BfEntry::new(0x41, 0x5A, 1).unwrap()], embedding_mode)
}

/// The Arabic letters and harakat from HAMZA to SUKUN, from glyph 1, with contextual forms
/// for BEH and ALEF and a LAM-ALEF ligature.
pub fn arabic_font() -> MultiByteFont {
    let gsub = GlyphSubstitutionTable::new(
        vec![
            lookup("arab", "dflt", "init", &["init"]),
            lookup("arab", "dflt", "medi", &["medi"]),
            lookup("arab", "dflt", "fina", &["fina"]),
            lookup("arab", "dflt", "rlig", &["rlig"]),
        ],
        vec![
            single_subst("init", 0, &[i32::from(BEH_GLYPH)], &[BEH_INIT]),
            single_subst("medi", 1, &[i32::from(BEH_GLYPH)], &[BEH_MEDI]),
            single_subst(
                "fina",
                2,
                &[i32::from(ALEF_GLYPH), i32::from(BEH_GLYPH)],
                &[ALEF_FINA, BEH_FINA],
            ),
            ligature_subst(
                "rlig",
                3,
                &[i32::from(LAM_GLYPH)],
                &[&[(i32::from(LAM_ALEF), "210")]],
            ),
        ],
    )
    .unwrap();
    MultiByteFont::new(
        vec![BfEntry::new(0x0621, 0x0652, 1).unwrap()],
        EmbeddingMode::Full,
    )
    .with_gsub(gsub)
}

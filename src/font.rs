//! Character and glyph correspondence for multi-byte (CID-keyed) fonts.
//!
//! `MultiByteFont` owns the font's character to glyph ranges and drives substitution and
//! positioning over them. Glyphs that substitution produces without a natural character, such
//! as ligatures, are given characters from the private use area so that shaped output can always
//! be mapped back to text.

use log::{debug, warn};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::error::{ShapingError, TableError};
use crate::gdef::{GlyphClass, GlyphDefinitionTable};
use crate::glyph_sequence::{CharAssociation, GlyphSequence};
use crate::gpos::{Adjustment, GlyphPositioningTable};
use crate::gsub::GlyphSubstitutionTable;
use crate::subset::CidSubset;

/// Glyph returned for characters the font does not map.
pub const MISSING_GLYPH: u16 = 0;

/// Character returned for glyphs that cannot be mapped back to text.
pub const MISSING_CHAR: char = '\u{FFFF}';

const PRIVATE_USE_START: u32 = 0xE000;
const PRIVATE_USE_END: u32 = 0xF900;

/// A run of consecutive characters mapped to consecutive glyphs, `unicode_end` inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BfEntry {
    unicode_start: u32,
    unicode_end: u32,
    glyph_start: u16,
}

impl BfEntry {
    pub fn new(unicode_start: u32, unicode_end: u32, glyph_start: u16) -> Result<BfEntry, TableError> {
        if unicode_start > unicode_end
            || unicode_end > u32::from(char::MAX)
            || u32::from(glyph_start) + (unicode_end - unicode_start) > u32::from(u16::MAX)
        {
            return Err(TableError::BadCharRange);
        }
        Ok(BfEntry {
            unicode_start,
            unicode_end,
            glyph_start,
        })
    }

    pub fn unicode_start(&self) -> u32 {
        self.unicode_start
    }

    pub fn unicode_end(&self) -> u32 {
        self.unicode_end
    }

    pub fn glyph_start(&self) -> u16 {
        self.glyph_start
    }

    fn contains_char(&self, unicode: u32) -> bool {
        unicode >= self.unicode_start && unicode <= self.unicode_end
    }

    fn glyph_for(&self, unicode: u32) -> Option<u16> {
        if self.contains_char(unicode) {
            // Bounded by the check in `new`
            Some(self.glyph_start + (unicode - self.unicode_start) as u16)
        } else {
            None
        }
    }

    fn char_for(&self, glyph: u16) -> Option<char> {
        let offset = glyph.checked_sub(self.glyph_start)?;
        let unicode = self.unicode_start + u32::from(offset);
        if unicode <= self.unicode_end {
            char::from_u32(unicode)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmbeddingMode {
    /// The whole font is embedded and glyph indices are emitted as is.
    Full,
    /// Only used glyphs are embedded and glyphs are emitted as subset selectors.
    Subset,
}

struct FontState {
    /// Native ranges followed by single character private use mappings.
    bf_entries: Vec<BfEntry>,
    native_count: usize,
    private_use_index: FxHashMap<u16, char>,
    next_private_use: u32,
    private_use_exhausted: usize,
    cid_subset: CidSubset,
}

impl FontState {
    fn find_glyph(&self, c: char) -> Option<u16> {
        let unicode = u32::from(c);
        self.bf_entries
            .iter()
            .find_map(|entry| entry.glyph_for(unicode))
    }

    fn find_char(&self, glyph: u16) -> Option<char> {
        self.bf_entries[..self.native_count]
            .iter()
            .find_map(|entry| entry.char_for(glyph))
            .or_else(|| self.private_use_index.get(&glyph).copied())
    }

    fn allocate_private_use(&mut self, glyph: u16) -> Option<char> {
        while self.next_private_use < PRIVATE_USE_END {
            let candidate = self.next_private_use;
            self.next_private_use += 1;
            if self.bf_entries[..self.native_count]
                .iter()
                .any(|entry| entry.contains_char(candidate))
            {
                continue;
            }
            let c = char::from_u32(candidate)?;
            self.bf_entries.push(BfEntry {
                unicode_start: candidate,
                unicode_end: candidate,
                glyph_start: glyph,
            });
            self.private_use_index.insert(glyph, c);
            debug!("glyph {} mapped to private use U+{:04X}", glyph, candidate);
            return Some(c);
        }
        None
    }

    fn map_glyph_to_char(&mut self, glyph: u16) -> char {
        if let Some(c) = self.find_char(glyph) {
            return c;
        }
        match self.allocate_private_use(glyph) {
            Some(c) => c,
            None => {
                self.private_use_exhausted += 1;
                if self.private_use_exhausted == 1 {
                    warn!(
                        "private use area exhausted, glyph {} has no character mapping",
                        glyph
                    );
                } else {
                    debug!("glyph {} has no character mapping", glyph);
                }
                MISSING_CHAR
            }
        }
    }
}

/// A CID-keyed font's character/glyph tables and optional layout tables.
///
/// All operations take `&self`; the mutable mapping state sits behind a lock so a font may be
/// shared between threads.
pub struct MultiByteFont {
    embedding_mode: EmbeddingMode,
    gsub: Option<GlyphSubstitutionTable>,
    gpos: Option<GlyphPositioningTable>,
    gdef: Option<GlyphDefinitionTable>,
    state: Mutex<FontState>,
}

impl MultiByteFont {
    pub fn new(bf_entries: Vec<BfEntry>, embedding_mode: EmbeddingMode) -> MultiByteFont {
        let native_count = bf_entries.len();
        MultiByteFont {
            embedding_mode,
            gsub: None,
            gpos: None,
            gdef: None,
            state: Mutex::new(FontState {
                bf_entries,
                native_count,
                private_use_index: FxHashMap::default(),
                next_private_use: PRIVATE_USE_START,
                private_use_exhausted: 0,
                cid_subset: CidSubset::new(),
            }),
        }
    }

    pub fn with_gsub(mut self, gsub: GlyphSubstitutionTable) -> MultiByteFont {
        self.gsub = Some(gsub);
        self
    }

    pub fn with_gpos(mut self, gpos: GlyphPositioningTable) -> MultiByteFont {
        self.gpos = Some(gpos);
        self
    }

    pub fn with_gdef(mut self, gdef: GlyphDefinitionTable) -> MultiByteFont {
        self.gdef = Some(gdef);
        self
    }

    pub fn embedding_mode(&self) -> EmbeddingMode {
        self.embedding_mode
    }

    pub fn gsub(&self) -> Option<&GlyphSubstitutionTable> {
        self.gsub.as_ref()
    }

    pub fn gpos(&self) -> Option<&GlyphPositioningTable> {
        self.gpos.as_ref()
    }

    pub fn gdef(&self) -> Option<&GlyphDefinitionTable> {
        self.gdef.as_ref()
    }

    /// The font's glyph index for `c`, or `MISSING_GLYPH`.
    pub fn find_glyph_index(&self, c: char) -> u16 {
        let state = self.state.lock();
        find_glyph_or_missing(&state, c)
    }

    /// The glyph to emit for `c`: the glyph index, or its subset selector when subsetting.
    pub fn map_char(&self, c: char) -> u16 {
        let mut state = self.state.lock();
        let glyph = find_glyph_or_missing(&state, c);
        match self.embedding_mode {
            EmbeddingMode::Full => glyph,
            EmbeddingMode::Subset => state.cid_subset.map_subset_char(glyph, c),
        }
    }

    /// Map UTF-16 text to glyph indices with an identity association.
    pub fn map_chars_to_glyphs(&self, text: &[u16]) -> Result<GlyphSequence, ShapingError> {
        let mut chars = Vec::with_capacity(text.len());
        let mut offset = 0;
        for result in char::decode_utf16(text.iter().copied()) {
            match result {
                Ok(c) => {
                    offset += c.len_utf16();
                    chars.push(c);
                }
                Err(_) => return Err(ShapingError::UnpairedSurrogate(offset)),
            }
        }
        let glyphs = {
            let state = self.state.lock();
            chars
                .iter()
                .map(|&c| find_glyph_or_missing(&state, c))
                .collect()
        };
        Ok(GlyphSequence::new(Some(chars), Some(glyphs), None)?)
    }

    /// Map glyphs back to UTF-16 text, assigning private use characters to glyphs without one.
    pub fn map_glyphs_to_chars(&self, gs: &GlyphSequence) -> Vec<u16> {
        let mut state = self.state.lock();
        let mut text = Vec::with_capacity(gs.glyph_count());
        let mut buf = [0; 2];
        for &glyph in gs.glyphs() {
            let c = state.map_glyph_to_char(glyph);
            text.extend_from_slice(c.encode_utf16(&mut buf));
        }
        text
    }

    /// Substitute `text` for `script` and `language`, returning the shaped glyphs as text.
    ///
    /// Without a substitution table the text is returned unchanged.
    pub fn perform_substitution(
        &self,
        text: &[u16],
        script: u32,
        language: u32,
    ) -> Result<Vec<u16>, ShapingError> {
        self.perform_substitution_with_associations(text, script, language)
            .map(|(text, _associations)| text)
    }

    /// As `perform_substitution`, also returning the association of each output glyph with the
    /// characters of `text`. Associations index characters, not UTF-16 code units.
    pub fn perform_substitution_with_associations(
        &self,
        text: &[u16],
        script: u32,
        language: u32,
    ) -> Result<(Vec<u16>, Vec<CharAssociation>), ShapingError> {
        let gs = self.map_chars_to_glyphs(text)?;
        match &self.gsub {
            Some(gsub) => {
                let output = gsub.substitute(&gs, script, language)?;
                let text = self.map_glyphs_to_chars(&output);
                Ok((text, output.associations().to_vec()))
            }
            None => Ok((text.to_vec(), gs.associations().to_vec())),
        }
    }

    /// Per-glyph adjustments for `text` scaled to `font_size`, or `None` if there is no
    /// positioning table or nothing was adjusted.
    pub fn perform_positioning(
        &self,
        text: &[u16],
        script: u32,
        language: u32,
        font_size: i32,
    ) -> Result<Option<Vec<Adjustment>>, ShapingError> {
        let gpos = match &self.gpos {
            Some(gpos) => gpos,
            None => return Ok(None),
        };
        let gs = self.map_chars_to_glyphs(text)?;
        let adjustments = gpos.position(&gs, script, language)?;
        Ok(adjustments.map(|adjustments| {
            adjustments
                .iter()
                .map(|adjustment| adjustment.scale(font_size))
                .collect()
        }))
    }

    pub fn glyph_class(&self, glyph: u16) -> Option<GlyphClass> {
        self.gdef.as_ref().and_then(|gdef| gdef.glyph_class(glyph))
    }

    /// Number of reverse mappings that failed because the private use area was used up.
    pub fn private_use_exhausted_count(&self) -> usize {
        self.state.lock().private_use_exhausted
    }

    /// A snapshot of the character ranges, including synthesised private use mappings.
    pub fn bf_entries(&self) -> Vec<BfEntry> {
        self.state.lock().bf_entries.clone()
    }

    /// A snapshot of the glyphs used so far when subsetting.
    pub fn cid_subset(&self) -> CidSubset {
        self.state.lock().cid_subset.clone()
    }
}

fn find_glyph_or_missing(state: &FontState, c: char) -> u16 {
    state.find_glyph(c).unwrap_or_else(|| {
        debug!("no glyph for U+{:04X}", u32::from(c));
        MISSING_GLYPH
    })
}

//! Glyph subsetting for CID-keyed output.
//!
//! When only the glyphs actually used are embedded, each glyph is given a compact selector in
//! the order it is first used. Selector 0 is always `.notdef`.

use rustc_hash::FxHashMap;

pub trait SubsetGlyphs {
    /// The number of glyphs in this collection
    fn len(&self) -> usize;

    /// Return the old glyph id for the supplied new glyph id
    fn old_id(&self, new_id: u16) -> u16;

    /// Return the new glyph id for the supplied old glyph id
    fn new_id(&self, old_id: u16) -> u16;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubsetGlyph {
    pub old_id: u16,
    /// The character the glyph was first mapped from.
    pub unicode: char,
}

/// Accumulates the glyphs of a font subset. Grows as glyphs are first referenced and never
/// shrinks.
#[derive(Clone, Debug)]
pub struct CidSubset {
    glyphs: Vec<SubsetGlyph>,
    /// Maps an old glyph index to its selector in the subset
    old_to_new_id: FxHashMap<u16, u16>,
}

impl CidSubset {
    pub fn new() -> CidSubset {
        let notdef = SubsetGlyph {
            old_id: 0,
            unicode: '\0',
        };
        let mut old_to_new_id = FxHashMap::default();
        old_to_new_id.insert(0, 0);
        CidSubset {
            glyphs: vec![notdef],
            old_to_new_id,
        }
    }

    /// Return the selector for `old_id`, assigning the next free one if it is new to the subset.
    pub fn map_subset_char(&mut self, old_id: u16, unicode: char) -> u16 {
        if let Some(&new_id) = self.old_to_new_id.get(&old_id) {
            return new_id;
        }
        // Cast is safe as 0 is always present, leaving at most u16::MAX other glyph ids
        let new_id = self.glyphs.len() as u16;
        self.glyphs.push(SubsetGlyph { old_id, unicode });
        self.old_to_new_id.insert(old_id, new_id);
        new_id
    }

    pub fn glyph_index(&self, selector: u16) -> Option<u16> {
        self.glyphs
            .get(usize::from(selector))
            .map(|glyph| glyph.old_id)
    }

    pub fn unicode(&self, selector: u16) -> Option<char> {
        self.glyphs
            .get(usize::from(selector))
            .map(|glyph| glyph.unicode)
    }

    pub fn num_glyphs(&self) -> usize {
        self.glyphs.len()
    }

    /// `(old glyph index, selector)` pairs in selector order.
    pub fn subset_glyphs(&self) -> Vec<(u16, u16)> {
        self.glyphs
            .iter()
            .enumerate()
            .map(|(new_id, glyph)| (glyph.old_id, new_id as u16))
            .collect()
    }
}

impl Default for CidSubset {
    fn default() -> Self {
        CidSubset::new()
    }
}

impl SubsetGlyphs for CidSubset {
    fn len(&self) -> usize {
        self.glyphs.len()
    }

    fn old_id(&self, new_id: u16) -> u16 {
        self.glyph_index(new_id).unwrap_or(0)
    }

    fn new_id(&self, old_id: u16) -> u16 {
        self.old_to_new_id.get(&old_id).copied().unwrap_or(0)
    }
}

//! Lookup flags and the contextual predicates script processors attach to features.

use bitflags::bitflags;

use crate::glyph_sequence::GlyphSequence;

bitflags! {
    /// Lookup application flags. Carried with each subtable; glyph filtering by these flags is
    /// left to the table consumer.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct LookupFlag: u16 {
        const RIGHT_TO_LEFT = 0x0001;
        const IGNORE_BASE_GLYPHS = 0x0002;
        const IGNORE_LIGATURES = 0x0004;
        const IGNORE_MARKS = 0x0008;
        const USE_MARK_FILTERING_SET = 0x0010;
        const MARK_ATTACHMENT_TYPE = 0xFF00;
    }
}

/// Decides whether the glyph at an index of a sequence is in a context where a feature applies.
pub type GlyphContextTester = fn(&GlyphSequence, usize) -> bool;

/// Supplies the context predicate for a feature, or `None` when the feature applies everywhere.
pub trait ScriptContextTester {
    fn tester(&self, feature: u32) -> Option<GlyphContextTester>;
}

/// A tester that accepts every position.
pub fn always(_gs: &GlyphSequence, _index: usize) -> bool {
    true
}

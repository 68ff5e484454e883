//! Contextual form selection for Arabic script.
//!
//! Joining context is derived from the characters around each glyph's association, using their
//! bidi class: Arabic letters (`AL`) join, non-spacing marks (`NSM`) are transparent and anything
//! else breaks the join. Letters that never join to the following letter (ALEF, DAL, REH, WAW and
//! friends) break the join for the letter after them, and HAMZA never joins at all.

use log::debug;
use unicode_bidi::{bidi_class, BidiClass};

use crate::context::{GlyphContextTester, ScriptContextTester};
use crate::glyph_sequence::GlyphSequence;
use crate::scripts::ScriptProcessor;
use crate::tag;

const SUBSTITUTION_FEATURES: [u32; 8] = [
    tag::CCMP,
    tag::FINA,
    tag::MEDI,
    tag::INIT,
    tag::ISOL,
    tag::RLIG,
    tag::LIGA,
    tag::CALT,
];

const POSITIONING_FEATURES: [u32; 4] = [tag::CURS, tag::KERN, tag::MARK, tag::MKMK];

/// Arabic letters which take their isolated form in word initial position. Sorted.
const ISOLATED_INITIALS: [u32; 46] = [
    0x0621, // HAMZA
    0x0622, // ALEF WITH MADDA ABOVE
    0x0623, // ALEF WITH HAMZA ABOVE
    0x0624, // WAW WITH HAMZA ABOVE
    0x0625, // ALEF WITH HAMZA BELOW
    0x0627, // ALEF
    0x062F, // DAL
    0x0630, // THAL
    0x0631, // REH
    0x0632, // ZAIN
    0x0648, // WAW
    0x0671, // ALEF WASLA
    0x0672, // ALEF WITH WAVY HAMZA ABOVE
    0x0673, // ALEF WITH WAVY HAMZA BELOW
    0x0675, // HIGH HAMZA ALEF
    0x0676, // HIGH HAMZA WAW
    0x0677, // U WITH HAMZA ABOVE
    0x0688, // DDAL
    0x0689, // DAL WITH RING
    0x068A, // DAL WITH DOT BELOW
    0x068B, // DAL WITH DOT BELOW AND SMALL TAH
    0x068C, // DAHAL
    0x068D, // DDAHAL
    0x068E, // DUL
    0x068F, // DAL WITH THREE DOTS ABOVE DOWNWARDS
    0x0690, // DAL WITH FOUR DOTS ABOVE
    0x0691, // RREH
    0x0692, // REH WITH SMALL V
    0x0693, // REH WITH RING
    0x0694, // REH WITH DOT BELOW
    0x0695, // REH WITH SMALL V BELOW
    0x0696, // REH WITH DOT BELOW AND DOT ABOVE
    0x0697, // REH WITH TWO DOTS ABOVE
    0x0698, // JEH
    0x0699, // REH WITH FOUR DOTS ABOVE
    0x06C4, // WAW WITH RING
    0x06C5, // KIRGHIZ OE
    0x06C6, // OE
    0x06C7, // U
    0x06C8, // YU
    0x06C9, // KIRGHIZ YU
    0x06CA, // WAW WITH TWO DOTS ABOVE
    0x06CB, // VE
    0x06CF, // WAW WITH DOT ABOVE
    0x06EE, // DAL WITH INVERTED V
    0x06EF, // REH WITH INVERTED V
];

/// Arabic letters which take their isolated form in word final position. Sorted.
const ISOLATED_FINALS: [u32; 1] = [
    0x0621, // HAMZA
];

#[derive(Debug, Default)]
pub struct ArabicProcessor;

impl ScriptContextTester for ArabicProcessor {
    fn tester(&self, feature: u32) -> Option<GlyphContextTester> {
        let tester: GlyphContextTester = match feature {
            tag::FINA => final_context,
            tag::MEDI => medial_context,
            tag::INIT => initial_context,
            tag::ISOL => isolated_context,
            tag::LIGA | tag::RLIG => ligature_context,
            _ => return None,
        };
        Some(tester)
    }
}

impl ScriptProcessor for ArabicProcessor {
    fn substitution_features(&self) -> &[u32] {
        &SUBSTITUTION_FEATURES
    }

    fn positioning_features(&self) -> &[u32] {
        &POSITIONING_FEATURES
    }
}

pub fn final_context(gs: &GlyphSequence, index: usize) -> bool {
    test_context(gs, index, "+FIN", |chars, s, e| {
        preceding_joins(chars, s) && !following_joins(chars, e)
    })
}

pub fn medial_context(gs: &GlyphSequence, index: usize) -> bool {
    test_context(gs, index, "+MED", |chars, s, e| {
        preceding_joins(chars, s)
            && following_joins(chars, e)
            && first_letter(chars, s, e)
                .map_or(false, |c| is_arabic_letter(c) && !is_isolated_final(c))
            && last_letter(chars, s, e).map_or(false, is_arabic_letter)
    })
}

pub fn initial_context(gs: &GlyphSequence, index: usize) -> bool {
    test_context(gs, index, "+INI", |chars, s, e| {
        !preceding_joins(chars, s) && following_joins(chars, e)
    })
}

/// True when the glyph stands for the whole character sequence.
pub fn isolated_context(gs: &GlyphSequence, index: usize) -> bool {
    test_context(gs, index, "+ISO", |chars, s, e| s == 0 && e == chars.len())
}

pub fn ligature_context(gs: &GlyphSequence, index: usize) -> bool {
    test_context(gs, index, "+LIG", |chars, _s, e| {
        following_letter(chars, e).map_or(false, is_arabic_letter)
    })
}

fn test_context(
    gs: &GlyphSequence,
    index: usize,
    label: &str,
    test: impl Fn(&[char], usize, usize) -> bool,
) -> bool {
    let chars = gs.characters();
    if chars.is_empty() {
        return false;
    }
    let association = match gs.association(index) {
        Some(association) => association,
        None => return false,
    };
    let s = association.start().min(chars.len());
    let e = association.end().clamp(s, chars.len());
    let result = test(chars, s, e);
    if result {
        debug!("{}: [{},{}) glyph {}", label, s, e, index);
    }
    result
}

fn preceding_joins(chars: &[char], s: usize) -> bool {
    preceding_letter(chars, s).map_or(false, |c| is_arabic_letter(c) && !is_isolated_initial(c))
}

fn following_joins(chars: &[char], e: usize) -> bool {
    following_letter(chars, e).map_or(false, |c| is_arabic_letter(c) && !is_isolated_final(c))
}

// Nearest character before `s` that is not a mark.
fn preceding_letter(chars: &[char], s: usize) -> Option<char> {
    chars[..s].iter().rev().copied().find(|&c| !is_mark(c))
}

// Nearest character at or after `e` that is not a mark.
fn following_letter(chars: &[char], e: usize) -> Option<char> {
    chars[e..].iter().copied().find(|&c| !is_mark(c))
}

fn first_letter(chars: &[char], s: usize, e: usize) -> Option<char> {
    chars[s..e].iter().copied().find(|&c| !is_mark(c))
}

fn last_letter(chars: &[char], s: usize, e: usize) -> Option<char> {
    chars[s..e].iter().rev().copied().find(|&c| !is_mark(c))
}

fn is_arabic_letter(c: char) -> bool {
    bidi_class(c) == BidiClass::AL
}

fn is_mark(c: char) -> bool {
    bidi_class(c) == BidiClass::NSM
}

fn is_isolated_initial(c: char) -> bool {
    ISOLATED_INITIALS.binary_search(&u32::from(c)).is_ok()
}

fn is_isolated_final(c: char) -> bool {
    ISOLATED_FINALS.binary_search(&u32::from(c)).is_ok()
}

//! `gdef` glyph class definitions.
//!
//! <https://docs.microsoft.com/en-us/typography/opentype/spec/gdef>

use itertools::Itertools;

use crate::error::TableError;

pub const GLYPH_CLASS_NONE: u16 = 0;
pub const GLYPH_CLASS_BASE: u16 = 1;
pub const GLYPH_CLASS_LIGATURE: u16 = 2;
pub const GLYPH_CLASS_MARK: u16 = 3;
pub const GLYPH_CLASS_COMPONENT: u16 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlyphClass {
    Base,
    Ligature,
    Mark,
    Component,
}

impl GlyphClass {
    pub fn from_u16(class_value: u16) -> Option<GlyphClass> {
        match class_value {
            GLYPH_CLASS_BASE => Some(GlyphClass::Base),
            GLYPH_CLASS_LIGATURE => Some(GlyphClass::Ligature),
            GLYPH_CLASS_MARK => Some(GlyphClass::Mark),
            GLYPH_CLASS_COMPONENT => Some(GlyphClass::Component),
            _ => None,
        }
    }

    pub fn to_u16(self) -> u16 {
        match self {
            GlyphClass::Base => GLYPH_CLASS_BASE,
            GlyphClass::Ligature => GLYPH_CLASS_LIGATURE,
            GlyphClass::Mark => GLYPH_CLASS_MARK,
            GlyphClass::Component => GLYPH_CLASS_COMPONENT,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClassDef {
    Format1 {
        start_glyph: u16,
        class_value_array: Vec<u16>,
    },
    Format2 {
        class_range_array: Vec<ClassRangeRecord>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClassRangeRecord {
    pub start_glyph: u16,
    pub end_glyph: u16,
    pub class_value: u16,
}

impl ClassDef {
    /// A class definition from sorted, non-overlapping ranges.
    pub fn from_ranges(class_range_array: Vec<ClassRangeRecord>) -> Result<ClassDef, TableError> {
        if class_range_array
            .iter()
            .any(|range| range.start_glyph > range.end_glyph)
        {
            return Err(TableError::BadCoverageRange);
        }
        if class_range_array
            .iter()
            .tuple_windows()
            .any(|(a, b)| b.start_glyph <= a.end_glyph)
        {
            return Err(TableError::UnsortedCoverage);
        }
        Ok(ClassDef::Format2 { class_range_array })
    }

    pub fn glyph_class_value(&self, glyph: u16) -> u16 {
        match self {
            ClassDef::Format1 {
                start_glyph,
                class_value_array,
            } => glyph
                .checked_sub(*start_glyph)
                .and_then(|index| class_value_array.get(usize::from(index)))
                .copied()
                .unwrap_or(GLYPH_CLASS_NONE),
            ClassDef::Format2 { class_range_array } => {
                let i = class_range_array.partition_point(|range| range.start_glyph <= glyph);
                match i.checked_sub(1).map(|i| &class_range_array[i]) {
                    Some(range) if glyph <= range.end_glyph => range.class_value,
                    _ => GLYPH_CLASS_NONE,
                }
            }
        }
    }
}

/// Glyph definition table. Only the glyph class definition is held.
#[derive(Clone, Debug)]
pub struct GlyphDefinitionTable {
    glyph_classdef: ClassDef,
}

impl GlyphDefinitionTable {
    pub fn new(glyph_classdef: ClassDef) -> GlyphDefinitionTable {
        GlyphDefinitionTable { glyph_classdef }
    }

    /// Build from `(start, end, class)` ranges of glyph ids.
    pub fn from_ranges(ranges: &[(u16, u16, GlyphClass)]) -> Result<GlyphDefinitionTable, TableError> {
        let class_range_array = ranges
            .iter()
            .map(|&(start_glyph, end_glyph, class)| ClassRangeRecord {
                start_glyph,
                end_glyph,
                class_value: class.to_u16(),
            })
            .collect();
        Ok(GlyphDefinitionTable::new(ClassDef::from_ranges(
            class_range_array,
        )?))
    }

    pub fn glyph_class(&self, glyph: u16) -> Option<GlyphClass> {
        GlyphClass::from_u16(self.glyph_classdef.glyph_class_value(glyph))
    }
}

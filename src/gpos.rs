//! Glyph positioning (`gpos`) implementation.
//!
//! > The Glyph Positioning table (GPOS) provides precise control over glyph placement for
//! > sophisticated text layout and rendering in each script and language system that a font
//! > supports.
//!
//! — <https://docs.microsoft.com/en-us/typography/opentype/spec/gpos>
//!
//! Positioning produces one `Adjustment` per glyph in font design units, or `None` when nothing
//! was adjusted. Only single positioning is implemented; the other lookup types are accepted
//! when building a table and fail with `ShapingError::NotImplemented` when applied.

use log::debug;

use crate::context::{always, GlyphContextTester, LookupFlag};
use crate::coverage::{Coverage, CoverageEntry};
use crate::error::{ShapingError, TableError};
use crate::glyph_sequence::GlyphSequence;
use crate::layout::{
    check_entry_count, GlyphSubtable, LayoutTable, LayoutTableType, LookupSpec, PosLookupType,
    SubtableEntries, GPOS,
};
use crate::scripts;
use crate::tag::{self, DisplayTag};

/// Design units per em assumed when scaling adjustments to a font size.
pub const UNITS_PER_EM: i32 = 1000;

impl LayoutTableType for GPOS {
    type Kind = PosKind;
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ValueRecord {
    pub x_placement: i16,
    pub y_placement: i16,
    pub x_advance: i16,
    pub y_advance: i16,
}

/// Placement and advance adjustment of one glyph.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Adjustment {
    pub dx: i32,
    pub dy: i32,
    pub advance_x: i32,
    pub advance_y: i32,
}

impl Adjustment {
    pub fn is_zero(&self) -> bool {
        *self == Adjustment::default()
    }

    pub fn add_value_record(&mut self, value_record: &ValueRecord) {
        self.dx += i32::from(value_record.x_placement);
        self.dy += i32::from(value_record.y_placement);
        self.advance_x += i32::from(value_record.x_advance);
        self.advance_y += i32::from(value_record.y_advance);
    }

    /// Convert from design units to thousandths of `font_size`, saturating at the `i32` range.
    pub fn scale(&self, font_size: i32) -> Adjustment {
        let scale = |value: i32| {
            let scaled = i64::from(value) * i64::from(font_size) / i64::from(UNITS_PER_EM);
            i32::try_from(scaled).unwrap_or(if scaled < 0 { i32::MIN } else { i32::MAX })
        };
        Adjustment {
            dx: scale(self.dx),
            dy: scale(self.dy),
            advance_x: scale(self.advance_x),
            advance_y: scale(self.advance_y),
        }
    }
}

#[derive(Clone, Debug)]
pub enum SinglePos {
    Format1 { value_record: ValueRecord },
    Format2 { value_records: Vec<ValueRecord> },
}

impl SinglePos {
    fn value_record(&self, coverage_index: usize) -> Option<&ValueRecord> {
        match self {
            SinglePos::Format1 { value_record } => Some(value_record),
            SinglePos::Format2 { value_records } => value_records.get(coverage_index),
        }
    }
}

#[derive(Clone, Debug)]
pub enum PosKind {
    SinglePos(SinglePos),
    PairPos,
    CursivePos,
    MarkBasePos,
    MarkLigPos,
    MarkMarkPos,
    ContextPos,
    ChainContextPos,
    ExtensionPos,
}

impl PosKind {
    pub fn lookup_type(&self) -> PosLookupType {
        match self {
            PosKind::SinglePos(_) => PosLookupType::SinglePos,
            PosKind::PairPos => PosLookupType::PairPos,
            PosKind::CursivePos => PosLookupType::CursivePos,
            PosKind::MarkBasePos => PosLookupType::MarkBasePos,
            PosKind::MarkLigPos => PosLookupType::MarkLigPos,
            PosKind::MarkMarkPos => PosLookupType::MarkMarkPos,
            PosKind::ContextPos => PosLookupType::ContextPos,
            PosKind::ChainContextPos => PosLookupType::ChainContextPos,
            PosKind::ExtensionPos => PosLookupType::ExtensionPos,
        }
    }
}

impl GlyphSubtable<PosKind> {
    pub fn lookup_type(&self) -> PosLookupType {
        self.kind.lookup_type()
    }

    pub fn entries(&self) -> Result<SubtableEntries, ShapingError> {
        match &self.kind {
            PosKind::SinglePos(SinglePos::Format1 { value_record }) => {
                Ok(SubtableEntries::Values(vec![*value_record]))
            }
            PosKind::SinglePos(SinglePos::Format2 { value_records }) => {
                Ok(SubtableEntries::Values(value_records.clone()))
            }
            kind => Err(ShapingError::NotImplemented(kind.lookup_type().name())),
        }
    }

    pub fn position(
        &self,
        gs: &GlyphSequence,
        adjustments: &mut [Adjustment],
    ) -> Result<bool, ShapingError> {
        self.position_where(gs, adjustments, always)
    }

    /// Accumulate this subtable's adjustments for the positions of `gs` accepted by `tester`.
    ///
    /// `adjustments` holds one entry per glyph. Returns true if any glyph was adjusted.
    pub fn position_where(
        &self,
        gs: &GlyphSequence,
        adjustments: &mut [Adjustment],
        tester: GlyphContextTester,
    ) -> Result<bool, ShapingError> {
        if adjustments.len() != gs.glyph_count() {
            return Err(ShapingError::BadIndex);
        }
        match &self.kind {
            PosKind::SinglePos(single_pos) => {
                let mut adjusted = false;
                for (i, &glyph) in gs.glyphs().iter().enumerate() {
                    if !tester(gs, i) {
                        continue;
                    }
                    let value_record = self
                        .coverage_index(glyph)
                        .and_then(|index| single_pos.value_record(index));
                    if let Some(value_record) = value_record {
                        adjustments[i].add_value_record(value_record);
                        adjusted = true;
                    }
                }
                Ok(adjusted)
            }
            kind => Err(ShapingError::NotImplemented(kind.lookup_type().name())),
        }
    }
}

/// A glyph positioning table: the lookup registry and its positioning subtables.
pub struct GlyphPositioningTable {
    layout: LayoutTable<GPOS>,
}

impl GlyphPositioningTable {
    pub fn new(
        lookups: Vec<(LookupSpec, Vec<String>)>,
        subtables: Vec<GlyphSubtable<PosKind>>,
    ) -> Result<GlyphPositioningTable, TableError> {
        if subtables.is_empty() {
            return Err(TableError::EmptySubtables);
        }
        let mut layout = LayoutTable::new(lookups)?;
        for subtable in subtables {
            layout.add_subtable(subtable);
        }
        Ok(GlyphPositioningTable { layout })
    }

    /// Create a subtable of the given lookup type.
    ///
    /// Single positioning format 1 takes exactly one value record, format 2 one per coverage
    /// index. Entries are ignored for lookup types without an implementation.
    pub fn create_subtable(
        lookup_type: PosLookupType,
        id: &str,
        sequence: u32,
        flags: LookupFlag,
        format: u16,
        coverage: &[CoverageEntry],
        entries: SubtableEntries,
    ) -> Result<GlyphSubtable<PosKind>, TableError> {
        let coverage = Coverage::new(coverage)?;
        let kind = match lookup_type {
            PosLookupType::SinglePos => match (format, entries) {
                (1, SubtableEntries::Values(value_records)) => match value_records.as_slice() {
                    [value_record] => PosKind::SinglePos(SinglePos::Format1 {
                        value_record: *value_record,
                    }),
                    _ => {
                        return Err(TableError::BadEntryCount {
                            expected: 1,
                            actual: value_records.len(),
                        })
                    }
                },
                (2, SubtableEntries::Values(value_records)) => {
                    check_entry_count(&coverage, value_records.len())?;
                    PosKind::SinglePos(SinglePos::Format2 { value_records })
                }
                _ => return Err(TableError::BadEntries),
            },
            PosLookupType::PairPos => PosKind::PairPos,
            PosLookupType::CursivePos => PosKind::CursivePos,
            PosLookupType::MarkBasePos => PosKind::MarkBasePos,
            PosLookupType::MarkLigPos => PosKind::MarkLigPos,
            PosLookupType::MarkMarkPos => PosKind::MarkMarkPos,
            PosLookupType::ContextPos => PosKind::ContextPos,
            PosLookupType::ChainContextPos => PosKind::ChainContextPos,
            PosLookupType::ExtensionPos => PosKind::ExtensionPos,
        };
        Ok(GlyphSubtable::new(
            id.to_string(),
            sequence,
            flags,
            format,
            coverage,
            kind,
        ))
    }

    pub fn add_subtable(&mut self, subtable: GlyphSubtable<PosKind>) {
        self.layout.add_subtable(subtable)
    }

    pub fn layout_table(&self) -> &LayoutTable<GPOS> {
        &self.layout
    }

    /// Compute per-glyph adjustments for `gs` in design units, or `None` if nothing applies.
    pub fn position(
        &self,
        gs: &GlyphSequence,
        script: u32,
        language: u32,
    ) -> Result<Option<Vec<Adjustment>>, ShapingError> {
        let lookups = self.layout.match_lookups(script, language, tag::WILDCARD);
        if lookups.is_empty() {
            debug!(
                "no positioning lookups for script {} language {}",
                DisplayTag(script),
                DisplayTag(language)
            );
            return Ok(None);
        }
        scripts::processor_for(script).position(gs, &lookups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(x_placement: i16, x_advance: i16) -> ValueRecord {
        ValueRecord {
            x_placement,
            x_advance,
            ..ValueRecord::default()
        }
    }

    fn single_pos(format: u16, coverage: &[i32], values: Vec<ValueRecord>) -> GlyphSubtable<PosKind> {
        let coverage = coverage
            .iter()
            .map(|&gid| CoverageEntry::Glyph(gid))
            .collect::<Vec<_>>();
        GlyphPositioningTable::create_subtable(
            PosLookupType::SinglePos,
            "single",
            0,
            LookupFlag::empty(),
            format,
            &coverage,
            SubtableEntries::Values(values),
        )
        .unwrap()
    }

    fn seq(glyphs: &[u16]) -> GlyphSequence {
        GlyphSequence::new(Some(vec!['x'; glyphs.len()]), Some(glyphs.to_vec()), None).unwrap()
    }

    #[test]
    fn test_scale() {
        let adjustment = Adjustment {
            dx: 100,
            dy: -50,
            advance_x: 250,
            advance_y: 0,
        };
        assert_eq!(
            adjustment.scale(12_000),
            Adjustment {
                dx: 1200,
                dy: -600,
                advance_x: 3000,
                advance_y: 0,
            }
        );
    }

    #[test]
    fn test_scale_large_font_size() {
        let adjustment = Adjustment {
            advance_x: i32::from(i16::MAX),
            dx: i32::from(i16::MIN),
            ..Adjustment::default()
        };
        assert_eq!(
            adjustment.scale(72_000),
            Adjustment {
                dx: -2_359_296,
                dy: 0,
                advance_x: 2_359_224,
                advance_y: 0,
            }
        );

        let adjustment = Adjustment {
            dx: i32::MIN,
            advance_x: i32::MAX,
            ..Adjustment::default()
        };
        let scaled = adjustment.scale(i32::MAX);
        assert_eq!(scaled.dx, i32::MIN);
        assert_eq!(scaled.advance_x, i32::MAX);
    }

    #[test]
    fn test_single_pos_format1() {
        let subtable = single_pos(1, &[5, 6], vec![value(10, -20)]);
        let gs = seq(&[5, 7, 6]);
        let mut adjustments = vec![Adjustment::default(); 3];
        assert_eq!(subtable.position(&gs, &mut adjustments), Ok(true));
        assert_eq!(adjustments[0].dx, 10);
        assert_eq!(adjustments[0].advance_x, -20);
        assert!(adjustments[1].is_zero());
        assert_eq!(adjustments[2].dx, 10);
    }

    #[test]
    fn test_single_pos_format2_accumulates() {
        let subtable = single_pos(2, &[5, 6], vec![value(1, 2), value(3, 4)]);
        let gs = seq(&[6, 5]);
        let mut adjustments = vec![Adjustment::default(); 2];
        subtable.position(&gs, &mut adjustments).unwrap();
        subtable.position(&gs, &mut adjustments).unwrap();
        assert_eq!(adjustments[0].dx, 6);
        assert_eq!(adjustments[0].advance_x, 8);
        assert_eq!(adjustments[1].dx, 2);
        assert_eq!(adjustments[1].advance_x, 4);
    }

    #[test]
    fn test_single_pos_uncovered() {
        let subtable = single_pos(1, &[5], vec![value(1, 1)]);
        let mut adjustments = vec![Adjustment::default(); 2];
        assert_eq!(subtable.position(&seq(&[1, 2]), &mut adjustments), Ok(false));
        assert_eq!(
            subtable.position(&seq(&[1, 2, 3]), &mut adjustments),
            Err(ShapingError::BadIndex)
        );
    }

    #[test]
    fn test_single_pos_entries() {
        let result = GlyphPositioningTable::create_subtable(
            PosLookupType::SinglePos,
            "single",
            0,
            LookupFlag::empty(),
            1,
            &[CoverageEntry::Glyph(1)],
            SubtableEntries::Values(Vec::new()),
        );
        assert!(matches!(
            result,
            Err(TableError::BadEntryCount {
                expected: 1,
                actual: 0
            })
        ));
        let result = GlyphPositioningTable::create_subtable(
            PosLookupType::SinglePos,
            "single",
            0,
            LookupFlag::empty(),
            3,
            &[CoverageEntry::Glyph(1)],
            SubtableEntries::Values(vec![value(1, 1)]),
        );
        assert!(matches!(result, Err(TableError::BadEntries)));

        let subtable = single_pos(2, &[1, 2], vec![value(1, 1), value(2, 2)]);
        assert_eq!(
            subtable.entries(),
            Ok(SubtableEntries::Values(vec![value(1, 1), value(2, 2)]))
        );
    }

    #[test]
    fn test_unsupported_lookup_types() {
        for lookup_type in 2..=9 {
            let lookup_type = PosLookupType::from_u16(lookup_type).unwrap();
            let subtable = GlyphPositioningTable::create_subtable(
                lookup_type,
                "unsupported",
                0,
                LookupFlag::empty(),
                1,
                &[],
                SubtableEntries::None,
            )
            .unwrap();
            let mut adjustments = vec![Adjustment::default(); 1];
            assert_eq!(
                subtable.position(&seq(&[1]), &mut adjustments),
                Err(ShapingError::NotImplemented(lookup_type.name()))
            );
            assert_eq!(
                subtable.entries(),
                Err(ShapingError::NotImplemented(lookup_type.name()))
            );
        }
    }

    #[test]
    fn test_table_position() {
        let spec = LookupSpec::new("arab", "dflt", "kern").unwrap();
        let table = GlyphPositioningTable::new(
            vec![(spec, vec!["single".to_string()])],
            vec![single_pos(1, &[5], vec![value(0, -100)])],
        )
        .unwrap();
        let adjustments = table
            .position(&seq(&[5, 6]), tag::ARAB, tag::DFLT_LANG)
            .unwrap()
            .unwrap();
        assert_eq!(adjustments[0].advance_x, -100);
        assert!(adjustments[1].is_zero());

        // no lookups for the script
        assert_eq!(
            table.position(&seq(&[5]), tag::LATN, tag::DFLT_LANG),
            Ok(None)
        );
        // lookups exist but nothing is covered
        assert_eq!(
            table.position(&seq(&[6]), tag::ARAB, tag::DFLT_LANG),
            Ok(None)
        );
    }
}

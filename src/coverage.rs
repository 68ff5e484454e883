//! Coverage tables: map a glyph id to its dense coverage index.

use itertools::Itertools;

use crate::error::TableError;

/// One element of a coverage specification, as supplied by a table loader.
///
/// Values are signed so out-of-range input from the loader can be reported rather than truncated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoverageEntry {
    Glyph(i32),
    Range { start: i32, end: i32, index: i32 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Coverage {
    Empty,
    /// Sorted glyph ids. The coverage index is the position in the array.
    Mapped { glyph_array: Vec<u16> },
    /// Sorted, non-overlapping ranges of glyph ids.
    Ranged {
        coverage_range_array: Vec<CoverageRangeRecord>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoverageRangeRecord {
    pub start_glyph: u16,
    pub end_glyph: u16,
    pub start_coverage_index: u16,
}

impl Coverage {
    /// Build a coverage table, choosing the representation from the kind of entries given.
    ///
    /// Entries must be all glyphs or all ranges, in strictly increasing glyph order.
    pub fn new(entries: &[CoverageEntry]) -> Result<Coverage, TableError> {
        match entries.first() {
            None => Ok(Coverage::Empty),
            Some(CoverageEntry::Glyph(_)) => {
                let glyph_array = entries
                    .iter()
                    .map(|entry| match *entry {
                        CoverageEntry::Glyph(gid) => {
                            u16::try_from(gid).map_err(|_| TableError::BadGlyph(i64::from(gid)))
                        }
                        CoverageEntry::Range { .. } => Err(TableError::MixedCoverage),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                if glyph_array.iter().tuple_windows().any(|(a, b)| a >= b) {
                    return Err(TableError::UnsortedCoverage);
                }
                Ok(Coverage::Mapped { glyph_array })
            }
            Some(CoverageEntry::Range { .. }) => {
                let coverage_range_array = entries
                    .iter()
                    .map(|entry| match *entry {
                        CoverageEntry::Range { start, end, index } => {
                            CoverageRangeRecord::new(start, end, index)
                        }
                        CoverageEntry::Glyph(_) => Err(TableError::MixedCoverage),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                if coverage_range_array
                    .iter()
                    .tuple_windows()
                    .any(|(a, b)| b.start_glyph <= a.end_glyph)
                {
                    return Err(TableError::UnsortedCoverage);
                }
                Ok(Coverage::Ranged {
                    coverage_range_array,
                })
            }
        }
    }

    pub fn glyph_coverage_value(&self, glyph: u16) -> Option<u16> {
        match self {
            Coverage::Empty => None,
            Coverage::Mapped { glyph_array } => glyph_array
                .binary_search(&glyph)
                .ok()
                .map(|index| index as u16),
            Coverage::Ranged {
                coverage_range_array,
            } => {
                let i = coverage_range_array.partition_point(|range| range.start_glyph <= glyph);
                let range = coverage_range_array.get(i.checked_sub(1)?)?;
                if glyph <= range.end_glyph {
                    Some(range.start_coverage_index + (glyph - range.start_glyph))
                } else {
                    None
                }
            }
        }
    }

    /// Convenience method to count the total number of glyphs covered
    pub fn glyph_count(&self) -> usize {
        match self {
            Coverage::Empty => 0,
            Coverage::Mapped { glyph_array } => glyph_array.len(),
            Coverage::Ranged {
                coverage_range_array,
            } => coverage_range_array
                .iter()
                .fold(0, |acc, range| acc + range.len()),
        }
    }

    /// Length of the coverage index space, the number of entries a subtable must supply.
    pub fn size(&self) -> usize {
        match self {
            Coverage::Empty | Coverage::Mapped { .. } => self.glyph_count(),
            Coverage::Ranged {
                coverage_range_array,
            } => coverage_range_array
                .iter()
                .map(|range| usize::from(range.start_coverage_index) + range.len())
                .max()
                .unwrap_or(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.glyph_count() == 0
    }
}

impl CoverageRangeRecord {
    fn new(start: i32, end: i32, index: i32) -> Result<CoverageRangeRecord, TableError> {
        let start_glyph = u16::try_from(start).map_err(|_| TableError::BadCoverageRange)?;
        let end_glyph = u16::try_from(end).map_err(|_| TableError::BadCoverageRange)?;
        let start_coverage_index =
            u16::try_from(index).map_err(|_| TableError::BadCoverageRange)?;
        if start_glyph > end_glyph
            || u32::from(start_coverage_index) + u32::from(end_glyph - start_glyph)
                > u32::from(u16::MAX)
        {
            return Err(TableError::BadCoverageRange);
        }
        Ok(CoverageRangeRecord {
            start_glyph,
            end_glyph,
            start_coverage_index,
        })
    }

    fn len(&self) -> usize {
        usize::from(self.end_glyph - self.start_glyph) + 1
    }
}

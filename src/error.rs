//! Error types

use std::fmt;

/// Error returned when building coverage tables, subtables, lookup tables and glyph sequences.
///
/// These indicate malformed table data and are not recoverable at shaping time.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum TableError {
    BadGlyph(i64),
    BadTag(String),
    BadCoverageRange,
    UnsortedCoverage,
    MixedCoverage,
    BadEntryCount { expected: usize, actual: usize },
    BadEntries,
    EmptyLigature,
    EmptyLigatureSet,
    EmptyLookups,
    EmptySubtables,
    BadAssociation,
    BadCharRange,
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::BadGlyph(gid) => write!(f, "glyph index {} out of range", gid),
            TableError::BadTag(s) => write!(f, "invalid tag '{}'", s),
            TableError::BadCoverageRange => write!(f, "invalid coverage range"),
            TableError::UnsortedCoverage => {
                write!(f, "coverage glyphs must be strictly increasing")
            }
            TableError::MixedCoverage => write!(f, "coverage entries must all be of one kind"),
            TableError::BadEntryCount { expected, actual } => write!(
                f,
                "subtable entry count {} does not match coverage size {}",
                actual, expected
            ),
            TableError::BadEntries => write!(f, "entries do not suit the lookup type"),
            TableError::EmptyLigature => write!(f, "ligature must have at least one component"),
            TableError::EmptyLigatureSet => write!(f, "ligature set must be non-empty"),
            TableError::EmptyLookups => write!(f, "lookups must be non-empty"),
            TableError::EmptySubtables => write!(f, "subtables must be non-empty"),
            TableError::BadAssociation => {
                write!(f, "character association out of range")
            }
            TableError::BadCharRange => write!(f, "invalid character range"),
        }
    }
}

impl std::error::Error for TableError {}

/// Error returned from font shaping functions
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum ShapingError {
    Table(TableError),
    /// The lookup type named is recognised but its behaviour is not implemented.
    NotImplemented(&'static str),
    BadIndex,
    /// An unpaired UTF-16 surrogate was found at the given code unit offset.
    UnpairedSurrogate(usize),
}

impl From<TableError> for ShapingError {
    fn from(error: TableError) -> Self {
        ShapingError::Table(error)
    }
}

impl fmt::Display for ShapingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapingError::Table(err) => write!(f, "table: {}", err),
            ShapingError::NotImplemented(lookup_type) => {
                write!(f, "{} lookups are not supported", lookup_type)
            }
            ShapingError::BadIndex => write!(f, "glyph index out of range"),
            ShapingError::UnpairedSurrogate(offset) => {
                write!(f, "unpaired surrogate at offset {}", offset)
            }
        }
    }
}

impl std::error::Error for ShapingError {}

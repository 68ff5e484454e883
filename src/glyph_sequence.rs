//! Glyph sequences and their association with the characters they were mapped from.
//!
//! A `GlyphSequence` threads through every shaping operation. It holds the original characters,
//! the current glyphs and, for each glyph, the `CharAssociation` recording which characters that
//! glyph stands for. Substitutions that merge glyphs join their associations; substitutions that
//! split a glyph replicate them.
//!
//! Associations may also carry *predications*: keyed values that script processors record about
//! a glyph. They travel with the association, so they survive ligation and reordering. When
//! associations are joined, values under the same key are combined by the merger registered for
//! that key, or replaced by the later value if none is registered.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use itertools::Itertools;
use lazy_static::lazy_static;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tinyvec::TinyVec;

use crate::error::{ShapingError, TableError};

/// Largest glyph index. Also used as the sentinel for glyphs that could not be mapped.
pub const MAX_GLYPH: u16 = 0xFFFF;

const DEFAULT_CHARS_CAPACITY: usize = 8;

/// A half-open `[start, end)` range of character indices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval {
    pub start: usize,
    pub end: usize,
}

impl Interval {
    pub fn new(start: usize, end: usize) -> Interval {
        Interval { start, end }
    }
}

/// A value recorded against a glyph's association.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Predication {
    Flag(bool),
    Number(i64),
    Text(String),
}

/// Combines the value recorded under a key with a value being merged into it:
/// `merger(key, existing, incoming)`.
pub type PredicationMerger = fn(&str, &Predication, &Predication) -> Predication;

lazy_static! {
    static ref PREDICATION_MERGERS: RwLock<FxHashMap<String, PredicationMerger>> =
        RwLock::new(FxHashMap::default());
}

/// The characters a glyph was produced from.
///
/// Usually a single contiguous interval. After glyphs from non-adjacent characters are merged the
/// association is *disjoint*: the span covers all of them and `sub_intervals` lists the sorted,
/// non-overlapping pieces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharAssociation {
    start: usize,
    end: usize,
    sub_intervals: TinyVec<[Interval; 2]>,
    predications: Option<FxHashMap<String, Predication>>,
}

impl CharAssociation {
    pub fn new(offset: usize, count: usize) -> CharAssociation {
        CharAssociation {
            start: offset,
            end: offset + count,
            sub_intervals: TinyVec::new(),
            predications: None,
        }
    }

    /// Build an association from a list of intervals.
    ///
    /// Intervals must be sorted and must not overlap. Zero intervals produce the empty
    /// association at offset 0, a single interval a contiguous one.
    pub fn from_intervals(intervals: &[Interval]) -> Result<CharAssociation, TableError> {
        if intervals.iter().any(|i| i.start > i.end)
            || intervals.iter().tuple_windows().any(|(a, b)| b.start < a.end)
        {
            return Err(TableError::BadAssociation);
        }
        Ok(CharAssociation::from_sorted_intervals(intervals))
    }

    // `intervals` must be sorted and non-overlapping.
    fn from_sorted_intervals(intervals: &[Interval]) -> CharAssociation {
        match intervals {
            [] => CharAssociation::new(0, 0),
            [interval] => CharAssociation::new(interval.start, interval.end - interval.start),
            [first, .., last] => CharAssociation {
                start: first.start,
                end: last.end,
                sub_intervals: intervals.iter().copied().collect(),
                predications: None,
            },
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn count(&self) -> usize {
        self.end - self.start
    }

    pub fn is_disjoint(&self) -> bool {
        !self.sub_intervals.is_empty()
    }

    pub fn sub_intervals(&self) -> &[Interval] {
        &self.sub_intervals
    }

    /// The intervals making up this association: the sub-intervals if disjoint, otherwise the
    /// span.
    pub fn intervals(&self) -> impl Iterator<Item = Interval> + '_ {
        let span = if self.is_disjoint() {
            None
        } else {
            Some(Interval::new(self.start, self.end))
        };
        span.into_iter().chain(self.sub_intervals.iter().copied())
    }

    /// Returns true if this association, or any one of its sub-intervals when disjoint, lies
    /// within `[offset, offset + count)`.
    pub fn contained(&self, offset: usize, count: usize) -> bool {
        let s = offset;
        let e = offset + count;
        self.intervals()
            .any(|interval| interval.start >= s && interval.end <= e)
    }

    /// `repeat` copies of this association, predications included.
    pub fn replicate(&self, repeat: usize) -> Vec<CharAssociation> {
        vec![self.clone(); repeat]
    }

    /// Merge several associations into one covering the union of their intervals.
    ///
    /// Overlapping and abutting intervals coalesce, so the intervals of the result are
    /// independent of the order of `associations`. Predications are merged in order.
    pub fn join(associations: &[CharAssociation]) -> CharAssociation {
        let mut intervals = associations
            .iter()
            .flat_map(|a| a.intervals())
            .collect::<Vec<_>>();
        intervals.sort_unstable();
        let mut joined = CharAssociation::from_sorted_intervals(&merge_intervals(&intervals));
        for association in associations {
            joined.merge_predications(association);
        }
        joined
    }

    pub fn set_predication(&mut self, key: &str, value: Predication) {
        self.predications
            .get_or_insert_with(FxHashMap::default)
            .insert(key.to_string(), value);
    }

    pub fn predication(&self, key: &str) -> Option<&Predication> {
        self.predications
            .as_ref()
            .and_then(|predications| predications.get(key))
    }

    pub fn has_predications(&self) -> bool {
        self.predications
            .as_ref()
            .map_or(false, |predications| !predications.is_empty())
    }

    /// Merge `value` into the predication under `key`.
    pub fn merge_predication(&mut self, key: &str, value: &Predication) {
        let predications = self.predications.get_or_insert_with(FxHashMap::default);
        let merged = match predications.get(key) {
            Some(existing) => CharAssociation::merge_predication_values(key, existing, value),
            None => value.clone(),
        };
        predications.insert(key.to_string(), merged);
    }

    /// Merge every predication of `other` into this association.
    pub fn merge_predications(&mut self, other: &CharAssociation) {
        if let Some(predications) = &other.predications {
            for (key, value) in predications {
                self.merge_predication(key, value);
            }
        }
    }

    /// Combine two values under `key` with its registered merger. Without one the incoming
    /// value wins.
    pub fn merge_predication_values(
        key: &str,
        existing: &Predication,
        incoming: &Predication,
    ) -> Predication {
        match CharAssociation::predication_merger(key) {
            Some(merger) => merger(key, existing, incoming),
            None => incoming.clone(),
        }
    }

    /// Register the merger for `key`, process wide, replacing any earlier one.
    pub fn set_predication_merger(key: &str, merger: PredicationMerger) {
        PREDICATION_MERGERS.write().insert(key.to_string(), merger);
    }

    pub fn predication_merger(key: &str) -> Option<PredicationMerger> {
        PREDICATION_MERGERS.read().get(key).copied()
    }
}

// `intervals` must be sorted by start then end.
fn merge_intervals(intervals: &[Interval]) -> Vec<Interval> {
    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
    for &interval in intervals {
        match merged.last_mut() {
            Some(last) if interval.start <= last.end => {
                if interval.end > last.end {
                    last.end = interval.end;
                }
            }
            _ => merged.push(interval),
        }
    }
    merged
}

impl fmt::Display for CharAssociation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_disjoint() {
            write!(
                f,
                "{{{}}}",
                self.sub_intervals
                    .iter()
                    .format_with(",", |i, f| f(&format_args!("[{},{})", i.start, i.end)))
            )
        } else {
            write!(f, "[{},{})", self.start, self.end)
        }
    }
}

/// A sequence of glyphs together with the characters they were mapped from.
///
/// Invariant: there is exactly one association per glyph and every association lies within
/// `[0, characters.len()]`.
#[derive(Debug, PartialEq, Eq)]
pub struct GlyphSequence {
    characters: Arc<[char]>,
    glyphs: Vec<u16>,
    associations: Vec<CharAssociation>,
    predications: bool,
}

impl GlyphSequence {
    /// Create a glyph sequence, synthesising any omitted part.
    ///
    /// Missing characters default to an empty buffer, missing glyphs to one zero glyph per
    /// character and missing associations to the identity mapping (see
    /// `identity_associations`).
    pub fn new(
        characters: Option<Vec<char>>,
        glyphs: Option<Vec<u16>>,
        associations: Option<Vec<CharAssociation>>,
    ) -> Result<GlyphSequence, TableError> {
        let characters =
            characters.unwrap_or_else(|| Vec::with_capacity(DEFAULT_CHARS_CAPACITY));
        let glyphs = glyphs.unwrap_or_else(|| vec![0; characters.len()]);
        let associations = match associations {
            Some(associations) => {
                if associations.len() != glyphs.len()
                    || associations.iter().any(|a| a.end() > characters.len())
                {
                    return Err(TableError::BadAssociation);
                }
                associations
            }
            None => identity_associations(characters.len(), glyphs.len()),
        };
        Ok(GlyphSequence {
            characters: Arc::from(characters),
            glyphs,
            associations,
            predications: false,
        })
    }

    // Callers guarantee the association invariant.
    pub(crate) fn from_parts(
        characters: Arc<[char]>,
        glyphs: Vec<u16>,
        associations: Vec<CharAssociation>,
        predications: bool,
    ) -> GlyphSequence {
        debug_assert_eq!(glyphs.len(), associations.len());
        GlyphSequence {
            characters,
            glyphs,
            associations,
            predications,
        }
    }

    /// A new sequence over the same characters with different glyphs and associations.
    pub(crate) fn with_glyphs(
        &self,
        glyphs: Vec<u16>,
        associations: Vec<CharAssociation>,
    ) -> GlyphSequence {
        GlyphSequence::from_parts(
            Arc::clone(&self.characters),
            glyphs,
            associations,
            self.predications,
        )
    }

    /// Enable or disable recording of predications through `set_predication`.
    pub fn set_predications(&mut self, enable: bool) {
        self.predications = enable;
    }

    pub fn predications(&self) -> bool {
        self.predications
    }

    /// Record `value` under `key` on the association of the glyph at `index`. Ignored while
    /// predications are disabled.
    pub fn set_predication(
        &mut self,
        index: usize,
        key: &str,
        value: Predication,
    ) -> Result<(), ShapingError> {
        let association = self
            .associations
            .get_mut(index)
            .ok_or(ShapingError::BadIndex)?;
        if self.predications {
            association.set_predication(key, value);
        }
        Ok(())
    }

    /// The predication under `key` for the glyph at `index`, if predications are enabled.
    pub fn predication(&self, index: usize, key: &str) -> Option<&Predication> {
        if !self.predications {
            return None;
        }
        self.associations
            .get(index)
            .and_then(|association| association.predication(key))
    }

    pub fn characters(&self) -> &[char] {
        &self.characters
    }

    pub fn character_count(&self) -> usize {
        self.characters.len()
    }

    pub fn glyphs(&self) -> &[u16] {
        &self.glyphs
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    pub fn glyph(&self, index: usize) -> Option<u16> {
        self.glyphs.get(index).copied()
    }

    /// Store `glyph` at `index`. Values above the glyph range are clamped to `MAX_GLYPH`.
    pub fn set_glyph(&mut self, index: usize, glyph: u32) -> Result<(), ShapingError> {
        let slot = self.glyphs.get_mut(index).ok_or(ShapingError::BadIndex)?;
        *slot = u16::try_from(glyph).unwrap_or(MAX_GLYPH);
        Ok(())
    }

    pub fn associations(&self) -> &[CharAssociation] {
        &self.associations
    }

    pub fn association(&self, index: usize) -> Option<&CharAssociation> {
        self.associations.get(index)
    }

    /// Glyphs from `offset`, clamped to the sequence; `None` for `count` means to the end.
    pub fn glyphs_range(&self, offset: usize, count: Option<usize>) -> &[u16] {
        let (start, end) = clamp_range(self.glyphs.len(), offset, count);
        &self.glyphs[start..end]
    }

    /// Associations from `offset`, clamped to the sequence; `None` for `count` means to the end.
    pub fn associations_range(&self, offset: usize, count: Option<usize>) -> &[CharAssociation] {
        let (start, end) = clamp_range(self.associations.len(), offset, count);
        &self.associations[start..end]
    }

    /// Lexicographic comparison of glyphs. A proper prefix orders before its extension.
    pub fn compare_glyphs(&self, glyphs: &[u16]) -> Ordering {
        self.glyphs.as_slice().cmp(glyphs)
    }

    /// The glyphs in `[start, end)` with their associations, over the same characters.
    pub fn subsequence(&self, start: usize, end: usize) -> GlyphSequence {
        let start = start.min(self.glyphs.len());
        let end = end.clamp(start, self.glyphs.len());
        self.with_glyphs(
            self.glyphs[start..end].to_vec(),
            self.associations[start..end].to_vec(),
        )
    }

    /// Concatenate the glyphs and associations of `parts` over the characters of `base`.
    pub fn join(base: &GlyphSequence, parts: &[GlyphSequence]) -> GlyphSequence {
        let total = parts.iter().map(|part| part.glyph_count()).sum();
        let mut glyphs = Vec::with_capacity(total);
        let mut associations = Vec::with_capacity(total);
        for part in parts {
            glyphs.extend_from_slice(&part.glyphs);
            associations.extend_from_slice(&part.associations);
        }
        base.with_glyphs(glyphs, associations)
    }

    /// Move `count` glyphs starting at `source` so that they start at `target` in the result.
    ///
    /// When moving forward, `target` is the index (in the original sequence) of the glyph the
    /// block is placed before.
    pub fn reorder(
        &self,
        source: usize,
        count: usize,
        target: usize,
    ) -> Result<GlyphSequence, ShapingError> {
        let n = self.glyphs.len();
        if source + count > n || target > n {
            return Err(ShapingError::BadIndex);
        }
        let order: Vec<usize> = if source == target {
            return Ok(self.clone());
        } else if source < target {
            if target < source + count {
                return Err(ShapingError::BadIndex);
            }
            (0..source)
                .chain(source + count..target)
                .chain(source..source + count)
                .chain(target..n)
                .collect()
        } else {
            (0..target)
                .chain(source..source + count)
                .chain(target..source)
                .chain(source + count..n)
                .collect()
        };
        let glyphs = order.iter().map(|&i| self.glyphs[i]).collect();
        let associations = order.iter().map(|&i| self.associations[i].clone()).collect();
        Ok(self.with_glyphs(glyphs, associations))
    }
}

impl Clone for GlyphSequence {
    fn clone(&self) -> Self {
        GlyphSequence {
            characters: Arc::from(&*self.characters),
            glyphs: self.glyphs.clone(),
            associations: self.associations.clone(),
            predications: self.predications,
        }
    }
}

impl fmt::Display for GlyphSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{chars = [{}], glyphs = [{}], associations = [{}]}}",
            self.characters
                .iter()
                .format_with(",", |ch, f| f(&format_args!("U+{:04X}", u32::from(*ch)))),
            self.glyphs.iter().format(","),
            self.associations.iter().format(",")
        )
    }
}

pub fn same_glyphs(glyphs1: &[u16], glyphs2: &[u16]) -> bool {
    glyphs1 == glyphs2
}

/// One association per glyph: glyph `i` maps to character `i`, the last glyph absorbs any
/// remaining characters, and glyphs past the end of the characters map to the empty interval
/// at the end.
pub fn identity_associations(num_chars: usize, num_glyphs: usize) -> Vec<CharAssociation> {
    (0..num_glyphs)
        .map(|i| {
            if i >= num_chars {
                CharAssociation::new(num_chars, 0)
            } else if i + 1 == num_glyphs {
                CharAssociation::new(i, num_chars - i)
            } else {
                CharAssociation::new(i, 1)
            }
        })
        .collect()
}

fn clamp_range(len: usize, offset: usize, count: Option<usize>) -> (usize, usize) {
    let start = offset.min(len);
    let end = match count {
        Some(count) => start.saturating_add(count).min(len),
        None => len,
    };
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(glyphs: &[u16]) -> GlyphSequence {
        let chars = (0..glyphs.len()).map(|i| (b'a' + i as u8) as char).collect();
        GlyphSequence::new(Some(chars), Some(glyphs.to_vec()), None).unwrap()
    }

    #[test]
    fn test_defaults() {
        let gs = GlyphSequence::new(None, None, None).unwrap();
        assert_eq!(gs.character_count(), 0);
        assert_eq!(gs.glyph_count(), 0);
        assert!(gs.associations().is_empty());

        let gs = GlyphSequence::new(Some(vec!['a', 'b', 'c']), None, None).unwrap();
        assert_eq!(gs.glyphs(), &[0, 0, 0]);
        assert_eq!(gs.association(2), Some(&CharAssociation::new(2, 1)));
    }

    #[test]
    fn test_identity_associations_trailing() {
        let associations = identity_associations(5, 3);
        assert_eq!(
            associations,
            vec![
                CharAssociation::new(0, 1),
                CharAssociation::new(1, 1),
                CharAssociation::new(2, 3),
            ]
        );

        let associations = identity_associations(1, 3);
        assert_eq!(associations[1], CharAssociation::new(1, 0));
        assert_eq!(associations[2], CharAssociation::new(1, 0));
    }

    #[test]
    fn test_association_out_of_bounds() {
        let result = GlyphSequence::new(
            Some(vec!['a']),
            Some(vec![1]),
            Some(vec![CharAssociation::new(0, 2)]),
        );
        assert_eq!(result, Err(TableError::BadAssociation));

        let result = GlyphSequence::new(Some(vec!['a']), Some(vec![1, 2]), Some(vec![]));
        assert_eq!(result, Err(TableError::BadAssociation));
    }

    #[test]
    fn test_set_glyph_clamps() {
        let mut gs = seq(&[1, 2]);
        gs.set_glyph(0, 70_000).unwrap();
        gs.set_glyph(1, 42).unwrap();
        assert_eq!(gs.glyphs(), &[MAX_GLYPH, 42]);
        assert_eq!(gs.set_glyph(2, 1), Err(ShapingError::BadIndex));
        assert_eq!(gs.glyph(2), None);
    }

    #[test]
    fn test_compare_glyphs() {
        let gs = seq(&[1, 2, 3]);
        assert_eq!(gs.compare_glyphs(&[1, 2, 3]), Ordering::Equal);
        assert_eq!(gs.compare_glyphs(&[1, 2, 3, 4]), Ordering::Less);
        assert_eq!(gs.compare_glyphs(&[1, 2]), Ordering::Greater);
        assert_eq!(gs.compare_glyphs(&[1, 3]), Ordering::Less);
        assert_eq!(gs.compare_glyphs(&[0, 9, 9]), Ordering::Greater);
    }

    #[test]
    fn test_clone_is_deep() {
        let gs = seq(&[1, 2]);
        let mut copy = gs.clone();
        copy.set_glyph(0, 7).unwrap();
        assert_eq!(gs.glyphs(), &[1, 2]);
        assert_eq!(copy.glyphs(), &[7, 2]);
        assert_eq!(gs.characters(), copy.characters());
        assert!(!Arc::ptr_eq(&gs.characters, &copy.characters));
    }

    #[test]
    fn test_ranges_clamp() {
        let gs = seq(&[1, 2, 3, 4]);
        assert_eq!(gs.glyphs_range(1, Some(2)), &[2, 3]);
        assert_eq!(gs.glyphs_range(2, None), &[3, 4]);
        assert_eq!(gs.glyphs_range(3, Some(10)), &[4]);
        assert!(gs.glyphs_range(9, None).is_empty());
        assert_eq!(gs.associations_range(1, Some(1)), &[CharAssociation::new(1, 1)]);
    }

    #[test]
    fn test_subsequence_and_join() {
        let gs = seq(&[1, 2, 3, 4]);
        let a = gs.subsequence(0, 1);
        let b = gs.subsequence(1, 4);
        assert_eq!(b.glyphs(), &[2, 3, 4]);
        assert_eq!(b.characters(), gs.characters());
        let joined = GlyphSequence::join(&gs, &[a, b]);
        assert_eq!(joined, gs);
    }

    #[test]
    fn test_reorder_forward() {
        let gs = seq(&[10, 11, 12, 13, 14]);
        let reordered = gs.reorder(0, 2, 4).unwrap();
        assert_eq!(reordered.glyphs(), &[12, 13, 10, 11, 14]);
        assert_eq!(reordered.association(2), Some(&CharAssociation::new(0, 1)));
    }

    #[test]
    fn test_reorder_backward() {
        let gs = seq(&[10, 11, 12, 13, 14]);
        let reordered = gs.reorder(3, 1, 0).unwrap();
        assert_eq!(reordered.glyphs(), &[13, 10, 11, 12, 14]);
        assert_eq!(reordered.association(0), Some(&CharAssociation::new(3, 1)));
    }

    #[test]
    fn test_reorder_invalid() {
        let gs = seq(&[10, 11, 12]);
        assert_eq!(gs.reorder(2, 2, 0), Err(ShapingError::BadIndex));
        assert_eq!(gs.reorder(0, 2, 1), Err(ShapingError::BadIndex));
        assert_eq!(gs.reorder(1, 1, 1).unwrap(), gs);
    }

    #[test]
    fn test_join_empty() {
        assert_eq!(CharAssociation::join(&[]), CharAssociation::new(0, 0));
    }

    #[test]
    fn test_join_contiguous() {
        let joined = CharAssociation::join(&[
            CharAssociation::new(2, 1),
            CharAssociation::new(0, 1),
            CharAssociation::new(1, 1),
        ]);
        assert_eq!(joined, CharAssociation::new(0, 3));
        assert!(!joined.is_disjoint());
    }

    #[test]
    fn test_join_disjoint() {
        let joined = CharAssociation::join(&[
            CharAssociation::new(5, 2),
            CharAssociation::new(0, 2),
            CharAssociation::new(1, 2),
        ]);
        assert!(joined.is_disjoint());
        assert_eq!(joined.start(), 0);
        assert_eq!(joined.end(), 7);
        assert_eq!(
            joined.sub_intervals(),
            &[Interval::new(0, 3), Interval::new(5, 7)]
        );
        assert_eq!(joined.to_string(), "{[0,3),[5,7)}");
    }

    #[test]
    fn test_join_nested_disjoint() {
        let disjoint =
            CharAssociation::from_intervals(&[Interval::new(0, 1), Interval::new(4, 5)]).unwrap();
        let joined = CharAssociation::join(&[disjoint, CharAssociation::new(1, 3)]);
        assert_eq!(joined, CharAssociation::new(0, 5));
    }

    #[test]
    fn test_join_order_independent() {
        let associations = vec![
            CharAssociation::new(8, 1),
            CharAssociation::new(3, 2),
            CharAssociation::from_intervals(&[Interval::new(0, 1), Interval::new(10, 12)]).unwrap(),
            CharAssociation::new(4, 1),
        ];
        let expected = CharAssociation::join(&associations);
        let mut reversed = associations.clone();
        reversed.reverse();
        assert_eq!(CharAssociation::join(&reversed), expected);
        assert_eq!(expected.start(), 0);
        assert_eq!(expected.end(), 12);
    }

    #[test]
    fn test_contained() {
        let contiguous = CharAssociation::new(2, 2);
        assert!(contiguous.contained(0, 4));
        assert!(!contiguous.contained(3, 4));

        let disjoint =
            CharAssociation::from_intervals(&[Interval::new(0, 1), Interval::new(6, 8)]).unwrap();
        assert!(disjoint.contained(5, 3));
        assert!(!disjoint.contained(1, 4));
    }

    #[test]
    fn test_from_intervals_validates() {
        assert_eq!(
            CharAssociation::from_intervals(&[Interval::new(4, 5), Interval::new(0, 1)]),
            Err(TableError::BadAssociation)
        );
        assert_eq!(
            CharAssociation::from_intervals(&[Interval::new(0, 3), Interval::new(2, 5)]),
            Err(TableError::BadAssociation)
        );
        assert_eq!(
            CharAssociation::from_intervals(&[Interval::new(3, 1)]),
            Err(TableError::BadAssociation)
        );
        assert_eq!(
            CharAssociation::from_intervals(&[Interval::new(2, 4)]),
            Ok(CharAssociation::new(2, 2))
        );
        assert_eq!(
            CharAssociation::from_intervals(&[]),
            Ok(CharAssociation::new(0, 0))
        );
        let disjoint =
            CharAssociation::from_intervals(&[Interval::new(1, 2), Interval::new(5, 6)]).unwrap();
        assert_eq!((disjoint.start(), disjoint.end()), (1, 6));
    }

    #[test]
    fn test_replicate() {
        let mut association = CharAssociation::new(3, 2);
        association.set_predication("form", Predication::Text("fina".to_string()));
        let copies = association.replicate(3);
        assert_eq!(copies.len(), 3);
        assert!(copies.iter().all(|a| *a == association));
        assert_eq!(
            copies[2].predication("form"),
            Some(&Predication::Text("fina".to_string()))
        );
    }

    mod predications {
        use super::*;

        fn sum(_key: &str, existing: &Predication, incoming: &Predication) -> Predication {
            match (existing, incoming) {
                (Predication::Number(a), Predication::Number(b)) => Predication::Number(a + b),
                (_, incoming) => incoming.clone(),
            }
        }

        fn with(offset: usize, key: &str, value: Predication) -> CharAssociation {
            let mut association = CharAssociation::new(offset, 1);
            association.set_predication(key, value);
            association
        }

        #[test]
        fn test_join_without_merger() {
            let joined = CharAssociation::join(&[
                with(0, "join-test-last", Predication::Number(1)),
                with(1, "join-test-last", Predication::Number(2)),
                with(2, "join-test-other", Predication::Flag(true)),
            ]);
            assert_eq!(joined, {
                let mut expected = CharAssociation::new(0, 3);
                expected.set_predication("join-test-last", Predication::Number(2));
                expected.set_predication("join-test-other", Predication::Flag(true));
                expected
            });
        }

        #[test]
        fn test_join_with_merger() {
            CharAssociation::set_predication_merger("join-test-sum", sum);
            assert!(CharAssociation::predication_merger("join-test-sum").is_some());
            let joined = CharAssociation::join(&[
                with(0, "join-test-sum", Predication::Number(1)),
                CharAssociation::new(1, 1),
                with(4, "join-test-sum", Predication::Number(5)),
            ]);
            assert!(joined.is_disjoint());
            assert_eq!(
                joined.predication("join-test-sum"),
                Some(&Predication::Number(6))
            );
        }

        #[test]
        fn test_plain_join_has_none() {
            let joined =
                CharAssociation::join(&[CharAssociation::new(0, 1), CharAssociation::new(1, 1)]);
            assert!(!joined.has_predications());
            assert_eq!(joined.predication("anything"), None);
        }

        #[test]
        fn test_sequence_switch() {
            let mut gs = seq(&[1, 2]);
            assert!(!gs.predications());
            gs.set_predication(0, "key", Predication::Flag(true)).unwrap();
            assert_eq!(gs.predication(0, "key"), None);
            assert!(!gs.association(0).unwrap().has_predications());

            gs.set_predications(true);
            gs.set_predication(1, "key", Predication::Flag(true)).unwrap();
            assert_eq!(gs.predication(1, "key"), Some(&Predication::Flag(true)));
            assert_eq!(
                gs.set_predication(2, "key", Predication::Flag(true)),
                Err(ShapingError::BadIndex)
            );

            // carried through derived sequences
            let sub = gs.subsequence(1, 2);
            assert!(sub.predications());
            assert_eq!(sub.predication(0, "key"), Some(&Predication::Flag(true)));
            assert!(gs.clone().predications());
        }
    }
}

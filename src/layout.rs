//! Lookup registry shared by glyph substitution and glyph positioning tables.
//!
//! A layout table maps `(script, language, feature)` lookup specs to ordered lists of subtable
//! ids, and ids to subtables. Subtables are added after the table is constructed, so a lookup
//! may name subtables that never arrive; those are skipped when lookups are resolved.

use std::fmt;

use itertools::Itertools;
use log::warn;
use rustc_hash::FxHashMap;

use crate::context::LookupFlag;
use crate::coverage::Coverage;
use crate::error::TableError;
use crate::gpos::ValueRecord;
use crate::gsub::LigatureSet;
use crate::tag::{self, DisplayTag};

pub enum GSUB {}
pub enum GPOS {}

pub trait LayoutTableType {
    /// The closed set of subtable variants of this kind of table.
    type Kind;
}

/// A `(script, language, feature)` triple of tags identifying a lookup.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LookupSpec {
    pub script: u32,
    pub language: u32,
    pub feature: u32,
}

impl LookupSpec {
    pub fn new(script: &str, language: &str, feature: &str) -> Result<LookupSpec, TableError> {
        Ok(LookupSpec {
            script: tag::from_string(script)?,
            language: tag::from_string(language)?,
            feature: tag::from_string(feature)?,
        })
    }

    pub fn from_tags(script: u32, language: u32, feature: u32) -> LookupSpec {
        LookupSpec {
            script,
            language,
            feature,
        }
    }

    /// Match against a query in which any component may be `tag::WILDCARD`.
    pub fn matches(&self, script: u32, language: u32, feature: u32) -> bool {
        fn component_matches(query: u32, value: u32) -> bool {
            query == tag::WILDCARD || query == value
        }

        component_matches(script, self.script)
            && component_matches(language, self.language)
            && component_matches(feature, self.feature)
    }
}

impl fmt::Display for LookupSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ script = {}, language = {}, feature = {} }}",
            DisplayTag(self.script),
            DisplayTag(self.language),
            DisplayTag(self.feature)
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SubstLookupType {
    SingleSubst,
    MultipleSubst,
    AlternateSubst,
    LigatureSubst,
    ContextSubst,
    ChainContextSubst,
    ExtensionSubst,
    ReverseChainSingleSubst,
}

impl SubstLookupType {
    const NAMES: [(SubstLookupType, &'static str); 8] = [
        (SubstLookupType::SingleSubst, "single"),
        (SubstLookupType::MultipleSubst, "multiple"),
        (SubstLookupType::AlternateSubst, "alternate"),
        (SubstLookupType::LigatureSubst, "ligature"),
        (SubstLookupType::ContextSubst, "context"),
        (SubstLookupType::ChainContextSubst, "chainingcontext"),
        (SubstLookupType::ExtensionSubst, "extensionsubstitution"),
        (
            SubstLookupType::ReverseChainSingleSubst,
            "reversechainingcontextsingle",
        ),
    ];

    pub fn from_u16(lookup_type: u16) -> Option<SubstLookupType> {
        let index = usize::from(lookup_type).checked_sub(1)?;
        SubstLookupType::NAMES.get(index).map(|(t, _)| *t)
    }

    pub fn to_u16(self) -> u16 {
        SubstLookupType::NAMES
            .iter()
            .position(|(t, _)| *t == self)
            .map_or(0, |i| i as u16 + 1)
    }

    pub fn from_name(name: &str) -> Option<SubstLookupType> {
        SubstLookupType::NAMES
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(t, _)| *t)
    }

    pub fn name(self) -> &'static str {
        SubstLookupType::NAMES
            .iter()
            .find(|(t, _)| *t == self)
            .map_or("unknown", |(_, n)| n)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PosLookupType {
    SinglePos,
    PairPos,
    CursivePos,
    MarkBasePos,
    MarkLigPos,
    MarkMarkPos,
    ContextPos,
    ChainContextPos,
    ExtensionPos,
}

impl PosLookupType {
    const NAMES: [(PosLookupType, &'static str); 9] = [
        (PosLookupType::SinglePos, "single"),
        (PosLookupType::PairPos, "pair"),
        (PosLookupType::CursivePos, "cursive"),
        (PosLookupType::MarkBasePos, "marktobase"),
        (PosLookupType::MarkLigPos, "marktoligature"),
        (PosLookupType::MarkMarkPos, "marktomark"),
        (PosLookupType::ContextPos, "context"),
        (PosLookupType::ChainContextPos, "chainingcontext"),
        (PosLookupType::ExtensionPos, "extensionpositioning"),
    ];

    pub fn from_u16(lookup_type: u16) -> Option<PosLookupType> {
        let index = usize::from(lookup_type).checked_sub(1)?;
        PosLookupType::NAMES.get(index).map(|(t, _)| *t)
    }

    pub fn to_u16(self) -> u16 {
        PosLookupType::NAMES
            .iter()
            .position(|(t, _)| *t == self)
            .map_or(0, |i| i as u16 + 1)
    }

    pub fn from_name(name: &str) -> Option<PosLookupType> {
        PosLookupType::NAMES
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(t, _)| *t)
    }

    pub fn name(self) -> &'static str {
        PosLookupType::NAMES
            .iter()
            .find(|(t, _)| *t == self)
            .map_or("unknown", |(_, n)| n)
    }
}

/// Entry data supplied when creating a subtable, and returned by `entries`.
#[derive(Clone, Debug, PartialEq)]
pub enum SubtableEntries {
    None,
    /// Output glyphs of a single substitution, one per coverage index.
    Glyphs(Vec<u16>),
    /// Ligature sets of a ligature substitution, one per coverage index.
    LigatureSets(Vec<LigatureSet>),
    /// Value records of a single positioning. One record for format 1, otherwise one per
    /// coverage index.
    Values(Vec<ValueRecord>),
}

impl SubtableEntries {
    pub fn len(&self) -> usize {
        match self {
            SubtableEntries::None => 0,
            SubtableEntries::Glyphs(glyphs) => glyphs.len(),
            SubtableEntries::LigatureSets(ligature_sets) => ligature_sets.len(),
            SubtableEntries::Values(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A subtable of a lookup: identity, ordering, flags and coverage common to all lookup types,
/// plus the variant-specific data in `kind`.
#[derive(Clone, Debug)]
pub struct GlyphSubtable<K> {
    id: String,
    sequence: u32,
    flags: LookupFlag,
    format: u16,
    coverage: Coverage,
    pub(crate) kind: K,
}

impl<K> GlyphSubtable<K> {
    pub(crate) fn new(
        id: String,
        sequence: u32,
        flags: LookupFlag,
        format: u16,
        coverage: Coverage,
        kind: K,
    ) -> GlyphSubtable<K> {
        GlyphSubtable {
            id,
            sequence,
            flags,
            format,
            coverage,
            kind,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub fn flags(&self) -> LookupFlag {
        self.flags
    }

    pub fn format(&self) -> u16 {
        self.format
    }

    pub fn coverage(&self) -> &Coverage {
        &self.coverage
    }

    pub fn kind(&self) -> &K {
        &self.kind
    }

    pub fn coverage_index(&self, glyph: u16) -> Option<usize> {
        self.coverage.glyph_coverage_value(glyph).map(usize::from)
    }
}

// Entry data is aligned with the coverage index space.
pub(crate) fn check_entry_count(coverage: &Coverage, actual: usize) -> Result<(), TableError> {
    let expected = coverage.size();
    if expected != actual {
        return Err(TableError::BadEntryCount { expected, actual });
    }
    Ok(())
}

pub struct LayoutTable<T: LayoutTableType> {
    lookups: Vec<(LookupSpec, Vec<String>)>,
    subtables: FxHashMap<String, GlyphSubtable<T::Kind>>,
}

impl<T: LayoutTableType> LayoutTable<T> {
    /// Create a table from lookup specs and the subtable ids each one applies, in order.
    ///
    /// A spec given more than once has its id lists concatenated.
    pub fn new(lookups: Vec<(LookupSpec, Vec<String>)>) -> Result<LayoutTable<T>, TableError> {
        if lookups.is_empty() {
            return Err(TableError::EmptyLookups);
        }
        let mut merged: Vec<(LookupSpec, Vec<String>)> = Vec::with_capacity(lookups.len());
        for (spec, ids) in lookups {
            if ids.is_empty() {
                return Err(TableError::EmptySubtables);
            }
            match merged.iter_mut().find(|(s, _)| *s == spec) {
                Some((_, existing)) => existing.extend(ids),
                None => merged.push((spec, ids)),
            }
        }
        Ok(LayoutTable {
            lookups: merged,
            subtables: FxHashMap::default(),
        })
    }

    pub fn add_subtable(&mut self, subtable: GlyphSubtable<T::Kind>) {
        if let Some(previous) = self.subtables.insert(subtable.id.clone(), subtable) {
            warn!("subtable '{}' replaced by a later definition", previous.id);
        }
    }

    pub fn lookup_specs(&self) -> impl Iterator<Item = &LookupSpec> {
        self.lookups.iter().map(|(spec, _)| spec)
    }

    pub fn subtable(&self, id: &str) -> Option<&GlyphSubtable<T::Kind>> {
        self.subtables.get(id)
    }

    pub fn num_subtables(&self) -> usize {
        self.subtables.len()
    }

    /// All lookup specs matching the query, in the order they were given to `new`.
    pub fn match_lookup_specs(&self, script: u32, language: u32, feature: u32) -> Vec<LookupSpec> {
        self.lookup_specs()
            .filter(|spec| spec.matches(script, language, feature))
            .copied()
            .collect()
    }

    /// Resolve the subtables of a lookup spec, ordered by sequence number.
    pub fn find_subtables(&self, spec: &LookupSpec) -> Vec<&GlyphSubtable<T::Kind>> {
        let ids = match self.lookups.iter().find(|(s, _)| s == spec) {
            Some((_, ids)) => ids,
            None => return Vec::new(),
        };
        let mut subtables = ids
            .iter()
            .filter_map(|id| self.subtables.get(id))
            .collect::<Vec<_>>();
        subtables.sort_by_key(|subtable| subtable.sequence);
        subtables
    }

    pub fn match_lookups(
        &self,
        script: u32,
        language: u32,
        feature: u32,
    ) -> MatchedLookups<'_, T::Kind> {
        let lookups = self
            .match_lookup_specs(script, language, feature)
            .into_iter()
            .map(|spec| {
                let subtables = self.find_subtables(&spec);
                (spec, subtables)
            })
            .collect();
        MatchedLookups { lookups }
    }
}

/// The subtables of every lookup spec matched by a query.
pub struct MatchedLookups<'a, K> {
    lookups: Vec<(LookupSpec, Vec<&'a GlyphSubtable<K>>)>,
}

impl<'a, K> MatchedLookups<'a, K> {
    pub fn get(&self, spec: &LookupSpec) -> Option<&[&'a GlyphSubtable<K>]> {
        self.lookups
            .iter()
            .find(|(s, _)| s == spec)
            .map(|(_, subtables)| subtables.as_slice())
    }

    /// Subtables of every matched spec for `feature`, each subtable once.
    pub fn feature_subtables(&self, feature: u32) -> Vec<&'a GlyphSubtable<K>> {
        self.lookups
            .iter()
            .filter(|(spec, _)| spec.feature == feature)
            .flat_map(|(_, subtables)| subtables.iter().copied())
            .unique_by(|subtable| subtable.id.clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LookupSpec, &[&'a GlyphSubtable<K>])> {
        self.lookups
            .iter()
            .map(|(spec, subtables)| (spec, subtables.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.lookups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookups.is_empty()
    }
}

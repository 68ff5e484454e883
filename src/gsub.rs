//! Glyph substitution (`gsub`) implementation.
//!
//! > The Glyph Substitution (GSUB) table provides data for substition of glyphs for appropriate
//! > rendering of scripts, such as cursively-connecting forms in Arabic script, or for advanced
//! > typographic effects, such as ligatures.
//!
//! — <https://docs.microsoft.com/en-us/typography/opentype/spec/gsub>
//!
//! Single and ligature substitution are implemented. The remaining lookup types can be
//! constructed, so table data naming them loads, but applying them fails with
//! `ShapingError::NotImplemented`.

use log::debug;

use crate::context::{always, GlyphContextTester, LookupFlag};
use crate::coverage::{Coverage, CoverageEntry};
use crate::error::{ShapingError, TableError};
use crate::glyph_sequence::{CharAssociation, GlyphSequence};
use crate::layout::{
    check_entry_count, GlyphSubtable, LayoutTable, LayoutTableType, LookupSpec,
    SubstLookupType, SubtableEntries, GSUB,
};
use crate::scripts;
use crate::tag::{self, DisplayTag};

impl LayoutTableType for GSUB {
    type Kind = SubstKind;
}

/// A ligature: the glyph that replaces a run of components.
///
/// The first component is the glyph covered by the subtable, so only the components that follow
/// it are stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ligature {
    pub ligature_glyph: u16,
    pub component_glyphs: Vec<u16>,
}

impl Ligature {
    pub fn new(ligature: i32, components: &[i32]) -> Result<Ligature, TableError> {
        let ligature_glyph = glyph_id(i64::from(ligature))?;
        if components.is_empty() {
            return Err(TableError::EmptyLigature);
        }
        let component_glyphs = components
            .iter()
            .map(|&component| glyph_id(i64::from(component)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Ligature {
            ligature_glyph,
            component_glyphs,
        })
    }

    /// Build a ligature from a whitespace separated list of component glyph ids.
    pub fn parse(ligature: i32, components: &str) -> Result<Ligature, TableError> {
        let ligature_glyph = glyph_id(i64::from(ligature))?;
        let component_glyphs = components
            .split_whitespace()
            .map(|component| {
                component
                    .parse::<i64>()
                    .map_err(|_| TableError::BadEntries)
                    .and_then(glyph_id)
            })
            .collect::<Result<Vec<_>, _>>()?;
        if component_glyphs.is_empty() {
            return Err(TableError::EmptyLigature);
        }
        Ok(Ligature {
            ligature_glyph,
            component_glyphs,
        })
    }

    pub fn num_components(&self) -> usize {
        self.component_glyphs.len()
    }

    /// Returns true if `glyphs` begins with this ligature's components.
    pub fn matches(&self, glyphs: &[u16]) -> bool {
        glyphs.starts_with(&self.component_glyphs)
    }
}

/// The ligatures that share a first component.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LigatureSet {
    ligatures: Vec<Ligature>,
}

impl LigatureSet {
    pub fn new(ligatures: Vec<Ligature>) -> Result<LigatureSet, TableError> {
        if ligatures.is_empty() {
            return Err(TableError::EmptyLigatureSet);
        }
        Ok(LigatureSet { ligatures })
    }

    pub fn ligatures(&self) -> &[Ligature] {
        &self.ligatures
    }

    /// The ligature matching the most of `following`. The first one found wins a tie.
    pub fn longest_match(&self, following: &[u16]) -> Option<&Ligature> {
        let mut best: Option<&Ligature> = None;
        for ligature in &self.ligatures {
            if ligature.matches(following)
                && best.map_or(true, |b| ligature.num_components() > b.num_components())
            {
                best = Some(ligature);
            }
        }
        best
    }
}

#[derive(Clone, Debug)]
pub enum SubstKind {
    SingleSubst { substitute_glyphs: Vec<u16> },
    LigatureSubst { ligature_sets: Vec<LigatureSet> },
    MultipleSubst,
    AlternateSubst,
    ContextSubst,
    ChainContextSubst,
    ExtensionSubst,
    ReverseChainSingleSubst,
}

impl SubstKind {
    pub fn lookup_type(&self) -> SubstLookupType {
        match self {
            SubstKind::SingleSubst { .. } => SubstLookupType::SingleSubst,
            SubstKind::LigatureSubst { .. } => SubstLookupType::LigatureSubst,
            SubstKind::MultipleSubst => SubstLookupType::MultipleSubst,
            SubstKind::AlternateSubst => SubstLookupType::AlternateSubst,
            SubstKind::ContextSubst => SubstLookupType::ContextSubst,
            SubstKind::ChainContextSubst => SubstLookupType::ChainContextSubst,
            SubstKind::ExtensionSubst => SubstLookupType::ExtensionSubst,
            SubstKind::ReverseChainSingleSubst => SubstLookupType::ReverseChainSingleSubst,
        }
    }
}

impl GlyphSubtable<SubstKind> {
    pub fn lookup_type(&self) -> SubstLookupType {
        self.kind.lookup_type()
    }

    pub fn entries(&self) -> Result<SubtableEntries, ShapingError> {
        match &self.kind {
            SubstKind::SingleSubst { substitute_glyphs } => {
                Ok(SubtableEntries::Glyphs(substitute_glyphs.clone()))
            }
            SubstKind::LigatureSubst { ligature_sets } => {
                Ok(SubtableEntries::LigatureSets(ligature_sets.clone()))
            }
            kind => Err(ShapingError::NotImplemented(kind.lookup_type().name())),
        }
    }

    pub fn substitute(&self, gs: &GlyphSequence) -> Result<GlyphSequence, ShapingError> {
        self.substitute_where(gs, always)
    }

    /// Apply this subtable to the positions of `gs` accepted by `tester`.
    ///
    /// For a ligature subtable the tester is consulted at the position of the first component.
    pub fn substitute_where(
        &self,
        gs: &GlyphSequence,
        tester: GlyphContextTester,
    ) -> Result<GlyphSequence, ShapingError> {
        match &self.kind {
            SubstKind::SingleSubst { substitute_glyphs } => {
                Ok(self.single_subst(gs, substitute_glyphs, tester))
            }
            SubstKind::LigatureSubst { ligature_sets } => {
                Ok(self.ligature_subst(gs, ligature_sets, tester))
            }
            kind => Err(ShapingError::NotImplemented(kind.lookup_type().name())),
        }
    }

    fn single_subst(
        &self,
        gs: &GlyphSequence,
        substitute_glyphs: &[u16],
        tester: GlyphContextTester,
    ) -> GlyphSequence {
        let glyphs = gs
            .glyphs()
            .iter()
            .enumerate()
            .map(|(i, &glyph)| {
                if !tester(gs, i) {
                    return glyph;
                }
                self.coverage_index(glyph)
                    .and_then(|index| substitute_glyphs.get(index).copied())
                    .unwrap_or(glyph)
            })
            .collect();
        gs.with_glyphs(glyphs, gs.associations().to_vec())
    }

    fn ligature_subst(
        &self,
        gs: &GlyphSequence,
        ligature_sets: &[LigatureSet],
        tester: GlyphContextTester,
    ) -> GlyphSequence {
        let input = gs.glyphs();
        let mut glyphs = Vec::with_capacity(input.len());
        let mut associations = Vec::with_capacity(input.len());
        let mut i = 0;
        while i < input.len() {
            let glyph = input[i];
            let ligature = if tester(gs, i) {
                self.coverage_index(glyph)
                    .and_then(|index| ligature_sets.get(index))
                    .and_then(|ligature_set| ligature_set.longest_match(&input[i + 1..]))
            } else {
                None
            };
            match ligature {
                Some(ligature) => {
                    let consumed = 1 + ligature.num_components();
                    debug!(
                        "ligature {} replaces {:?} at {}",
                        ligature.ligature_glyph,
                        &input[i..i + consumed],
                        i
                    );
                    glyphs.push(ligature.ligature_glyph);
                    associations.push(CharAssociation::join(
                        &gs.associations()[i..i + consumed],
                    ));
                    i += consumed;
                }
                None => {
                    glyphs.push(glyph);
                    associations.push(gs.associations()[i].clone());
                    i += 1;
                }
            }
        }
        gs.with_glyphs(glyphs, associations)
    }
}

/// A glyph substitution table: the lookup registry and its substitution subtables.
pub struct GlyphSubstitutionTable {
    layout: LayoutTable<GSUB>,
}

impl GlyphSubstitutionTable {
    pub fn new(
        lookups: Vec<(LookupSpec, Vec<String>)>,
        subtables: Vec<GlyphSubtable<SubstKind>>,
    ) -> Result<GlyphSubstitutionTable, TableError> {
        if subtables.is_empty() {
            return Err(TableError::EmptySubtables);
        }
        let mut layout = LayoutTable::new(lookups)?;
        for subtable in subtables {
            layout.add_subtable(subtable);
        }
        Ok(GlyphSubstitutionTable { layout })
    }

    /// Create a subtable of the given lookup type, validating its coverage and entries.
    ///
    /// Entries are ignored for lookup types without an implementation.
    pub fn create_subtable(
        lookup_type: SubstLookupType,
        id: &str,
        sequence: u32,
        flags: LookupFlag,
        format: u16,
        coverage: &[CoverageEntry],
        entries: SubtableEntries,
    ) -> Result<GlyphSubtable<SubstKind>, TableError> {
        let coverage = Coverage::new(coverage)?;
        let kind = match lookup_type {
            SubstLookupType::SingleSubst => match entries {
                SubtableEntries::Glyphs(substitute_glyphs) => {
                    check_entry_count(&coverage, substitute_glyphs.len())?;
                    SubstKind::SingleSubst { substitute_glyphs }
                }
                _ => return Err(TableError::BadEntries),
            },
            SubstLookupType::LigatureSubst => match entries {
                SubtableEntries::LigatureSets(ligature_sets) => {
                    check_entry_count(&coverage, ligature_sets.len())?;
                    SubstKind::LigatureSubst { ligature_sets }
                }
                _ => return Err(TableError::BadEntries),
            },
            SubstLookupType::MultipleSubst => SubstKind::MultipleSubst,
            SubstLookupType::AlternateSubst => SubstKind::AlternateSubst,
            SubstLookupType::ContextSubst => SubstKind::ContextSubst,
            SubstLookupType::ChainContextSubst => SubstKind::ChainContextSubst,
            SubstLookupType::ExtensionSubst => SubstKind::ExtensionSubst,
            SubstLookupType::ReverseChainSingleSubst => SubstKind::ReverseChainSingleSubst,
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

    pub fn add_subtable(&mut self, subtable: GlyphSubtable<SubstKind>) {
        self.layout.add_subtable(subtable)
    }

    pub fn layout_table(&self) -> &LayoutTable<GSUB> {
        &self.layout
    }

    /// Apply the lookups of `script` and `language` to `gs`.
    ///
    /// Which subtables apply at which positions is decided by the script processor for
    /// `script`. When the table has no lookups for the script and language the input is
    /// returned unchanged.
    pub fn substitute(
        &self,
        gs: &GlyphSequence,
        script: u32,
        language: u32,
    ) -> Result<GlyphSequence, ShapingError> {
        let lookups = self.layout.match_lookups(script, language, tag::WILDCARD);
        if lookups.is_empty() {
            debug!(
                "no substitution lookups for script {} language {}",
                DisplayTag(script),
                DisplayTag(language)
            );
            return Ok(gs.clone());
        }
        scripts::processor_for(script).substitute(gs, &lookups)
    }
}

fn glyph_id(value: i64) -> Result<u16, TableError> {
    u16::try_from(value).map_err(|_| TableError::BadGlyph(value))
}

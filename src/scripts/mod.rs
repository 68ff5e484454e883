//! Script-specific shaping strategies.
//!
//! A script processor names the features requested, in order, for substitution and for
//! positioning, and supplies a context tester per feature. Processors are created on first use
//! and shared for the lifetime of the process.

pub mod arabic;

use std::sync::Arc;

use lazy_static::lazy_static;
use log::debug;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::context::{always, GlyphContextTester, ScriptContextTester};
use crate::error::ShapingError;
use crate::glyph_sequence::GlyphSequence;
use crate::gpos::{Adjustment, PosKind};
use crate::gsub::SubstKind;
use crate::layout::MatchedLookups;
use crate::tag::{self, DisplayTag};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScriptType {
    Arabic,
    Default,
}

impl From<u32> for ScriptType {
    fn from(script_tag: u32) -> Self {
        match script_tag {
            tag::ARAB => ScriptType::Arabic,
            tag::LATN => ScriptType::Default,
            tag::CYRL => ScriptType::Default,
            tag::GREK => ScriptType::Default,
            _ => ScriptType::Default,
        }
    }
}

pub trait ScriptProcessor: ScriptContextTester + Send + Sync {
    /// Features applied by `substitute`, in order.
    fn substitution_features(&self) -> &[u32];

    /// Features applied by `position`, in order.
    fn positioning_features(&self) -> &[u32];

    /// Apply the matched substitution lookups, feature by feature.
    fn substitute(
        &self,
        gs: &GlyphSequence,
        lookups: &MatchedLookups<'_, SubstKind>,
    ) -> Result<GlyphSequence, ShapingError> {
        let mut gs = gs.clone();
        for &feature in self.substitution_features() {
            let subtables = lookups.feature_subtables(feature);
            if subtables.is_empty() {
                continue;
            }
            let tester = self.feature_tester(feature);
            for subtable in subtables {
                gs = subtable.substitute_where(&gs, tester)?;
            }
        }
        Ok(gs)
    }

    /// Accumulate the matched positioning lookups into one adjustment per glyph.
    ///
    /// Returns `None` if no glyph was adjusted.
    fn position(
        &self,
        gs: &GlyphSequence,
        lookups: &MatchedLookups<'_, PosKind>,
    ) -> Result<Option<Vec<Adjustment>>, ShapingError> {
        let mut adjustments = vec![Adjustment::default(); gs.glyph_count()];
        let mut adjusted = false;
        for &feature in self.positioning_features() {
            let tester = self.feature_tester(feature);
            for subtable in lookups.feature_subtables(feature) {
                adjusted |= subtable.position_where(gs, &mut adjustments, tester)?;
            }
        }
        Ok(if adjusted { Some(adjustments) } else { None })
    }

    fn feature_tester(&self, feature: u32) -> GlyphContextTester {
        self.tester(feature).unwrap_or(always)
    }
}

/// Processor for scripts without contextual shaping: substitution leaves the sequence unchanged
/// and positioning adjusts nothing.
#[derive(Debug, Default)]
pub struct DefaultProcessor;

impl ScriptContextTester for DefaultProcessor {
    fn tester(&self, _feature: u32) -> Option<GlyphContextTester> {
        None
    }
}

impl ScriptProcessor for DefaultProcessor {
    fn substitution_features(&self) -> &[u32] {
        &[]
    }

    fn positioning_features(&self) -> &[u32] {
        &[]
    }
}

lazy_static! {
    static ref PROCESSORS: Mutex<FxHashMap<u32, Arc<dyn ScriptProcessor>>> =
        Mutex::new(FxHashMap::default());
}

/// The shared processor for `script`, created on first request.
pub fn processor_for(script: u32) -> Arc<dyn ScriptProcessor> {
    let mut processors = PROCESSORS.lock();
    let processor = processors.entry(script).or_insert_with(|| {
        debug!("creating script processor for {}", DisplayTag(script));
        create_processor(script)
    });
    Arc::clone(processor)
}

fn create_processor(script: u32) -> Arc<dyn ScriptProcessor> {
    match ScriptType::from(script) {
        ScriptType::Arabic => Arc::new(arabic::ArabicProcessor::default()),
        ScriptType::Default => Arc::new(DefaultProcessor),
    }
}

#![warn(rust_2018_idioms)]

//! # Complex script shaping core
//!
//! Glyph substitution and positioning for CID-keyed fonts. Lookups are registered per
//! `(script, language, feature)` and applied to a `GlyphSequence` by a script processor, which
//! chooses the feature order and decides in which contexts each feature applies.
//!
//! ```
//! use complexscripts::font::{BfEntry, EmbeddingMode, MultiByteFont};
//! use complexscripts::tag;
//!
//! let font = MultiByteFont::new(vec![BfEntry::new(0x41, 0x5A, 1)?], EmbeddingMode::Full);
//! let text = "ABC".encode_utf16().collect::<Vec<_>>();
//! let shaped = font.perform_substitution(&text, tag::LATN, tag::DFLT_LANG)?;
//! assert_eq!(shaped, text);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod context;
/// Coverage tables.
pub mod coverage;
pub mod error;
pub mod font;
pub mod gdef;
pub mod glyph_sequence;
pub mod gpos;
pub mod gsub;
pub mod layout;
/// Script-specific shaping.
pub mod scripts;
/// CID font subsetting.
pub mod subset;
pub mod tag;

pub use crate::error::{ShapingError, TableError};
pub use crate::font::MultiByteFont;
pub use crate::glyph_sequence::{CharAssociation, GlyphSequence, Predication};

//! Ligature feature generation and compilation.
//!
//! [`FeatureFile`] renders OpenType feature-file source for a set of
//! [`LigatureRule`]s, and a [`FeatureCompiler`] compiles such source into the
//! layout tables of a font.
//!
//! # Example
//!
//! ```no_run
//! use iconslim_font_features::{FeaRsCompiler, FeatureCompiler, FeatureFile, LigatureRule};
//! use iconslim_font_ops::GlyphInventory;
//!
//! let mut font = std::fs::read("icons.ttf").unwrap();
//! let mut features = FeatureFile::liga();
//! features.push(LigatureRule::new(["h", "o", "m", "e"], "home"));
//! let source = features.to_source(&GlyphInventory::from_data(&font).unwrap()).unwrap();
//! FeaRsCompiler::new().compile(&source, &mut font).unwrap();
//! ```

mod compiler;
mod source;

use std::result;

pub use compiler::{FeaRsCompiler, FeatureCompiler, LAYOUT_TABLES, glyph_map};
pub use source::{FeatureFile, LigatureRule};

/// Errors raised while compiling features into a font.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read font: {0:#}")]
    Font(#[from] anyhow::Error),

    #[error("no glyph named {0:?} in the font")]
    UnknownGlyph(String),

    #[error("feature compilation failed:\n{0}")]
    Compile(String),
}

pub type Result<T> = result::Result<T, Error>;

//! Compiling feature source into a font's layout tables.

use std::{ffi::OsStr, sync::Arc};

use anyhow::Context;
use fea_rs::{
    Compiler, GlyphIdent, GlyphMap,
    parse::{SourceLoadError, SourceResolver},
};
use iconslim_font_ops::{fallback_glyph_name, replace_tables};
use log::{debug, info};
use read_fonts::{FontRef, TableProvider, types::Tag};

use crate::{Error, Result};

/// Tables taken from the compiled features and written into the font.
pub const LAYOUT_TABLES: &[Tag] = &[Tag::new(b"GSUB"), Tag::new(b"GPOS"), Tag::new(b"GDEF")];

/// Path the source is compiled under.
const ROOT_PATH: &str = "features.fea";

/// Compiles feature-file source against a font and updates its layout tables.
pub trait FeatureCompiler {
    /// Compile `source` against the glyph set of `font` (SFNT data) and
    /// replace its layout tables with the result.
    fn compile(&self, source: &str, font: &mut Vec<u8>) -> Result<()>;
}

/// Glyph map naming every glyph by its id, as [`FeatureFile::to_source`]
/// writes them.
///
/// [`FeatureFile::to_source`]: crate::FeatureFile::to_source
pub fn glyph_map(num_glyphs: u16) -> GlyphMap {
    (0..num_glyphs).map(|gid| GlyphIdent::Name(fallback_glyph_name(gid).into())).collect()
}

/// Serves a single in-memory source; includes are rejected.
struct InMemorySource {
    contents: Arc<str>,
}

impl SourceResolver for InMemorySource {
    fn get_contents(&self, path: &OsStr) -> std::result::Result<Arc<str>, SourceLoadError> {
        if path == ROOT_PATH {
            Ok(self.contents.clone())
        } else {
            Err(SourceLoadError::new(path.to_owned(), "includes are not supported"))
        }
    }
}

/// [`FeatureCompiler`] backed by fea-rs.
///
/// Source must name glyphs by id (`glyph00042`); see
/// [`FeatureFile::to_source`](crate::FeatureFile::to_source).
#[derive(Debug, Clone, Copy, Default)]
pub struct FeaRsCompiler;

impl FeaRsCompiler {
    pub fn new() -> Self {
        Self
    }

    /// Compile `source` and return a font holding only the layout tables.
    pub fn compile_tables(&self, source: &str, num_glyphs: u16) -> Result<Vec<u8>> {
        let glyph_map = glyph_map(num_glyphs);
        let resolver = InMemorySource { contents: source.into() };

        Compiler::new(ROOT_PATH, &glyph_map).with_resolver(resolver).compile_binary().map_err(
            |e| {
                debug!("fea-rs error: {e:?}");
                Error::Compile(format!("{e}\n--- source ---\n{source}"))
            },
        )
    }
}

impl FeatureCompiler for FeaRsCompiler {
    fn compile(&self, source: &str, font: &mut Vec<u8>) -> Result<()> {
        let num_glyphs = FontRef::new(&font[..])
            .and_then(|font| font.maxp())
            .map(|maxp| maxp.num_glyphs())
            .context("Failed to read glyph count")?;
        let compiled = self.compile_tables(source, num_glyphs)?;

        let (data, replaced) = replace_tables(&compiled, &font[..], LAYOUT_TABLES)?;
        if replaced.is_empty() {
            info!("Compiled features produced no layout tables");
        } else {
            let replaced = replaced.iter().map(Tag::to_string).collect::<Vec<_>>();
            info!("Compiled features into {}", replaced.join(", "));
        }

        *font = data;
        Ok(())
    }
}

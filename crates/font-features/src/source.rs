//! Feature-file source for ligature substitutions.

use std::fmt::{self, Display, Formatter};

use iconslim_font_ops::{GlyphInventory, fallback_glyph_name};

use crate::{Error, Result};

/// Language systems declared ahead of every feature block.
const LANGUAGE_SYSTEMS: &[(&str, &str)] = &[("DFLT", "dflt"), ("latn", "dflt")];

/// `sub <components> by <replacement>;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LigatureRule {
    pub components: Vec<String>,
    pub replacement: String,
}

impl LigatureRule {
    pub fn new<I, S>(components: I, replacement: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            components: components.into_iter().map(Into::into).collect(),
            replacement: replacement.into(),
        }
    }

    /// The same rule with every glyph renamed by `rename`.
    fn try_rename(&self, rename: impl Fn(&str) -> Result<String>) -> Result<Self> {
        Ok(Self {
            components: self.components.iter().map(|c| rename(c)).collect::<Result<_>>()?,
            replacement: rename(&self.replacement)?,
        })
    }
}

impl Display for LigatureRule {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "sub {} by {};", self.components.join(" "), self.replacement)
    }
}

/// A single-feature feature file.
///
/// Rules hold font glyph names and are written in insertion order. `Display`
/// shows those names as-is, for logs; [`FeatureFile::to_source`] renders
/// source that compiles whatever the names look like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureFile {
    tag: String,
    rules: Vec<LigatureRule>,
}

impl FeatureFile {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into(), rules: Vec::new() }
    }

    /// Standard ligatures.
    pub fn liga() -> Self {
        Self::new("liga")
    }

    pub fn push(&mut self, rule: LigatureRule) {
        self.rules.push(rule);
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn rules(&self) -> &[LigatureRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Render source for [`FeaRsCompiler`](crate::FeaRsCompiler).
    ///
    /// Glyphs are addressed by glyph id as `glyphNNNNN` (`.notdef` for glyph
    /// 0), so names such as `10k` or `sub` never reach the parser.
    pub fn to_source(&self, glyphs: &GlyphInventory) -> Result<String> {
        let rename = |name: &str| {
            glyphs
                .glyph_id(name)
                .map(|gid| fallback_glyph_name(gid.to_u16()))
                .ok_or_else(|| Error::UnknownGlyph(name.to_string()))
        };
        let rules = self.rules.iter().map(|rule| rule.try_rename(rename)).collect::<Result<_>>()?;
        Ok(Self { tag: self.tag.clone(), rules }.to_string())
    }
}

impl Display for FeatureFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (script, language) in LANGUAGE_SYSTEMS {
            writeln!(f, "languagesystem {script} {language};")?;
        }
        writeln!(f, "feature {} {{", self.tag)?;
        for rule in &self.rules {
            writeln!(f, "    {rule}")?;
        }
        writeln!(f, "}} {};", self.tag)
    }
}

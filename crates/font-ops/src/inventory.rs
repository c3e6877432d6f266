//! Glyph inventory: glyph order plus the best Unicode cmap.

use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result};
use indexmap::IndexSet;
use read_fonts::{
    FontRef, TableProvider,
    tables::cmap::{Cmap, CmapSubtable, PlatformId},
    types::GlyphId16,
};

/// Preferred cmap subtables, best first: full-repertoire Unicode, then BMP.
const CMAP_PREFERENCE: &[(PlatformId, u16)] = &[
    (PlatformId::Windows, 10),
    (PlatformId::Unicode, 6),
    (PlatformId::Unicode, 4),
    (PlatformId::Windows, 1),
    (PlatformId::Unicode, 3),
    (PlatformId::Unicode, 2),
    (PlatformId::Unicode, 1),
    (PlatformId::Unicode, 0),
];

/// Name given to a glyph the `post` table does not name.
pub fn fallback_glyph_name(gid: u16) -> String {
    if gid == 0 { ".notdef".to_string() } else { format!("glyph{gid:05}") }
}

/// Every glyph name of a font, in glyph-id order, with its Unicode mappings.
#[derive(Debug, Clone, Default)]
pub struct GlyphInventory {
    glyph_order: IndexSet<String>,
    best_cmap: BTreeMap<u32, String>,
    reverse_cmap: HashMap<String, u32>,
}

impl GlyphInventory {
    /// Read the inventory of an SFNT font (TrueType/OpenType, not WOFF2).
    pub fn from_data(data: &[u8]) -> Result<Self> {
        let font = FontRef::new(data).context("Failed to parse font")?;
        Self::from_font(&font)
    }

    pub fn from_font(font: &FontRef) -> Result<Self> {
        let glyph_order = read_glyph_order(font)?;

        let mut best_cmap = BTreeMap::new();
        if let Ok(cmap) = font.cmap()
            && let Some(subtable) = find_best_subtable(&cmap)
        {
            // glyph 0 marks an unmapped code point (format 4's 0xFFFF sentinel)
            for (code_point, gid) in subtable.iter().filter(|(_, gid)| gid.to_u32() != 0) {
                if let Some(name) = glyph_order.get_index(gid.to_u32() as usize) {
                    best_cmap.insert(code_point, name.clone());
                }
            }
        }

        // Ascending iteration: the highest code point wins for glyphs mapped twice.
        let reverse_cmap =
            best_cmap.iter().map(|(code_point, name)| (name.clone(), *code_point)).collect();

        Ok(Self { glyph_order, best_cmap, reverse_cmap })
    }

    pub fn glyph_order(&self) -> impl ExactSizeIterator<Item = &str> {
        self.glyph_order.iter().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.glyph_order.contains(name)
    }

    /// Glyph id of a named glyph.
    pub fn glyph_id(&self, name: &str) -> Option<GlyphId16> {
        let index = self.glyph_order.get_index_of(name)?;
        u16::try_from(index).ok().map(GlyphId16::new)
    }

    /// Glyph mapped to a code point, if any.
    pub fn glyph_for(&self, code_point: u32) -> Option<&str> {
        self.best_cmap.get(&code_point).map(String::as_str)
    }

    /// Code point of a glyph, if the cmap reaches it.
    pub fn code_point_of(&self, name: &str) -> Option<u32> {
        self.reverse_cmap.get(name).copied()
    }

    /// Character → glyph name, for code points that are valid scalar values.
    pub fn char_map(&self) -> HashMap<char, &str> {
        self.best_cmap
            .iter()
            .filter_map(|(code_point, name)| Some((char::from_u32(*code_point)?, name.as_str())))
            .collect()
    }
}

/// Glyph names from the `post` table, falling back to `glyphNNNNN`.
///
/// Duplicate names get a `.N` suffix so every glyph stays addressable by name.
fn read_glyph_order(font: &FontRef) -> Result<IndexSet<String>> {
    let num_glyphs = font.maxp().context("Failed to read maxp table")?.num_glyphs();
    let post = font.post().ok();

    let mut order = IndexSet::with_capacity(num_glyphs as usize);
    for gid in 0..num_glyphs {
        let name = post
            .as_ref()
            .and_then(|p| p.glyph_name(GlyphId16::new(gid)))
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| fallback_glyph_name(gid));

        if order.contains(&name) {
            let unique = (1..)
                .map(|n| format!("{name}.{n}"))
                .find(|candidate| !order.contains(candidate))
                .unwrap_or_else(|| fallback_glyph_name(gid));
            order.insert(unique);
        } else {
            order.insert(name);
        }
    }
    Ok(order)
}

fn find_best_subtable<'a>(cmap: &Cmap<'a>) -> Option<CmapSubtable<'a>> {
    let records = cmap.encoding_records();
    CMAP_PREFERENCE.iter().find_map(|(platform, encoding)| {
        records
            .iter()
            .filter(|r| r.platform_id() == *platform && r.encoding_id() == *encoding)
            .find_map(|r| r.subtable(cmap.offset_data()).ok())
    })
}

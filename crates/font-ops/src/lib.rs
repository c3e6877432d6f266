//! Generic font table manipulation utilities.

#[cfg(any(test, feature = "fixture"))]
pub mod fixture;
mod inventory;

use anyhow::{Context, Result};
use read_fonts::{FontRef, types::Tag};
use write_fonts::FontBuilder;

pub use inventory::{GlyphInventory, fallback_glyph_name};

/// Rewrite font data by applying a transformation function.
///
/// Copies all tables from the source font except those rejected by `keep`,
/// then calls `f` to modify or add tables.
pub fn rewrite_font(
    data: &[u8],
    keep: impl Fn(Tag) -> bool,
    f: impl FnOnce(&FontRef, &mut FontBuilder) -> Result<()>,
) -> Result<Vec<u8>> {
    let font = FontRef::new(data).context("Failed to parse font")?;
    let mut builder = FontBuilder::new();

    for record in font.table_directory.table_records() {
        let tag = record.tag();
        if !keep(tag) {
            continue;
        }
        if let Some(table_data) = font.table_data(tag) {
            builder.add_raw(tag, table_data);
        }
    }

    f(&font, &mut builder)?;
    Ok(builder.build())
}

/// Replace the listed tables of `target_data` with those of `source_data`.
///
/// Listed tables the source lacks are removed from the target. Returns the
/// new target data and the tags taken from the source.
pub fn replace_tables(
    source_data: &[u8],
    target_data: &[u8],
    tags: &[Tag],
) -> Result<(Vec<u8>, Vec<Tag>)> {
    let source_font = FontRef::new(source_data).context("Failed to parse source font")?;

    let replaced: Vec<(Tag, &[u8])> = tags
        .iter()
        .filter_map(|tag| source_font.table_data(*tag).map(|data| (*tag, data.as_bytes())))
        .collect();

    let data = rewrite_font(
        target_data,
        |tag| !tags.contains(&tag),
        |_, builder| {
            for (tag, data) in &replaced {
                builder.add_raw(*tag, data.to_vec());
            }
            Ok(())
        },
    )?;

    Ok((data, replaced.into_iter().map(|(tag, _)| tag).collect()))
}

#[cfg(test)]
mod tests {
    use read_fonts::TableProvider;

    use super::*;
    use crate::fixture::FontFixture;

    const GSUB: Tag = Tag::new(b"GSUB");

    #[test]
    fn test_rewrite_font_keeps_tables() {
        let data = FontFixture::new(["a", "b"]).map('a', "a").build();
        let rewritten = rewrite_font(&data, |_| true, |_, _| Ok(())).unwrap();

        let font = FontRef::new(&rewritten).unwrap();
        assert_eq!(font.maxp().unwrap().num_glyphs(), 3);
        assert!(font.cmap().is_ok());
        assert!(font.post().is_ok());
    }

    #[test]
    fn test_replace_tables_takes_and_clears() {
        let gdef = Tag::new(b"GDEF");
        let source = FontFixture::new(["x"]).with_raw_table(GSUB, vec![1, 2, 3, 4]).build();
        let target = FontFixture::new(["a", "b"])
            .with_raw_table(GSUB, vec![9, 9])
            .with_raw_table(gdef, vec![7, 7])
            .build();

        let (merged, replaced) = replace_tables(&source, &target, &[GSUB, gdef]).unwrap();

        assert_eq!(replaced, vec![GSUB]);
        let font = FontRef::new(&merged).unwrap();
        assert_eq!(font.table_data(GSUB).unwrap().as_bytes(), &[1, 2, 3, 4]);
        // the source has no GDEF, so the stale one is gone
        assert!(font.table_data(gdef).is_none());
        // target glyph set is untouched
        assert_eq!(font.maxp().unwrap().num_glyphs(), 3);
    }

    #[test]
    fn test_rewrite_font_filters_and_adds() {
        let data = FontFixture::new(["a"]).with_raw_table(GSUB, vec![0; 8]).build();
        let rewritten = rewrite_font(
            &data,
            |tag| tag != GSUB,
            |_, builder| {
                builder.add_raw(Tag::new(b"GPOS"), vec![1, 2]);
                Ok(())
            },
        )
        .unwrap();
        let font = FontRef::new(&rewritten).unwrap();
        assert!(font.table_data(GSUB).is_none());
        assert_eq!(font.table_data(Tag::new(b"GPOS")).unwrap().as_bytes(), &[1, 2]);
        assert!(font.table_data(Tag::new(b"cmap")).is_some());
    }
}

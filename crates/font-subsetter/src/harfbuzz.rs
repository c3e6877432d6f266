//! In-process subsetting with HarfBuzz's hb-subset.

use std::fs::{read, write};

use hb_subset::{Blob, FontFace, SubsetInput, Tag};
use iconslim_font_woff2::to_sfnt;
use log::info;

use crate::{Error, Result, SubsetRequest, Subsetter};

/// Layout tables removed when a request drops layout features.
pub const LAYOUT_TABLES_TO_DROP: &[&[u8; 4]] = &[b"GSUB", b"GPOS", b"morx", b"mort"];

/// Subsets with hb-subset, following the same directives as `pyftsubset`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HbSubsetter;

impl HbSubsetter {
    pub fn new() -> Self {
        Self
    }

    /// Subset SFNT or WOFF2 data and return SFNT data.
    pub fn subset_data(&self, data: &[u8], request: &SubsetRequest) -> Result<Vec<u8>> {
        let sfnt = to_sfnt(data)?;
        let mut input = SubsetInput::new().map_err(hb_error)?;

        if request.retains_glyph_names() {
            input.flags().retain_glyph_names();
        }
        if request.removes_hinting() {
            input.flags().remove_hinting();
        }

        if request.drops_layout_features() {
            input.layout_feature_tag_set().clear();
            let mut drop_tables = input.drop_table_tag_set();
            for table in LAYOUT_TABLES_TO_DROP {
                drop_tables.insert(Tag::new(*table));
            }
        }

        {
            let mut unicode_set = input.unicode_set();
            for c in request.characters() {
                unicode_set.insert(c);
            }
        }

        let font = FontFace::new(Blob::from_bytes(&sfnt).map_err(hb_error)?).map_err(hb_error)?;
        let subset_font = input.subset_font(&font).map_err(hb_error)?;
        Ok(subset_font.underlying_blob().to_vec())
    }
}

impl Subsetter for HbSubsetter {
    fn name(&self) -> &str {
        "hb-subset"
    }

    fn subset(&self, request: &SubsetRequest) -> Result<()> {
        let path = request.input();
        let data = read(path).map_err(|source| Error::Read { path: path.to_path_buf(), source })?;

        let sfnt = self.subset_data(&data, request)?;
        let out = request.flavor().wrap(&sfnt)?;

        let path = request.output();
        write(path, &out).map_err(|source| Error::Write { path: path.to_path_buf(), source })?;
        info!("Subsetted to {} with hb-subset", path.display());
        Ok(())
    }
}

fn hb_error(e: impl std::fmt::Debug) -> Error {
    Error::HarfBuzz(format!("{e:?}"))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn test_layout_tables_to_drop() {
        assert!(LAYOUT_TABLES_TO_DROP.contains(&b"GSUB"));
    }

    #[test]
    fn test_missing_input_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let request = SubsetRequest::new(dir.path().join("missing.woff2"), dir.path().join("out"));
        let err = HbSubsetter::new().subset(&request).unwrap_err();
        match err {
            Error::Read { path, .. } => assert_eq!(path, dir.path().join("missing.woff2")),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!Path::new(&dir.path().join("out")).exists());
    }

    #[test]
    fn test_garbage_input_is_rejected() {
        let request = SubsetRequest::new("in", "out");
        assert!(HbSubsetter::new().subset_data(b"garbage", &request).is_err());
    }
}

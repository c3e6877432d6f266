//! Matching requested icons against the source font's glyphs.

use std::{fs::read, path::Path};

use iconslim_font_ops::GlyphInventory;
use iconslim_font_woff2::to_sfnt;
use indexmap::IndexMap;
use log::{info, warn};

use crate::{Error, IconRequests, Result, config::MISSING_PREVIEW_LIMIT};

/// Read the glyph inventory of a font file (SFNT or WOFF2).
pub fn load_inventory(path: &Path) -> Result<GlyphInventory> {
    if !path.exists() {
        return Err(Error::MissingInput { what: "Input font", path: path.to_path_buf() });
    }
    let data = read(path).map_err(|source| Error::Read { path: path.to_path_buf(), source })?;
    to_sfnt(&data)
        .and_then(|sfnt| GlyphInventory::from_data(&sfnt))
        .map_err(|source| Error::Font { path: path.to_path_buf(), source })
}

/// Requested icons split by presence in the font.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    /// Icons that name a glyph in the font, in request order.
    pub valid: Vec<String>,
    /// Icons with no glyph of that name, in request order.
    pub missing: Vec<String>,
    /// Code point of each valid icon the cmap reaches.
    pub code_points: IndexMap<String, u32>,
}

impl Validation {
    /// Partition `requests` against `inventory`.
    ///
    /// Fails only when no icon is valid.
    pub fn new(inventory: &GlyphInventory, requests: &IconRequests) -> Result<Self> {
        info!("Inspecting source font to validate {} icons...", requests.len());

        let mut validation = Self::default();
        for icon in requests.iter() {
            if !inventory.contains(icon) {
                validation.missing.push(icon.to_string());
                continue;
            }
            validation.valid.push(icon.to_string());
            match inventory.code_point_of(icon) {
                Some(code_point) => {
                    validation.code_points.insert(icon.to_string(), code_point);
                }
                None => info!("Icon '{icon}' has no direct unicode mapping."),
            }
        }

        if !validation.missing.is_empty() {
            warn!(
                "The following {} icons were not found in the font file and will be skipped:",
                validation.missing.len()
            );
            warn!("{}", missing_preview(&validation.missing));
        }

        if validation.valid.is_empty() {
            return Err(Error::NoValidIcons { requested: requests.len() });
        }
        Ok(validation)
    }

    /// Code point resolved for a valid icon.
    pub fn code_point(&self, icon: &str) -> Option<u32> {
        self.code_points.get(icon).copied()
    }

    /// Valid icons joined by spaces: the characters the ligatures are typed with.
    pub fn text(&self) -> String {
        self.valid.join(" ")
    }

    /// Resolved code points in request order: the ligature targets.
    pub fn unicodes(&self) -> impl Iterator<Item = u32> + '_ {
        self.code_points.values().copied()
    }

    /// Valid icons the cmap does not reach.
    pub fn without_code_point(&self) -> impl Iterator<Item = &str> {
        self.valid.iter().map(String::as_str).filter(|icon| !self.code_points.contains_key(*icon))
    }
}

/// Up to [`MISSING_PREVIEW_LIMIT`] names joined by commas, with `...` when cut.
pub fn missing_preview(missing: &[String]) -> String {
    let shown = missing.iter().take(MISSING_PREVIEW_LIMIT).map(String::as_str);
    let mut preview = shown.collect::<Vec<_>>().join(", ");
    if missing.len() > MISSING_PREVIEW_LIMIT {
        preview.push_str("...");
    }
    preview
}

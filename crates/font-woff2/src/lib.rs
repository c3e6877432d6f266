//! WOFF2 container handling for the icon pipeline.
//!
//! Font libraries in this workspace operate on SFNT data (TrueType/OpenType).
//! This crate unwraps WOFF2 input into SFNT and wraps SFNT output back into
//! WOFF2.
//!
//! # Example
//!
//! ```no_run
//! use iconslim_font_woff2::{Flavor, to_sfnt};
//!
//! let data = std::fs::read("icons.woff2").unwrap();
//! let sfnt = to_sfnt(&data).unwrap();
//! let woff2 = Flavor::Woff2.wrap(&sfnt).unwrap();
//! ```

mod decode;
mod transform;

use std::{borrow::Cow, fmt};

use anyhow::{Context, Result, anyhow};
use read_fonts::FontRef;
use ttf2woff2::BrotliQuality;

pub use decode::decode;

/// WOFF2 file signature.
pub const WOFF2_MAGIC: &[u8; 4] = b"wOF2";

/// Container format of a font file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flavor {
    /// Compressed web font.
    #[default]
    Woff2,
    /// Plain TrueType/OpenType.
    Sfnt,
}

impl Flavor {
    /// Value of fontTools' `--flavor` option, if any.
    pub fn fonttools_name(self) -> Option<&'static str> {
        match self {
            Self::Woff2 => Some("woff2"),
            Self::Sfnt => None,
        }
    }

    /// Package SFNT data in this container.
    pub fn wrap(self, sfnt: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Woff2 => encode(sfnt),
            Self::Sfnt => Ok(sfnt.to_vec()),
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Woff2 => f.write_str("woff2"),
            Self::Sfnt => f.write_str("sfnt"),
        }
    }
}

pub fn is_woff2(data: &[u8]) -> bool {
    data.starts_with(WOFF2_MAGIC)
}

/// Return SFNT data, decoding WOFF2 when needed.
///
/// Non-WOFF2 input is borrowed as-is after checking that it parses.
pub fn to_sfnt(data: &[u8]) -> Result<Cow<'_, [u8]>> {
    if is_woff2(data) {
        return decode(data).context("Failed to decode WOFF2").map(Cow::Owned);
    }
    FontRef::new(data).context("Failed to parse font")?;
    Ok(Cow::Borrowed(data))
}

/// Encode SFNT data as WOFF2 with maximum Brotli quality.
pub fn encode(sfnt: &[u8]) -> Result<Vec<u8>> {
    ttf2woff2::encode(sfnt, BrotliQuality::default())
        .map_err(|e| anyhow!("Failed to encode WOFF2: {e:?}"))
}

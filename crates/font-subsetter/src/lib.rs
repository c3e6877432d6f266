//! Icon font subsetting.
//!
//! A [`SubsetRequest`] describes what to keep: literal text (the letters that
//! icon names are typed with) and code points (the icon glyphs themselves).
//! It is executed by a [`Subsetter`] backend:
//!
//! - [`CommandSubsetter`] runs fontTools' `pyftsubset` as a child process.
//! - [`HbSubsetter`] subsets in-process with HarfBuzz.
//!
//! # Example
//!
//! ```no_run
//! use iconslim_font_subsetter::{CommandSubsetter, SubsetRequest, Subsetter};
//!
//! let request = SubsetRequest::new("MaterialSymbols.woff2", "icons.woff2")
//!     .with_text("home menu")
//!     .with_unicodes([0xe88a, 0xe5d2]);
//! CommandSubsetter::pyftsubset().subset(&request).unwrap();
//! ```

mod command;
mod harfbuzz;

use std::{
    io,
    path::{Path, PathBuf},
    process::ExitStatus,
    result,
};

pub use command::CommandSubsetter;
pub use harfbuzz::HbSubsetter;
pub use iconslim_font_woff2::Flavor;

/// Errors raised while subsetting.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} failed ({status}){}", format_stderr(.stderr))]
    Failed { program: String, status: ExitStatus, stderr: String },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("hb-subset: {0}")]
    HarfBuzz(String),

    #[error(transparent)]
    Container(#[from] anyhow::Error),
}

fn format_stderr(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() { String::new() } else { format!(":\n{stderr}") }
}

pub type Result<T> = result::Result<T, Error>;

/// A subsetting backend.
pub trait Subsetter {
    /// Short name used in log output.
    fn name(&self) -> &str;

    /// Produce `request.output()` from `request.input()`.
    fn subset(&self, request: &SubsetRequest) -> Result<()>;
}

impl<T: Subsetter + ?Sized> Subsetter for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn subset(&self, request: &SubsetRequest) -> Result<()> {
        (**self).subset(request)
    }
}

/// What to retain from a font, and where to write the result.
///
/// Defaults: WOFF2 output, all layout features dropped, hinting removed,
/// glyph names not retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsetRequest {
    input: PathBuf,
    output: PathBuf,
    flavor: Flavor,
    text: String,
    unicodes: Vec<u32>,
    drop_layout_features: bool,
    no_hinting: bool,
    retain_glyph_names: bool,
}

impl SubsetRequest {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            flavor: Flavor::Woff2,
            text: String::new(),
            unicodes: Vec::new(),
            drop_layout_features: true,
            no_hinting: true,
            retain_glyph_names: false,
        }
    }

    /// Keep the glyphs of every character in `text`.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Keep the glyphs mapped to these code points.
    pub fn with_unicodes(mut self, unicodes: impl IntoIterator<Item = u32>) -> Self {
        self.unicodes.extend(unicodes);
        self
    }

    pub fn with_flavor(mut self, flavor: Flavor) -> Self {
        self.flavor = flavor;
        self
    }

    /// When `false`, the backend's default layout features are kept.
    pub fn drop_layout_features(mut self, drop: bool) -> Self {
        self.drop_layout_features = drop;
        self
    }

    pub fn no_hinting(mut self, no_hinting: bool) -> Self {
        self.no_hinting = no_hinting;
        self
    }

    pub fn retain_glyph_names(mut self, retain: bool) -> Self {
        self.retain_glyph_names = retain;
        self
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn unicodes(&self) -> &[u32] {
        &self.unicodes
    }

    pub fn drops_layout_features(&self) -> bool {
        self.drop_layout_features
    }

    pub fn removes_hinting(&self) -> bool {
        self.no_hinting
    }

    pub fn retains_glyph_names(&self) -> bool {
        self.retain_glyph_names
    }

    /// Code points as comma-separated `0x`-prefixed lowercase hex.
    pub fn unicodes_arg(&self) -> String {
        self.unicodes.iter().map(|cp| format!("{cp:#x}")).collect::<Vec<_>>().join(",")
    }

    /// Every character the subset must cover: the text plus the code points.
    pub fn characters(&self) -> impl Iterator<Item = char> + '_ {
        self.text.chars().chain(self.unicodes.iter().filter_map(|cp| char::from_u32(*cp)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request = SubsetRequest::new("in.woff2", "out.woff2");
        assert_eq!(request.flavor(), Flavor::Woff2);
        assert!(request.drops_layout_features());
        assert!(request.removes_hinting());
        assert!(!request.retains_glyph_names());
        assert!(request.text().is_empty());
        assert!(request.unicodes().is_empty());
    }

    #[test]
    fn test_builder_chain() {
        let request = SubsetRequest::new("in.ttf", "out.ttf")
            .with_text("home place")
            .with_unicodes([0xe88a])
            .with_unicodes([0xe55f])
            .with_flavor(Flavor::Sfnt)
            .drop_layout_features(false)
            .no_hinting(false)
            .retain_glyph_names(true);

        assert_eq!(request.input(), Path::new("in.ttf"));
        assert_eq!(request.output(), Path::new("out.ttf"));
        assert_eq!(request.unicodes(), &[0xe88a, 0xe55f]);
        assert_eq!(request.flavor(), Flavor::Sfnt);
        assert!(!request.drops_layout_features());
        assert!(!request.removes_hinting());
        assert!(request.retains_glyph_names());
    }

    #[test]
    fn test_unicodes_arg() {
        let request = SubsetRequest::new("a", "b").with_unicodes([0xe88a, 0xe55f, 0x41]);
        assert_eq!(request.unicodes_arg(), "0xe88a,0xe55f,0x41");
        assert_eq!(SubsetRequest::new("a", "b").unicodes_arg(), "");
    }

    #[test]
    fn test_characters() {
        let request = SubsetRequest::new("a", "b").with_text("ab").with_unicodes([0xe88a]);
        assert_eq!(request.characters().collect::<String>(), "ab\u{e88a}");
    }

    #[test]
    fn test_failed_error_message_includes_stderr() {
        let status = std::process::Command::new("false").status();
        let Ok(status) = status else { return };
        let error = Error::Failed {
            program: "pyftsubset".to_string(),
            status,
            stderr: "  KeyError: 'glyf'\n".to_string(),
        };
        let message = error.to_string();
        assert!(message.starts_with("pyftsubset failed ("));
        assert!(message.ends_with(":\nKeyError: 'glyf'"));
    }
}

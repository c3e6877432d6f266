//! Fixed locations and constants for the icon font build.

use std::path::{Path, PathBuf};

/// Source font, relative to the project root.
pub const SOURCE_FONT: &str = "scripts/MaterialSymbolsRounded[FILL,GRAD,opsz,wght].woff2";

/// Requested icon list, relative to the project root.
pub const ICON_LIST: &str = "src/assets/fonts/icons_list.txt";

/// Optimized output font, relative to the project root.
pub const OUTPUT_FONT: &str = "src/assets/fonts/material-symbols-optimized.woff2";

/// Icon requested when the list has no entries.
pub const DEFAULT_ICON: &str = "home";

/// Prefix of comment lines in the icon list.
pub const COMMENT_PREFIX: char = '#';

/// How many missing icons the validation warning names.
pub const MISSING_PREVIEW_LIMIT: usize = 10;

/// Feature the rebuilt ligatures are registered under.
pub const LIGATURE_FEATURE: &str = "liga";

/// Input and output paths of one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub source_font: PathBuf,
    pub icon_list: PathBuf,
    pub output_font: PathBuf,
}

impl ProjectPaths {
    pub fn from_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            source_font: root.join(SOURCE_FONT),
            icon_list: root.join(ICON_LIST),
            output_font: root.join(OUTPUT_FONT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_from_root() {
        let paths = ProjectPaths::from_root("/app");
        assert_eq!(
            paths.source_font,
            Path::new("/app/scripts/MaterialSymbolsRounded[FILL,GRAD,opsz,wght].woff2")
        );
        assert_eq!(paths.icon_list, Path::new("/app/src/assets/fonts/icons_list.txt"));
        assert_eq!(
            paths.output_font,
            Path::new("/app/src/assets/fonts/material-symbols-optimized.woff2")
        );
    }
}

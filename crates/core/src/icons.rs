//! Loading the list of requested icons.

use std::{fs::read_to_string, path::Path};

use indexmap::IndexSet;
use log::warn;

use crate::{
    Error, Result,
    config::{COMMENT_PREFIX, DEFAULT_ICON},
};

/// Requested icon names, unique, in order of first appearance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconRequests {
    names: IndexSet<String>,
    fallback: bool,
}

impl IconRequests {
    /// Read an icon list file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::MissingInput { what: "Icons list", path: path.to_path_buf() });
        }
        let text = read_to_string(path)
            .map_err(|source| Error::Read { path: path.to_path_buf(), source })?;

        let requests = Self::parse(&text);
        if requests.is_fallback() {
            warn!("{} is empty. Creating minimal subset.", path.display());
        }
        Ok(requests)
    }

    /// Parse one name per line, skipping blank and `#` comment lines.
    ///
    /// An empty result falls back to [`DEFAULT_ICON`].
    pub fn parse(text: &str) -> Self {
        Self::from_names(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with(COMMENT_PREFIX)),
        )
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: IndexSet<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            Self { names: IndexSet::from([DEFAULT_ICON.to_string()]), fallback: true }
        } else {
            Self { names, fallback: false }
        }
    }

    /// Whether the list was empty and the default icon was substituted.
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::fs::write;

    use super::*;

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let requests = IconRequests::parse("# header\nhome\n\n  menu  \n#search\n\t\nplace\n");
        assert_eq!(requests.iter().collect::<Vec<_>>(), ["home", "menu", "place"]);
        assert!(!requests.is_fallback());
    }

    #[test]
    fn test_parse_deduplicates_in_first_seen_order() {
        let requests = IconRequests::parse("star\nhome\nstar\nhome\nmail\n");
        assert_eq!(requests.iter().collect::<Vec<_>>(), ["star", "home", "mail"]);
    }

    #[test]
    fn test_indented_comment_is_a_comment() {
        let requests = IconRequests::parse("   # not an icon\nhome");
        assert_eq!(requests.len(), 1);
        assert!(!requests.contains("# not an icon"));
    }

    #[test]
    fn test_empty_list_falls_back_to_default() {
        for text in ["", "\n\n", "# only comments\n   \n#another"] {
            let requests = IconRequests::parse(text);
            assert!(requests.is_fallback());
            assert_eq!(requests.iter().collect::<Vec<_>>(), [DEFAULT_ICON]);
        }
    }

    #[test]
    fn test_crlf_lines() {
        let requests = IconRequests::parse("home\r\nmenu\r\n");
        assert_eq!(requests.iter().collect::<Vec<_>>(), ["home", "menu"]);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("icons_list.txt");
        let err = IconRequests::load(&path).unwrap_err();
        assert!(matches!(err, Error::MissingInput { what: "Icons list", .. }));
        assert!(err.to_string().contains("icons_list.txt"));
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("icons_list.txt");
        write(&path, "home\nlocation_on\n").unwrap();
        let requests = IconRequests::load(&path).unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests.contains("location_on"));
    }
}

//! Substitute icons for names the subset font cannot resolve.

use indexmap::IndexMap;

/// Material Symbols names that were renamed, or whose outlined variant is the
/// base glyph rendered with `FILL=0`.
pub const MATERIAL_SYMBOLS_ALIASES: &[(&str, &str)] = &[
    ("location_on", "place"),
    ("terrain", "landscape"),
    ("email", "mail"),
    ("person_outline", "person"),
    ("bookmark_border", "bookmark"),
    ("outlined_flag", "flag"),
    ("help_outline", "help"),
    ("star_border", "star"),
    ("create", "edit"),
];

/// Immutable icon name → substitute icon name mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasTable(IndexMap<String, String>);

impl AliasTable {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn empty() -> Self {
        Self(IndexMap::new())
    }

    pub fn material_symbols() -> Self {
        Self::new(MATERIAL_SYMBOLS_ALIASES.iter().copied())
    }

    /// Substitute for `icon`, if one is configured.
    pub fn get(&self, icon: &str) -> Option<&str> {
        self.0.get(icon).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::material_symbols()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_symbols_table() {
        let aliases = AliasTable::material_symbols();
        assert_eq!(aliases.len(), 9);
        assert_eq!(aliases.get("location_on"), Some("place"));
        assert_eq!(aliases.get("create"), Some("edit"));
        assert_eq!(aliases.get("home"), None);
    }

    #[test]
    fn test_custom_table() {
        let aliases = AliasTable::new([("old", "new")]);
        assert_eq!(aliases.iter().collect::<Vec<_>>(), [("old", "new")]);
        assert!(AliasTable::empty().is_empty());
    }

    #[test]
    fn test_default_is_material_symbols() {
        assert_eq!(AliasTable::default(), AliasTable::material_symbols());
    }
}

//! Planning the ligature rules of the subsetted font.
//!
//! Each requested icon is resolved on its own:
//!
//! 1. its own code point, if that code point survived subsetting;
//! 2. otherwise its alias's code point, if that survived;
//! 3. otherwise it is dropped without a warning.
//!
//! A resolved icon becomes a rule only if every character of its name has a
//! glyph in the subset's cmap.

use std::collections::HashMap;

use iconslim_font_features::{FeatureFile, LigatureRule};
use iconslim_font_ops::GlyphInventory;
use log::{info, warn};

use crate::{AliasTable, Validation, config::LIGATURE_FEATURE};

/// Why an icon got no ligature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// Neither the icon nor its alias has a code point in the subset.
    NoTarget,
    /// These characters of the name have no glyph in the subset.
    MissingCharacters(Vec<char>),
}

/// Result of planning one icon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconOutcome {
    /// The icon's own glyph is the target.
    Resolved { glyph: String },
    /// The alias's glyph stands in for the icon.
    Aliased { alias: String, glyph: String },
    Dropped(DropReason),
}

/// Ligature rules for a set of requested icons, and what happened to each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LigaturePlan {
    outcomes: Vec<(String, IconOutcome)>,
    features: FeatureFile,
}

impl LigaturePlan {
    /// Plan rules for `icons`, in the given order, against the subset font.
    pub fn new<'a>(
        icons: impl IntoIterator<Item = &'a str>,
        validation: &Validation,
        aliases: &AliasTable,
        subset: &GlyphInventory,
    ) -> Self {
        let char_map = subset.char_map();
        let mut plan = Self { outcomes: Vec::new(), features: FeatureFile::new(LIGATURE_FEATURE) };

        for icon in icons {
            let outcome = match resolve_target(icon, validation, aliases, subset) {
                None => IconOutcome::Dropped(DropReason::NoTarget),
                Some(target) => match ligature_components(icon, &char_map) {
                    Ok(components) => {
                        plan.features.push(LigatureRule::new(components, target.glyph.as_str()));
                        target.into_outcome()
                    }
                    Err(missing) => {
                        warn!("Cannot build ligature for {icon} (missing character glyphs)");
                        IconOutcome::Dropped(DropReason::MissingCharacters(missing))
                    }
                },
            };
            plan.outcomes.push((icon.to_string(), outcome));
        }
        plan
    }

    pub fn features(&self) -> &FeatureFile {
        &self.features
    }

    pub fn rule_count(&self) -> usize {
        self.features.len()
    }

    pub fn outcome(&self, icon: &str) -> Option<&IconOutcome> {
        self.outcomes.iter().find(|(name, _)| name == icon).map(|(_, outcome)| outcome)
    }

    pub fn outcomes(&self) -> impl Iterator<Item = (&str, &IconOutcome)> {
        self.outcomes.iter().map(|(name, outcome)| (name.as_str(), outcome))
    }

    /// Icons targeting their own glyph.
    pub fn resolved(&self) -> impl Iterator<Item = &str> {
        self.outcomes().filter_map(|(icon, outcome)| {
            matches!(outcome, IconOutcome::Resolved { .. }).then_some(icon)
        })
    }

    /// `(icon, alias)` pairs targeting an alias's glyph.
    pub fn aliased(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes().filter_map(|(icon, outcome)| match outcome {
            IconOutcome::Aliased { alias, .. } => Some((icon, alias.as_str())),
            _ => None,
        })
    }

    pub fn dropped(&self) -> impl Iterator<Item = (&str, &DropReason)> {
        self.outcomes().filter_map(|(icon, outcome)| match outcome {
            IconOutcome::Dropped(reason) => Some((icon, reason)),
            _ => None,
        })
    }
}

/// Glyph a ligature will produce, and the alias it was found through.
struct Target {
    glyph: String,
    alias: Option<String>,
}

impl Target {
    fn into_outcome(self) -> IconOutcome {
        match self.alias {
            Some(alias) => IconOutcome::Aliased { alias, glyph: self.glyph },
            None => IconOutcome::Resolved { glyph: self.glyph },
        }
    }
}

fn resolve_target(
    icon: &str,
    validation: &Validation,
    aliases: &AliasTable,
    subset: &GlyphInventory,
) -> Option<Target> {
    if let Some(glyph) = validation.code_point(icon).and_then(|cp| subset.glyph_for(cp)) {
        return Some(Target { glyph: glyph.to_string(), alias: None });
    }

    let alias = aliases.get(icon)?;
    let glyph = validation.code_point(alias).and_then(|cp| subset.glyph_for(cp))?;
    info!("Mapping alias: {icon} -> {alias} -> {glyph}");
    Some(Target { glyph: glyph.to_string(), alias: Some(alias.to_string()) })
}

/// Glyph of each character of `icon`, or the distinct characters lacking one.
fn ligature_components(icon: &str, char_map: &HashMap<char, &str>) -> Result<Vec<String>, Vec<char>> {
    let mut components = Vec::with_capacity(icon.len());
    let mut missing = Vec::new();
    for ch in icon.chars() {
        match char_map.get(&ch) {
            Some(glyph) => components.push(glyph.to_string()),
            None if !missing.contains(&ch) => missing.push(ch),
            None => {}
        }
    }
    if missing.is_empty() { Ok(components) } else { Err(missing) }
}

#[cfg(test)]
mod tests {
    use iconslim_font_ops::fixture::FontFixture;

    use super::*;
    use crate::IconRequests;

    const LETTERS: &str = "abcdefghijklmnopqrstuvwxyz";

    /// Source font: lowercase letters, `underscore`, and a few icons.
    fn source() -> FontFixture {
        let mut names: Vec<String> = LETTERS.chars().map(String::from).collect();
        names.extend(["underscore", "home", "place", "mail", "ligature_only"].map(String::from));
        FontFixture::new(names)
            .map_letters(LETTERS)
            .map('_', "underscore")
            .map_code_point(0xE88A, "home")
            .map_code_point(0xE55F, "place")
            .map_code_point(0xE158, "mail")
    }

    fn inventory(fixture: FontFixture) -> GlyphInventory {
        GlyphInventory::from_data(&fixture.build()).unwrap()
    }

    fn plan(list: &str, subset: FontFixture, aliases: &AliasTable) -> LigaturePlan {
        let requests = IconRequests::parse(list);
        let validation = Validation::new(&inventory(source()), &requests).unwrap();
        LigaturePlan::new(requests.iter(), &validation, aliases, &inventory(subset))
    }

    #[test]
    fn test_direct_rule() {
        let plan = plan("home", source(), &AliasTable::empty());
        assert_eq!(plan.outcome("home"), Some(&IconOutcome::Resolved { glyph: "home".into() }));
        assert_eq!(plan.features().rules(), &[LigatureRule::new(["h", "o", "m", "e"], "home")]);
    }

    #[test]
    fn test_alias_rule_targets_alias_glyph() {
        // `place` must be requested so its code point is resolved and kept.
        let plan = plan("home\nlocation_on\nplace", source(), &AliasTable::material_symbols());

        assert_eq!(
            plan.outcome("location_on"),
            Some(&IconOutcome::Aliased { alias: "place".into(), glyph: "place".into() })
        );
        let rule = &plan.features().rules()[1];
        assert_eq!(rule.replacement, "place");
        assert_eq!(rule.components.concat(), "locationunderscoreon");
        assert_eq!(plan.aliased().collect::<Vec<_>>(), [("location_on", "place")]);
        assert_eq!(plan.rule_count(), 3);
    }

    #[test]
    fn test_alias_without_resolved_target_is_dropped() {
        let plan = plan("home\nlocation_on", source(), &AliasTable::material_symbols());
        assert_eq!(plan.outcome("location_on"), Some(&IconOutcome::Dropped(DropReason::NoTarget)));
        assert_eq!(plan.rule_count(), 1);
    }

    #[test]
    fn test_unknown_icon_is_dropped_without_target() {
        let plan = plan("home\nnonexistent_icon_xyz", source(), &AliasTable::material_symbols());
        assert_eq!(
            plan.dropped().collect::<Vec<_>>(),
            [("nonexistent_icon_xyz", &DropReason::NoTarget)]
        );
    }

    #[test]
    fn test_icon_without_code_point_is_dropped() {
        let plan = plan("ligature_only\nhome", source(), &AliasTable::empty());
        assert_eq!(plan.outcome("ligature_only"), Some(&IconOutcome::Dropped(DropReason::NoTarget)));
        assert_eq!(plan.resolved().collect::<Vec<_>>(), ["home"]);
    }

    #[test]
    fn test_code_point_lost_in_subset_is_dropped() {
        let subset = FontFixture::new(["h", "o", "m", "e", "mail"])
            .map_letters("home")
            .map_code_point(0xE158, "mail");
        let plan = plan("home", subset, &AliasTable::empty());
        assert_eq!(plan.outcome("home"), Some(&IconOutcome::Dropped(DropReason::NoTarget)));
        assert!(plan.features().is_empty());
    }

    #[test]
    fn test_missing_character_drops_only_that_icon() {
        // subset lost `a` and `i`: `mail` cannot be typed, `home` still can
        let subset = FontFixture::new(["h", "o", "m", "e", "l", "home", "mail"])
            .map_letters("homel")
            .map_code_point(0xE88A, "home")
            .map_code_point(0xE158, "mail");
        let plan = plan("mail\nhome", subset, &AliasTable::empty());

        assert_eq!(
            plan.outcome("mail"),
            Some(&IconOutcome::Dropped(DropReason::MissingCharacters(vec!['a', 'i'])))
        );
        assert_eq!(plan.features().rules(), &[LigatureRule::new(["h", "o", "m", "e"], "home")]);
    }

    #[test]
    fn test_rules_follow_request_order() {
        let plan = plan("mail\nhome\nplace", source(), &AliasTable::empty());
        let targets: Vec<&str> =
            plan.features().rules().iter().map(|rule| rule.replacement.as_str()).collect();
        assert_eq!(targets, ["mail", "home", "place"]);
    }

    #[test]
    fn test_subset_glyph_names_are_used() {
        // a subsetter that drops glyph names leaves fallback names behind
        let subset = FontFixture::new(["h", "o", "m", "e", "home"])
            .map_letters("home")
            .map_code_point(0xE88A, "home")
            .without_glyph_names();
        let plan = plan("home", subset, &AliasTable::empty());
        assert_eq!(
            plan.features().rules(),
            &[LigatureRule::new(
                ["glyph00001", "glyph00002", "glyph00003", "glyph00004"],
                "glyph00005"
            )]
        );
    }
}

//! The icon font build: load, validate, subset, rebuild ligatures.

use std::{
    fs::{create_dir_all, read, write},
    path::{Path, PathBuf},
};

use iconslim_font_features::FeatureCompiler;
use iconslim_font_ops::GlyphInventory;
use iconslim_font_subsetter::{Flavor, SubsetRequest, Subsetter};
use iconslim_font_woff2::to_sfnt;
use log::{debug, info, warn};

use crate::{
    AliasTable, Error, IconRequests, LigaturePlan, ProjectPaths, Result, Validation,
    validate::load_inventory,
};

/// Knobs that are not paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Container written to the output path.
    pub flavor: Flavor,
    /// Keep glyph names in the subset (larger, easier to inspect).
    pub retain_glyph_names: bool,
    pub aliases: AliasTable,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self { flavor: Flavor::Woff2, retain_glyph_names: false, aliases: AliasTable::default() }
    }
}

/// Outcome of a successful build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub requests: IconRequests,
    pub validation: Validation,
    pub plan: LigaturePlan,
    pub output: PathBuf,
    pub output_size: u64,
}

impl BuildReport {
    pub fn output_kb(&self) -> f64 {
        self.output_size as f64 / 1024.0
    }
}

/// A configured build. Generic over the subsetting and feature-compiling
/// backends so either can be replaced.
#[derive(Debug)]
pub struct Pipeline<S, C> {
    paths: ProjectPaths,
    subsetter: S,
    compiler: C,
    options: PipelineOptions,
}

impl<S: Subsetter, C: FeatureCompiler> Pipeline<S, C> {
    pub fn new(paths: ProjectPaths, subsetter: S, compiler: C) -> Self {
        Self { paths, subsetter, compiler, options: PipelineOptions::default() }
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn paths(&self) -> &ProjectPaths {
        &self.paths
    }

    /// Load the icon list and validate it against the source font.
    pub fn check(&self) -> Result<(IconRequests, Validation)> {
        check(&self.paths)
    }

    /// Run every stage and overwrite the output font.
    pub fn run(&self) -> Result<BuildReport> {
        let (requests, validation) = self.check()?;
        self.subset(&validation)?;
        let (plan, output_size) = self.rebuild_ligatures(&requests, &validation)?;

        let report = BuildReport {
            requests,
            validation,
            plan,
            output: self.paths.output_font.clone(),
            output_size,
        };
        info!("Final optimized font size: {:.2} KB", report.output_kb());
        Ok(report)
    }

    fn subset(&self, validation: &Validation) -> Result<()> {
        let output = &self.paths.output_font;
        ensure_parent_dir(output)?;

        let request = SubsetRequest::new(&self.paths.source_font, output)
            .with_text(validation.text())
            .with_unicodes(validation.unicodes())
            .with_flavor(self.options.flavor)
            .retain_glyph_names(self.options.retain_glyph_names);

        info!(
            "Optimizing font with {} icons ({} have unicodes) using {}...",
            validation.valid.len(),
            validation.code_points.len(),
            self.subsetter.name()
        );
        self.subsetter.subset(&request)?;
        Ok(())
    }

    fn rebuild_ligatures(
        &self,
        requests: &IconRequests,
        validation: &Validation,
    ) -> Result<(LigaturePlan, u64)> {
        let path = &self.paths.output_font;
        let data = read(path).map_err(|source| Error::Read { path: path.clone(), source })?;
        let mut sfnt = to_sfnt(&data)
            .map_err(|source| Error::Font { path: path.clone(), source })?
            .into_owned();
        let subset = GlyphInventory::from_data(&sfnt)
            .map_err(|source| Error::Font { path: path.clone(), source })?;

        let plan = LigaturePlan::new(requests.iter(), validation, &self.options.aliases, &subset);
        debug!("Features:\n{}", plan.features());
        let source = plan.features().to_source(&subset)?;

        if plan.rule_count() == 0 {
            warn!("No ligatures could be built; compiling an empty '{}' feature", plan.features().tag());
        } else {
            info!("Rebuilding '{}' feature with {} rules...", plan.features().tag(), plan.rule_count());
        }
        self.compiler.compile(&source, &mut sfnt)?;

        let out = self
            .options
            .flavor
            .wrap(&sfnt)
            .map_err(|source| Error::Font { path: path.clone(), source })?;
        write(path, &out).map_err(|source| Error::Write { path: path.clone(), source })?;
        Ok((plan, out.len() as u64))
    }
}

/// Load the icon list and validate it against the source font.
///
/// The font is read first, so a missing font is reported before a missing
/// icon list.
pub fn check(paths: &ProjectPaths) -> Result<(IconRequests, Validation)> {
    let inventory = load_inventory(&paths.source_font)?;
    let requests = IconRequests::load(&paths.icon_list)?;
    let validation = Validation::new(&inventory, &requests)?;
    Ok((requests, validation))
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent)
            .map_err(|source| Error::Write { path: parent.to_path_buf(), source })?;
    }
    Ok(())
}

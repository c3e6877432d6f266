//! CLI definitions and command dispatch.

use std::{ffi::OsString, path::PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use log::info;

use iconslim_core::{
    CommandSubsetter, FeaRsCompiler, HbSubsetter, Pipeline, PipelineOptions, ProjectPaths,
    Subsetter, check, missing_preview,
};

#[derive(Parser)]
#[command(name = "iconslim")]
#[command(about = "Subset an icon font to the icons in use and rebuild its name ligatures")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// fontTools' pyftsubset, run as a child process
    Pyftsubset,
    /// HarfBuzz, in process
    Harfbuzz,
}

#[derive(Debug, Clone, clap::Args)]
pub struct ProjectArgs {
    /// Project root the font and icon list paths are resolved against
    #[arg(long, default_value = ".")]
    pub root: PathBuf,
}

impl ProjectArgs {
    pub fn paths(&self) -> ProjectPaths {
        ProjectPaths::from_root(&self.root)
    }
}

#[derive(Debug, Clone, clap::Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
    #[arg(long, value_enum, default_value_t = Backend::Pyftsubset)]
    pub subsetter: Backend,
    /// Program run by the pyftsubset backend
    #[arg(long, default_value = "pyftsubset")]
    pub pyftsubset: OsString,
    /// Run the pyftsubset backend as `<PYTHON> -m fontTools.subset` instead
    #[arg(long, value_name = "PYTHON")]
    pub python: Option<OsString>,
    /// Keep glyph names in the output font
    #[arg(long)]
    pub glyph_names: bool,
}

impl BuildArgs {
    pub fn subsetter(&self) -> Box<dyn Subsetter> {
        match self.subsetter {
            Backend::Pyftsubset => match &self.python {
                Some(python) => Box::new(CommandSubsetter::python_module(python.clone())),
                None => Box::new(CommandSubsetter::new(self.pyftsubset.clone())),
            },
            Backend::Harfbuzz => Box::new(HbSubsetter::new()),
        }
    }

    pub fn options(&self) -> PipelineOptions {
        PipelineOptions { retain_glyph_names: self.glyph_names, ..PipelineOptions::default() }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the optimized font
    Build {
        #[command(flatten)]
        args: BuildArgs,
    },
    /// Validate the icon list against the source font without writing anything
    Check {
        #[command(flatten)]
        project: ProjectArgs,
    },
}

impl Commands {
    pub fn run(self) -> Result<()> {
        match self {
            Commands::Build { args } => {
                let pipeline = Pipeline::new(args.project.paths(), args.subsetter(), FeaRsCompiler)
                    .with_options(args.options());
                let report = pipeline.run()?;
                info!(
                    "Wrote {} ({} ligatures, {} icons dropped)",
                    report.output.display(),
                    report.plan.rule_count(),
                    report.plan.dropped().count()
                );
            }
            Commands::Check { project } => {
                let (requests, validation) = check(&project.paths())?;
                info!(
                    "{} of {} icons found, {} with a code point",
                    validation.valid.len(),
                    requests.len(),
                    validation.code_points.len()
                );
                if !validation.missing.is_empty() {
                    info!("Missing: {}", missing_preview(&validation.missing));
                }
                let unmapped: Vec<&str> = validation.without_code_point().collect();
                if !unmapped.is_empty() {
                    info!("No code point: {}", unmapped.join(", "));
                }
            }
        }
        Ok(())
    }
}

//! iconslim core: subset an icon font to the icons an app uses and rebuild
//! its name ligatures.

pub mod aliases;
pub mod config;
mod error;
pub mod icons;
pub mod ligatures;
pub mod pipeline;
pub mod validate;

pub use aliases::AliasTable;
pub use config::ProjectPaths;
pub use error::{Error, Result};
pub use icons::IconRequests;
pub use ligatures::{DropReason, IconOutcome, LigaturePlan};
pub use pipeline::{BuildReport, Pipeline, PipelineOptions, check};
pub use validate::{Validation, load_inventory, missing_preview};

pub use iconslim_font_features::{FeaRsCompiler, FeatureCompiler};
pub use iconslim_font_subsetter::{CommandSubsetter, Flavor, HbSubsetter, SubsetRequest, Subsetter};

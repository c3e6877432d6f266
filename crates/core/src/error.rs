//! Error types for the icon font pipeline.

use std::{io, path::PathBuf, result};

/// Fatal pipeline errors. Partial shortfalls (missing icons, unbuildable
/// ligatures) are logged and reported, never raised.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{what} not found at {}", .path.display())]
    MissingInput { what: &'static str, path: PathBuf },

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

    #[error("failed to read font {}: {source:#}", .path.display())]
    Font {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("no valid icons found to subset ({requested} requested)")]
    NoValidIcons { requested: usize },

    #[error("subsetting failed: {0}")]
    Subset(#[from] iconslim_font_subsetter::Error),

    #[error("failed to rebuild ligatures: {0}")]
    Features(#[from] iconslim_font_features::Error),
}

pub type Result<T> = result::Result<T, Error>;

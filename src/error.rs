//! Error type for the whole load, layout, and save pipeline.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::extract::ExtractError;
use crate::patch::PatchError;

#[derive(Debug, Error)]
pub enum CalcViewError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Patch(#[from] PatchError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Graph JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

//! astro-plan command-line support
//!
//! File loading and terminal rendering for the `astro-plan` binary. The
//! planning itself lives in `session-planner`.

use session_planner::PlanError;
use thiserror::Error;

pub mod loader;
pub mod render;

/// Catalog used when `--catalog` is not given
pub const DEFAULT_CATALOG: &str = "data/catalog.json";

#[derive(Error, Debug)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error("Catalog {0} holds no usable targets")]
    EmptyCatalog(String),
    #[error("Target '{0}' is not in the catalog")]
    UnknownTarget(String),
}

pub type Result<T> = std::result::Result<T, CliError>;

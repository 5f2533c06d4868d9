use thiserror::Error;

use super::config::ConfigError;
use super::mesh::MeshError;
use super::reaction::ReactionError;
use crate::core::io::export::ExportError;
use crate::core::io::pathway::PathwayLoadError;
use crate::core::io::tables::TableLoadError;
use crate::core::models::descriptor::DescriptorError;
use crate::core::models::table::TableError;
use crate::core::scaling::fitter::FitError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Failed to load energy data: {source}")]
    TableLoad {
        #[from]
        source: TableLoadError,
    },

    #[error("Inconsistent energy table: {source}")]
    Table {
        #[from]
        source: TableError,
    },

    #[error("Failed to load reaction pathway: {source}")]
    PathwayLoad {
        #[from]
        source: PathwayLoadError,
    },

    #[error("Invalid descriptor selection: {source}")]
    Descriptor {
        #[from]
        source: DescriptorError,
    },

    #[error("Scaling-relation fit failed: {source}")]
    Fit {
        #[from]
        source: FitError,
    },

    #[error("Reaction scaling failed: {source}")]
    Reaction {
        #[from]
        source: ReactionError,
    },

    #[error("Mesh evaluation failed: {source}")]
    Mesh {
        #[from]
        source: MeshError,
    },

    #[error("Failed to write results: {source}")]
    Export {
        #[from]
        source: ExportError,
    },
}

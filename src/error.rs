//! Error types for the analysis engine

use thiserror::Error;

/// Main error type for model building, assembly, and solving
#[derive(Error, Debug)]
pub enum FEAError {
    #[error("node {0} not found")]
    NodeNotFound(u64),

    #[error("material {0} not found")]
    MaterialNotFound(u64),

    #[error("beam element {0} not found")]
    BeamNotFound(u64),

    #[error("2D element {0} not found")]
    ElementNotFound(u64),

    #[error("plate region {0} not found")]
    PlateRegionNotFound(u64),

    #[error("sub-node {0} not found")]
    SubNodeNotFound(u64),

    #[error("load case {0} not found")]
    LoadCaseNotFound(u64),

    #[error("load combination {0} not found")]
    LoadCombinationNotFound(u64),

    #[error("invalid entity: {0}")]
    Validation(String),

    #[error("reference error: {0}")]
    Reference(String),

    #[error("structure unstable / under-constrained: {0}")]
    Singular(String),

    #[error("analysis has not been run yet")]
    NotAnalyzed,

    #[error("check not applicable: {0}")]
    CheckNotApplicable(String),

    #[error("cancelled")]
    Cancelled,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type used throughout the engine
pub type FEAResult<T> = Result<T, FEAError>;

/// A non-fatal condition recorded during assembly: the offending element is
/// skipped and the rest of the structure is still assembled.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    ZeroLengthBeam(u64),
    ZeroAreaElement(u64),
    MissingMaterial(u64),
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::ZeroLengthBeam(id) => write!(f, "beam {id} has zero length, skipped"),
            Warning::ZeroAreaElement(id) => write!(f, "element {id} has zero area, skipped"),
            Warning::MissingMaterial(id) => write!(f, "element {id} references a missing material, skipped"),
        }
    }
}

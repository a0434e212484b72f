//! # Error
//! Failures raised while constructing grids or moving containers to and from disk

use miette::Diagnostic;

#[derive(thiserror::Error, Debug, Diagnostic)]
/// Error for grid construction, container compatibility and persistence
pub enum MeshError {
    /// The inverse temperature must be a positive, finite number
    #[error("inverse temperature must be positive and finite, found {0}")]
    #[diagnostic(code(dualfermion_mesh::temperature))]
    NonPositiveTemperature(f64),
    /// A Matsubara window `[min, max)` containing no points
    #[error("Matsubara window [{min}, {max}) contains no points")]
    #[diagnostic(
        code(dualfermion_mesh::empty_grid),
        help("the upper index is exclusive, a fermionic grid needs wmax > 0")
    )]
    EmptyGrid {
        /// Lower bound of the window
        min: i64,
        /// Exclusive upper bound of the window
        max: i64,
    },
    /// A momentum mesh with no points or no dimensions
    #[error("momentum mesh needs at least one point in at least one dimension, found {points} points in {dimension} dimensions")]
    #[diagnostic(code(dualfermion_mesh::empty_mesh))]
    EmptyMomentumMesh {
        /// Points per dimension
        points: usize,
        /// Number of dimensions
        dimension: usize,
    },
    /// Two containers which should share a grid do not
    #[error("grid mismatch: {0}")]
    #[diagnostic(code(dualfermion_mesh::grid_mismatch))]
    GridMismatch(String),
    /// Raw data does not have the length of the grid it is placed on
    #[error("expected {expected} values, found {found}")]
    #[diagnostic(code(dualfermion_mesh::length_mismatch))]
    LengthMismatch {
        /// Number of grid points
        expected: usize,
        /// Number of values supplied
        found: usize,
    },
    /// Failure reading or writing a container
    #[error("IO Failure: {0}")]
    #[diagnostic(code(dualfermion_mesh::io))]
    Io(#[from] std::io::Error),
    /// A malformed line in a persisted container
    #[error("line {line}: {reason}")]
    #[diagnostic(code(dualfermion_mesh::parse))]
    Parse {
        /// One-based line number in the source
        line: usize,
        /// What was wrong with it
        reason: String,
    },
}

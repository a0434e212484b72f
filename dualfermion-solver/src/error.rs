use crate::instability::InstabilityFlag;
use dualfermion_mesh::MeshError;
use miette::Diagnostic;

#[derive(thiserror::Error, Debug, Diagnostic)]
/// Failures of a dual fermion run
pub enum DualFermionError {
    /// Inputs which can never produce a meaningful calculation
    #[error("invalid input: {0}")]
    #[diagnostic(code(dualfermion::invalid_input))]
    InvalidInput(String),
    /// A near-singular denominator, only returned when the run is strict
    #[error("numerical instability: {0}")]
    #[diagnostic(
        code(dualfermion::numerical_instability),
        help("disable strict mode to record the event and continue with a clamped value")
    )]
    NumericalInstability(InstabilityFlag),
    /// The requested convergence criterion was not met
    #[error("hybridisation not converged after {iterations} iterations: residual {residual:e} above {tolerance:e}")]
    #[diagnostic(
        code(dualfermion::convergence),
        help("increase df_sc_iter or relax df_sc_cutoff")
    )]
    ConvergenceNotReached {
        /// Passes completed
        iterations: usize,
        /// Residual of the final pass
        residual: f64,
        /// The requested threshold
        tolerance: f64,
    },
    /// The change in the hybridisation exceeded the hard error tolerance
    #[error("hybridisation update diverged at iteration {iteration}: residual {residual:e} above {limit:e}")]
    #[diagnostic(code(dualfermion::diverged), help("reduce df_sc_mix"))]
    Diverged {
        /// The pass at which the limit was exceeded
        iteration: usize,
        /// Residual of that pass
        residual: f64,
        /// The configured limit
        limit: f64,
    },
    /// The run was stopped through its cancellation token
    #[error("run cancelled after {iterations} iterations")]
    #[diagnostic(code(dualfermion::cancelled))]
    Cancelled {
        /// Passes completed before the token was observed
        iterations: usize,
    },
}

impl From<MeshError> for DualFermionError {
    fn from(error: MeshError) -> Self {
        Self::InvalidInput(error.to_string())
    }
}

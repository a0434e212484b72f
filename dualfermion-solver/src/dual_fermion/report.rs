use crate::{error::DualFermionError, instability::InstabilityFlag, outer_loop::LoopState};

/// How the input hybridisation was embedded in the lattice
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EmbeddingSummary {
    /// Iterations carried out
    pub iterations: usize,
    /// RMS change of the final iteration
    pub residual: f64,
    /// Whether the residual fell below the requested tolerance
    pub converged: bool,
}

/// Diagnostics of a completed, or interrupted, run
#[derive(Clone, Debug, PartialEq)]
pub struct RunReport {
    state: LoopState,
    residuals: Vec<f64>,
    flags: Vec<InstabilityFlag>,
    embedding: EmbeddingSummary,
}

impl RunReport {
    pub(crate) fn new(embedding: EmbeddingSummary) -> Self {
        Self {
            state: LoopState::Initialized,
            residuals: Vec::new(),
            flags: Vec::new(),
            embedding,
        }
    }

    pub(crate) fn record_flag(&mut self, flag: InstabilityFlag) {
        self.flags.push(flag);
    }

    pub(crate) fn record_loop(
        &mut self,
        state: LoopState,
        residuals: Vec<f64>,
        flags: Vec<InstabilityFlag>,
    ) {
        self.state = state;
        self.residuals = residuals;
        self.flags.extend(flags);
    }

    /// The state the loop stopped in
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// RMS change of the hybridisation for each pass
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    /// Passes carried out
    pub fn iterations(&self) -> usize {
        self.residuals.len()
    }

    /// Residual of the last pass
    pub fn final_residual(&self) -> Option<f64> {
        self.residuals.last().copied()
    }

    /// Every recorded near-singular event, embedding flags first
    pub fn flags(&self) -> &[InstabilityFlag] {
        &self.flags
    }

    /// Whether the run met any numerical instability
    pub fn has_instabilities(&self) -> bool {
        !self.flags.is_empty()
    }

    /// Summary of the lattice embedding
    pub fn embedding(&self) -> &EmbeddingSummary {
        &self.embedding
    }

    /// Fail unless the last pass changed the hybridisation by less than `tolerance`
    pub fn ensure_converged(&self, tolerance: f64) -> Result<(), DualFermionError> {
        match self.final_residual() {
            Some(residual) if residual < tolerance => Ok(()),
            residual => Err(DualFermionError::ConvergenceNotReached {
                iterations: self.iterations(),
                residual: residual.unwrap_or(f64::INFINITY),
                tolerance,
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{EmbeddingSummary, RunReport};
    use crate::{error::DualFermionError, outer_loop::LoopState};

    fn report(residuals: Vec<f64>) -> RunReport {
        let mut report = RunReport::new(EmbeddingSummary {
            iterations: 4,
            residual: 1e-14,
            converged: true,
        });
        report.record_loop(LoopState::MaxIterReached, residuals, Vec::new());
        report
    }

    #[test]
    fn convergence_is_judged_on_the_last_residual() {
        let report = report(vec![1e-1, 1e-3, 1e-7]);
        assert!(report.ensure_converged(1e-6).is_ok());
        match report.ensure_converged(1e-8) {
            Err(DualFermionError::ConvergenceNotReached {
                iterations,
                residual,
                tolerance,
            }) => {
                assert_eq!(iterations, 3);
                assert_eq!(residual, 1e-7);
                assert_eq!(tolerance, 1e-8);
            }
            other => panic!("expected a convergence failure, found {:?}", other),
        }
    }

    #[test]
    fn a_run_without_passes_never_converged() {
        assert!(report(Vec::new()).ensure_converged(1.0).is_err());
    }
}

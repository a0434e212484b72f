use super::{LoopState, OuterLoop};
use crate::{
    error::DualFermionError,
    inner_loop::{Inner, PassOutcome},
    LocalGreensFunction,
};

pub(crate) trait Outer {
    /// Whether the residual of the most recent pass is within the convergence threshold
    fn is_loop_converged(&self) -> bool;
    /// Carry out one pass and mix its candidate into the hybridisation, returning the residual
    fn single_iteration(&mut self) -> Result<f64, DualFermionError>;
    /// Iterate until the loop converges or the iteration budget is spent
    fn run_loop(&mut self) -> Result<LoopState, DualFermionError>;
}

impl<I: Inner> Outer for OuterLoop<'_, I> {
    fn is_loop_converged(&self) -> bool {
        match (self.convergence.tolerance(), self.residuals.last()) {
            (Some(tolerance), Some(residual)) => *residual < tolerance,
            _ => false,
        }
    }

    #[tracing::instrument(name = "Outer iteration", level = "info", skip_all, fields(iteration = self.iteration + 1))]
    fn single_iteration(&mut self) -> Result<f64, DualFermionError> {
        let iteration = self.iteration + 1;
        let PassOutcome { candidate, flags } = self.inner.single_iteration(&self.hybridisation)?;

        for flag in flags {
            let flag = flag.at_iteration(iteration);
            tracing::warn!("Numerical instability in {}", flag);
            self.flags.push(flag.clone());
            if self.convergence.is_strict() {
                return Err(DualFermionError::NumericalInstability(flag));
            }
        }

        let mixed = mix(&self.hybridisation, candidate, self.convergence.mixing());
        let residual = mixed.diff(&self.hybridisation)?;
        self.iteration = iteration;
        self.residuals.push(residual);
        tracing::info!("Hybridisation residual {:e}", residual);

        if let Some(limit) = self.convergence.abort_tolerance() {
            if residual.is_nan() || residual > limit {
                tracing::error!("Residual {:e} exceeds the abort tolerance {:e}", residual, limit);
                return Err(DualFermionError::Diverged {
                    iteration,
                    residual,
                    limit,
                });
            }
        }
        self.hybridisation = mixed;
        Ok(residual)
    }

    fn run_loop(&mut self) -> Result<LoopState, DualFermionError> {
        self.state = LoopState::Iterating;
        while self.iteration < self.convergence.maximum_iterations() {
            if self
                .cancellation
                .map_or(false, |token| token.is_cancelled())
            {
                tracing::warn!("Run cancelled after {} iterations", self.iteration);
                self.state = LoopState::Cancelled;
                return Err(DualFermionError::Cancelled {
                    iterations: self.iteration,
                });
            }
            self.single_iteration()?;
            if self.is_loop_converged() {
                tracing::info!("Converged after {} iterations", self.iteration);
                self.state = LoopState::Converged;
                return Ok(self.state);
            }
        }
        self.state = LoopState::MaxIterReached;
        Ok(self.state)
    }
}

/// Linear mixing `(1 - mixing) old + mixing candidate`
pub(crate) fn mix(
    old: &LocalGreensFunction,
    candidate: LocalGreensFunction,
    mixing: f64,
) -> LocalGreensFunction {
    if mixing == 1_f64 {
        return candidate;
    }
    &(old * (1_f64 - mixing)) + &(&candidate * mixing)
}

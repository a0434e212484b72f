//! Lattice embedding of the hybridisation function.
//!
//! The dual perturbation theory is an expansion about the lattice DMFT solution, for which the
//! momentum average of `G_DMFT` equals the impurity Green's function. A hybridisation handed to
//! the engine need not satisfy this, so before the first pass it is iterated to the fixed point
//!
//! `Δ ← Δ + g^{-1} - [ (1/N) Σ_k G_DMFT(ν, k) ]^{-1}`
//!
//! after which the bare dual propagator has no local part.

use super::{invert_guarded, inverse_impurity};
use crate::{
    error::DualFermionError,
    instability::{Guard, InstabilityFlag, Stage},
    Complex64, LocalGreensFunction,
};
use dualfermion_mesh::MomentumMesh;
use ndarray::Array1;

/// Outcome of the embedding iteration
#[derive(Clone, Debug)]
pub(crate) struct Embedding {
    pub(crate) hybridisation: LocalGreensFunction,
    pub(crate) iterations: usize,
    pub(crate) residual: f64,
    pub(crate) flags: Vec<InstabilityFlag>,
}

#[tracing::instrument(name = "Lattice embedding", level = "debug", skip_all)]
pub(crate) fn embed_hybridisation(
    impurity: &LocalGreensFunction,
    hybridisation: &LocalGreensFunction,
    dispersion: &Array1<f64>,
    mesh: &MomentumMesh,
    guard: Guard,
    tolerance: f64,
    maximum_iterations: usize,
) -> Result<Embedding, DualFermionError> {
    let inverse_impurity = inverse_impurity(impurity)?;
    let grid = impurity.grid();
    let mut delta = hybridisation.clone();
    let mut flags = Vec::new();
    let mut residual = 0_f64;
    let mut iterations = 0;

    while iterations < maximum_iterations {
        iterations += 1;
        let (local, mut new_flags) =
            dmft_local(&inverse_impurity, &delta, dispersion, mesh, guard);
        flags.append(&mut new_flags);

        let mut next = delta.clone();
        for (i, value) in next.data_mut().iter_mut().enumerate() {
            let (safe, flag) = guard.denominator(
                local.data()[i],
                Stage::Embedding,
                grid.points()[i].index(),
                None,
            );
            flags.extend(flag);
            *value += inverse_impurity[i] - safe.inv();
        }
        residual = next.diff(&delta)?;
        delta = next;
        tracing::trace!("Embedding iteration {}: residual {:e}", iterations, residual);
        if residual < tolerance {
            break;
        }
    }

    if maximum_iterations > 0 && (residual.is_nan() || residual >= tolerance) {
        tracing::warn!(
            "Lattice embedding stopped after {} iterations with residual {:e}",
            iterations,
            residual
        );
        flags.push(InstabilityFlag::new(Stage::Embedding, None, None, residual));
    }

    Ok(Embedding {
        hybridisation: delta,
        iterations,
        residual,
        flags,
    })
}

/// The momentum average of `G_DMFT` for a given hybridisation
pub(crate) fn dmft_local(
    inverse_impurity: &Array1<Complex64>,
    hybridisation: &LocalGreensFunction,
    dispersion: &Array1<f64>,
    mesh: &MomentumMesh,
    guard: Guard,
) -> (LocalGreensFunction, Vec<InstabilityFlag>) {
    let (propagator, flags) = invert_guarded(
        hybridisation.grid(),
        mesh,
        guard,
        Stage::Embedding,
        |i, k| inverse_impurity[i] + hybridisation.data()[i] - dispersion[k],
    );
    (propagator.momentum_average(), flags)
}

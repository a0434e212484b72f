//! Dyson equations connecting the dual and lattice propagators.
//!
//! The dressed dual propagator follows from `G = G0 / (1 - Σ G0)`. The lattice Green's function
//! is recovered from the dual self-energy through the exact relation
//!
//! `G_lat(ν, k) = [ (g + g Σ g)^{-1} + Δ - ε(k) ]^{-1}`
//!
//! which is the inverse dual transformation written in terms of `Σ` alone.

use super::invert_guarded;
use crate::{
    instability::{Guard, InstabilityFlag, Stage},
    LocalGreensFunction,
};
use dualfermion_mesh::{LatticeFunction, MomentumMesh};
use ndarray::{Array1, Array2, Zip};

/// Dress the bare dual propagator with the dual self-energy
pub(crate) fn dual_dyson(
    bare: &LatticeFunction,
    self_energy: &LatticeFunction,
    guard: Guard,
) -> (LatticeFunction, Vec<InstabilityFlag>) {
    let grid = bare.grid();
    let mut dressed = LatticeFunction::zeros(grid, bare.mesh());
    let mut flags = Vec::new();
    Zip::indexed(dressed.data_mut())
        .and(bare.data())
        .and(self_energy.data())
        .for_each(|(i, k), value, &g0, &sigma| {
            let (denominator, flag) = guard.denominator(
                1_f64 - sigma * g0,
                Stage::DualDyson,
                grid.points()[i].index(),
                Some(k),
            );
            flags.extend(flag);
            *value = g0 / denominator;
        });
    (dressed, flags)
}

/// The lattice Green's function implied by a dual self-energy
pub(crate) fn lattice_greens_function(
    impurity: &LocalGreensFunction,
    hybridisation: &LocalGreensFunction,
    self_energy: &LatticeFunction,
    dispersion: &Array1<f64>,
    mesh: &MomentumMesh,
    guard: Guard,
) -> (LatticeFunction, Vec<InstabilityFlag>) {
    let grid = impurity.grid();
    let mut flags = Vec::new();

    // `(g + g Σ g)^{-1}`, the impurity propagator dressed by the dual self-energy
    let mut inverse_dressed_impurity = Array2::zeros((grid.len(), mesh.len()));
    Zip::indexed(&mut inverse_dressed_impurity)
        .and(self_energy.data())
        .for_each(|(i, k), value, &sigma| {
            let g = impurity.data()[i];
            let (denominator, flag) = guard.denominator(
                g + g * sigma * g,
                Stage::LatticeDyson,
                grid.points()[i].index(),
                Some(k),
            );
            flags.extend(flag);
            *value = denominator.inv();
        });

    let (lattice, mut lattice_flags) =
        invert_guarded(grid, mesh, guard, Stage::LatticeDyson, |i, k| {
            inverse_dressed_impurity[[i, k]] + hybridisation.data()[i] - dispersion[k]
        });
    flags.append(&mut lattice_flags);
    (lattice, flags)
}

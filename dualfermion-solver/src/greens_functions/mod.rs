// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # Green's functions
//!
//! Single particle propagators of the dual fermion construction. Everything is built around the
//! lattice DMFT propagator
//!
//! `G_DMFT(ν, k) = [g(ν)^{-1} + Δ(ν) - ε(k)]^{-1}`
//!
//! from which the bare dual propagator follows as `G_DMFT - g`. The dressed dual propagator is
//! mapped back onto the lattice through the dual Dyson equation.

mod dual;
mod dyson;
mod embedding;
mod update;

pub(crate) use dual::bare_dual_propagator;
pub(crate) use dyson::{dual_dyson, lattice_greens_function};
pub(crate) use embedding::embed_hybridisation;
pub(crate) use update::hybridisation_candidate;

use crate::{
    error::DualFermionError,
    instability::{Guard, InstabilityFlag, Stage},
    Complex64, LocalGreensFunction,
};
use dualfermion_mesh::{FermionicGrid, LatticeFunction, MomentumMesh};
use ndarray::{Array1, Axis};
use rayon::prelude::*;

/// Reciprocal of the impurity Green's function, rejecting values which are numerically zero
pub(crate) fn inverse_impurity(
    impurity: &LocalGreensFunction,
) -> Result<Array1<Complex64>, DualFermionError> {
    if let Some((point, value)) = impurity
        .iter()
        .find(|(_, value)| !value.is_finite() || value.norm() <= f64::EPSILON)
    {
        return Err(DualFermionError::InvalidInput(format!(
            "the impurity Green's function is {} at Matsubara index {}",
            value,
            point.index()
        )));
    }
    Ok(impurity.data().mapv(|value| value.inv()))
}

/// Tabulate `1 / denominator(position, k)` over the grid and mesh, clamping small denominators
pub(crate) fn invert_guarded<F>(
    grid: &FermionicGrid,
    mesh: &MomentumMesh,
    guard: Guard,
    stage: Stage,
    denominator: F,
) -> (LatticeFunction, Vec<InstabilityFlag>)
where
    F: Fn(usize, usize) -> Complex64 + Sync,
{
    let mut function = LatticeFunction::zeros(grid, mesh);
    let flags: Vec<Vec<InstabilityFlag>> = function
        .data_mut()
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .map(|(position, mut row)| {
            let index = grid.points()[position].index();
            let mut flags = Vec::new();
            for (k, value) in row.iter_mut().enumerate() {
                let (safe, flag) = guard.denominator(denominator(position, k), stage, index, Some(k));
                flags.extend(flag);
                *value = safe.inv();
            }
            flags
        })
        .collect();
    (function, flags.into_iter().flatten().collect())
}
